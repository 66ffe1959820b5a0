//! Measurement core for WiFi site surveys.
//!
//! A survey point is measured by the [`sequencer`], which drives a
//! [`prelude::Collector`] through a fixed probe sequence and hands finished
//! points to the [`survey`] store for persistence.

pub mod collector;
pub mod prelude;
pub mod sequencer;
pub mod survey;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use prelude::{Collector, CollectorError, SurveyError, SurveyPlan};
pub use sequencer::{RetryDecision, Sequencer, StepOutcome};
pub use survey::{SurveyPoint, SurveyStore};
