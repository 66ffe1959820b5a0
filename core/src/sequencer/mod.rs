//! Per-point measurement state machine.
//!
//! A [`Sequencer`] owns one [`SurveyPoint`] for the duration of a run and
//! walks it through [`SEQUENCE`]: four throughput probes, six metadata
//! probes and an optional neighbor scan. The BSSID is re-checked before
//! every probe. A transient throughput failure suspends the run with
//! [`StepOutcome::RetryDecisionNeeded`]; the caller answers through
//! [`Sequencer::resume`] or gives up through [`Sequencer::abort`].
//!
//! Any other failure aborts the run and resets the point so the caller can
//! discard it. Nothing here touches the survey store.

pub mod probe;

use crate::collector::{MeasurementResult, ThroughputProbe};
use crate::prelude::{Collector, SurveyError, SurveyPlan, SurveyResult};
use crate::survey::{PointResult, SurveyPoint};
use crate::telemetry::log::LogManager;

pub use probe::{Probe, SEQUENCE, TOTAL_STEPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    AwaitingRetry,
    Finished,
    Aborted,
}

/// A throughput probe that failed with a recoverable error.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRetry {
    pub probe: ThroughputProbe,
    pub result: MeasurementResult,
}

impl PendingRetry {
    pub fn message(&self) -> &str {
        self.result.error().unwrap_or_default()
    }

    pub fn to_error(&self) -> SurveyError {
        SurveyError::ProbeTransient {
            probe: self.probe.to_string(),
            message: self.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Association confirmed; probes come next.
    Started,
    Progressed(Probe),
    RetryDecisionNeeded(PendingRetry),
    Finished,
}

/// Caller's answer to [`StepOutcome::RetryDecisionNeeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run the failed probe again; earlier probes are not repeated.
    Retry,
    /// Store the error result for that probe and carry on.
    KeepError,
}

pub struct Sequencer<'a, C: Collector + ?Sized> {
    collector: &'a C,
    plan: SurveyPlan,
    logger: LogManager,
    point: SurveyPoint,
    partial: PointResult,
    phase: Phase,
    cursor: usize,
    pending: Option<PendingRetry>,
}

impl<'a, C: Collector + ?Sized> Sequencer<'a, C> {
    pub fn new(collector: &'a C, plan: SurveyPlan, point: SurveyPoint, logger: LogManager) -> Self {
        Self {
            collector,
            plan,
            logger,
            point,
            partial: PointResult::default(),
            phase: Phase::NotStarted,
            cursor: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn point(&self) -> &SurveyPoint {
        &self.point
    }

    /// Results collected so far in the current run.
    pub fn partial(&self) -> &PointResult {
        &self.partial
    }

    pub fn pending_retry(&self) -> Option<&PendingRetry> {
        self.pending.as_ref()
    }

    /// The probe the next call to [`Self::step`] will run.
    pub fn next_probe(&self) -> Option<Probe> {
        match self.phase {
            Phase::Running => SEQUENCE.get(self.cursor).copied(),
            _ => None,
        }
    }

    /// Advance by one step. An `Err` means the run was aborted and the
    /// point reset, except for [`SurveyError::InvalidPhase`].
    pub fn step(&mut self) -> SurveyResult<StepOutcome> {
        match self.phase {
            Phase::NotStarted => self.begin(),
            Phase::Running => self.run_next_probe(),
            Phase::AwaitingRetry => match &self.pending {
                Some(pending) => Ok(StepOutcome::RetryDecisionNeeded(pending.clone())),
                None => Err(self.invalid("step")),
            },
            Phase::Finished => Ok(StepOutcome::Finished),
            Phase::Aborted => Err(self.invalid("step")),
        }
    }

    /// Step until the run finishes or needs a retry decision.
    pub fn run(&mut self) -> SurveyResult<StepOutcome> {
        loop {
            match self.step()? {
                StepOutcome::Started | StepOutcome::Progressed(_) => continue,
                outcome => return Ok(outcome),
            }
        }
    }

    pub fn resume(&mut self, decision: RetryDecision) -> SurveyResult<()> {
        if self.phase != Phase::AwaitingRetry {
            return Err(self.invalid("resume"));
        }
        let pending = self.pending.take().ok_or(SurveyError::InvalidPhase {
            operation: "resume",
            phase: self.phase,
        })?;
        self.phase = Phase::Running;
        match decision {
            RetryDecision::Retry => {
                self.logger
                    .record(&format!("retrying iperf {}", pending.probe));
            }
            RetryDecision::KeepError => {
                self.logger.warn(&format!(
                    "keeping failed iperf {} result: {}",
                    pending.probe,
                    pending.message()
                ));
                let probe = pending.probe;
                self.partial.set_throughput(probe, pending.result);
                self.advance(Probe::Throughput(probe));
            }
        }
        Ok(())
    }

    /// Abandon the run at the current step boundary and reset the point.
    pub fn abort(&mut self) -> SurveyResult<()> {
        match self.phase {
            Phase::Finished | Phase::Aborted => Err(self.invalid("abort")),
            _ => {
                let _ = self.fail_run(SurveyError::OperatorAbort);
                Ok(())
            }
        }
    }

    /// The measured point, if the run reached [`Phase::Finished`].
    pub fn into_point(self) -> Option<SurveyPoint> {
        (self.phase == Phase::Finished).then_some(self.point)
    }

    fn begin(&mut self) -> SurveyResult<StepOutcome> {
        match self.collector.check_associated() {
            Ok(true) => {
                self.point.start();
                self.phase = Phase::Running;
                self.logger.debug(&format!(
                    "measuring point at ({}, {})",
                    self.point.x, self.point.y
                ));
                Ok(StepOutcome::Started)
            }
            Ok(false) => Err(self.fail_run(SurveyError::NotAssociated)),
            Err(err) => Err(self.fail_run(err.into())),
        }
    }

    fn run_next_probe(&mut self) -> SurveyResult<StepOutcome> {
        let Some(&probe) = SEQUENCE.get(self.cursor) else {
            return Err(self.invalid("step"));
        };
        self.execute(probe).map_err(|err| self.fail_run(err))
    }

    fn execute(&mut self, probe: Probe) -> SurveyResult<StepOutcome> {
        self.verify_bssid()?;
        self.logger.record(&probe.status());

        match probe {
            Probe::Throughput(throughput) => {
                let result = self
                    .collector
                    .run_iperf(throughput.udp, throughput.reverse)?;
                if let Some(message) = result.error() {
                    if result.is_connection_refused() {
                        return Err(SurveyError::ProbeConnectionRefused {
                            probe: throughput.to_string(),
                            message: message.to_string(),
                        });
                    }
                    self.logger.warn(&format!("iperf {throughput} failed: {message}"));
                    let pending = PendingRetry {
                        probe: throughput,
                        result,
                    };
                    self.pending = Some(pending.clone());
                    self.phase = Phase::AwaitingRetry;
                    return Ok(StepOutcome::RetryDecisionNeeded(pending));
                }
                self.partial.set_throughput(throughput, result);
            }
            Probe::Ssid => self.partial.ssid = Some(self.collector.ssid()?),
            Probe::Rss => self.partial.rss = Some(self.collector.rss()?),
            Probe::Freq => self.partial.freq = Some(self.collector.freq()?),
            Probe::Channel => {
                let freq = match self.partial.freq {
                    Some(freq) => freq,
                    None => self.collector.freq()?,
                };
                self.partial.chan = Some(self.collector.channel(freq)?);
            }
            Probe::ChannelWidth => self.partial.chan_width = Some(self.collector.channel_width()?),
            Probe::Bitrate => self.partial.channel_bitrate = Some(self.collector.bitrate()?),
            Probe::NeighborScan => {
                if self.plan.scan {
                    let neighbors = self
                        .collector
                        .run_iwscan()?
                        .ok_or(SurveyError::ScanFailure)?;
                    self.partial.iwscan = Some(neighbors);
                }
            }
        }

        Ok(self.advance(probe))
    }

    fn verify_bssid(&self) -> SurveyResult<()> {
        let Some(expected) = &self.plan.expected_bssid else {
            return Ok(());
        };
        let found = self.collector.bssid()?;
        if self.plan.accepts_bssid(&found) {
            return Ok(());
        }
        Err(SurveyError::BssidMismatch {
            expected: expected.clone(),
            found,
        })
    }

    fn advance(&mut self, probe: Probe) -> StepOutcome {
        self.cursor += 1;
        self.point.set_progress(probe.progress_tick(), TOTAL_STEPS);
        if self.cursor < SEQUENCE.len() {
            return StepOutcome::Progressed(probe);
        }

        let result = std::mem::take(&mut self.partial);
        self.point.finish(result);
        self.phase = Phase::Finished;
        self.logger.record(&format!(
            "point at ({}, {}) finished",
            self.point.x, self.point.y
        ));
        StepOutcome::Finished
    }

    fn fail_run(&mut self, err: SurveyError) -> SurveyError {
        self.logger.error(&format!(
            "aborting point at ({}, {}): {err}",
            self.point.x, self.point.y
        ));
        self.point.reset();
        self.partial = PointResult::default();
        self.pending = None;
        self.phase = Phase::Aborted;
        err
    }

    fn invalid(&self, operation: &'static str) -> SurveyError {
        SurveyError::InvalidPhase {
            operation,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests;
