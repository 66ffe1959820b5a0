use crate::status::bridge::StatusBridge;
use crate::workflow::ding::Ding;
use anyhow::Context;
use surveycore::prelude::{Collector, SurveyError, SurveyPlan};
use surveycore::sequencer::{PendingRetry, Sequencer, StepOutcome};
use surveycore::survey::{SurveyFile, SurveyPoint, SurveyStore};
use surveycore::telemetry::{LogManager, Metrics, MetricsRecorder};
use surveycore::RetryDecision;

/// The person at the console, consulted whenever the survey needs a decision.
pub trait Operator {
    /// Answer a transient probe failure. `None` abandons the point.
    fn retry_decision(&mut self, pending: &PendingRetry) -> Option<RetryDecision>;
    fn confirm(&mut self, question: &str) -> bool;
    fn notify(&mut self, message: &str);
}

#[derive(Debug)]
pub enum MeasureOutcome {
    /// The point finished and the survey file was rewritten.
    Saved { index: usize },
    /// The attempt ended early; store and file are unchanged.
    Discarded(SurveyError),
}

/// Drives one survey session: measures points, edits the store and keeps
/// the survey file in step with it.
pub struct Runner<C: Collector> {
    collector: C,
    plan: SurveyPlan,
    store: SurveyStore,
    file: SurveyFile,
    ding: Option<Ding>,
    bridge: StatusBridge,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<C: Collector> Runner<C> {
    pub fn new(
        collector: C,
        plan: SurveyPlan,
        store: SurveyStore,
        file: SurveyFile,
        bridge: StatusBridge,
        logger: LogManager,
    ) -> Self {
        bridge.publish_points(&store);
        Self {
            collector,
            plan,
            store,
            file,
            ding: None,
            bridge,
            metrics: MetricsRecorder::new(),
            logger,
        }
    }

    pub fn with_ding(mut self, ding: Option<Ding>) -> Self {
        self.ding = ding;
        self
    }

    pub fn store(&self) -> &SurveyStore {
        &self.store
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    fn status(&self, operator: &mut dyn Operator, message: &str) {
        self.bridge.publish_status(message);
        operator.notify(message);
    }

    /// Measure a new point at `(x, y)`. Only finished points reach the store.
    pub fn measure(
        &mut self,
        x: i32,
        y: i32,
        operator: &mut dyn Operator,
    ) -> anyhow::Result<MeasureOutcome> {
        self.status(operator, &format!("Got click at: ({x}, {y})"));
        let mut sequencer = Sequencer::new(
            &self.collector,
            self.plan.clone(),
            SurveyPoint::new(x, y),
            self.logger,
        );

        loop {
            let outcome = match sequencer.step() {
                Ok(outcome) => outcome,
                Err(err) => return Ok(self.discard(operator, err)),
            };
            self.bridge.publish_active(Some(sequencer.point()));

            match outcome {
                StepOutcome::Started | StepOutcome::Progressed(_) => {
                    if let Some(probe) = sequencer.next_probe() {
                        self.status(operator, &probe.status());
                    }
                }
                StepOutcome::RetryDecisionNeeded(pending) => {
                    match operator.retry_decision(&pending) {
                        Some(decision) => {
                            if decision == RetryDecision::Retry {
                                self.metrics.record_retry();
                            }
                            sequencer.resume(decision)?;
                        }
                        None => {
                            sequencer.abort()?;
                            return Ok(self.discard(operator, SurveyError::OperatorAbort));
                        }
                    }
                }
                StepOutcome::Finished => break,
            }
        }

        let point = sequencer
            .into_point()
            .context("sequencer finished without a point")?;
        self.commit(operator, point)
    }

    fn discard(&self, operator: &mut dyn Operator, err: SurveyError) -> MeasureOutcome {
        self.metrics.record_aborted();
        self.bridge.publish_active(None);
        self.bridge.publish_metrics(self.metrics.snapshot());
        let message = match &err {
            SurveyError::ProbeConnectionRefused { .. } => {
                "ERROR: Unable to connect to iperf server. Aborting.".to_string()
            }
            SurveyError::BssidMismatch { .. } => format!("ERROR: {err}"),
            _ => format!("Aborted ({err}); ready to retry..."),
        };
        self.status(operator, &message);
        MeasureOutcome::Discarded(err)
    }

    fn commit(
        &mut self,
        operator: &mut dyn Operator,
        point: SurveyPoint,
    ) -> anyhow::Result<MeasureOutcome> {
        self.status(
            operator,
            &format!("Saving to: {}", self.file.path().display()),
        );
        let mut candidate = self.store.clone();
        candidate.add(point);
        if let Err(err) = self.save(candidate) {
            self.metrics.record_aborted();
            self.bridge.publish_active(None);
            self.bridge.publish_metrics(self.metrics.snapshot());
            return Err(err);
        }

        self.metrics.record_finished();
        self.bridge.publish_active(None);
        self.bridge.publish_metrics(self.metrics.snapshot());
        self.status(
            operator,
            &format!("Saved to {}; ready...", self.file.path().display()),
        );
        if let Some(ding) = &self.ding {
            ding.play(&self.logger);
        }
        Ok(MeasureOutcome::Saved {
            index: self.store.len() - 1,
        })
    }

    /// Persist `candidate` and adopt it only once the write succeeded.
    fn save(&mut self, candidate: SurveyStore) -> anyhow::Result<()> {
        self.file
            .save_store(&candidate)
            .with_context(|| format!("writing {}", self.file.path().display()))?;
        self.store = candidate;
        self.bridge.publish_points(&self.store);
        Ok(())
    }

    /// Remove the point shown at `(x, y)` after the operator confirms.
    pub fn remove(&mut self, x: i32, y: i32, operator: &mut dyn Operator) -> anyhow::Result<bool> {
        if self.store.index_at(x, y).is_none() {
            self.status(operator, &format!("No survey point found at ({x}, {y})"));
            return Ok(false);
        }
        if !operator.confirm(&format!("Remove point at ({x}, {y})?")) {
            self.status(operator, "Not removing point.");
            return Ok(false);
        }

        let mut candidate = self.store.clone();
        candidate.remove_at(x, y);
        self.save(candidate)?;
        self.status(operator, &format!("Removed point at ({x}, {y})"));
        Ok(true)
    }

    /// Move the point shown at `(x, y)` to `(to_x, to_y)` after the operator confirms.
    pub fn relocate(
        &mut self,
        (x, y): (i32, i32),
        (to_x, to_y): (i32, i32),
        operator: &mut dyn Operator,
    ) -> anyhow::Result<bool> {
        let Some(index) = self.store.index_at(x, y) else {
            self.status(operator, &format!("No survey point found at ({x}, {y})"));
            return Ok(false);
        };
        let (old_x, old_y) = {
            let point = &self.store.points()[index];
            (point.x, point.y)
        };
        if !operator.confirm(&format!(
            "Move point from ({old_x}, {old_y}) to ({to_x}, {to_y})?"
        )) {
            self.status(operator, "Not moving point.");
            return Ok(false);
        }

        let mut candidate = self.store.clone();
        candidate.move_point(index, to_x, to_y);
        self.save(candidate)?;
        self.status(
            operator,
            &format!("Moved point to ({to_x}, {to_y})"),
        );
        Ok(true)
    }
}
