use serde::{Deserialize, Serialize};

use crate::survey::result::PointResult;

/// Half-size, in floorplan pixels, of the marker drawn for a point.
pub const MARKER_RADIUS: i32 = 20;

/// Lifecycle of a survey point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointState {
    Pending,
    InProgress,
    Finished,
    Failed,
}

/// One location on the floorplan and its measurement state.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyPoint {
    pub x: i32,
    pub y: i32,
    state: PointState,
    progress: u8,
    result: PointResult,
}

impl SurveyPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            state: PointState::Pending,
            progress: 0,
            result: PointResult::default(),
        }
    }

    pub fn state(&self) -> PointState {
        self.state
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result(&self) -> &PointResult {
        &self.result
    }

    pub fn is_finished(&self) -> bool {
        self.state == PointState::Finished
    }

    pub fn is_failed(&self) -> bool {
        self.state == PointState::Failed
    }

    pub fn start(&mut self) {
        self.state = PointState::InProgress;
        self.progress = 0;
    }

    /// Record that `step` of `total` steps completed. Progress never moves
    /// backwards within a run and only reaches 100 through [`Self::finish`].
    pub fn set_progress(&mut self, step: u32, total: u32) {
        if self.state != PointState::InProgress || total == 0 {
            return;
        }
        let percent = ((100 * step.min(total) + total / 2) / total).min(99) as u8;
        self.progress = self.progress.max(percent);
    }

    pub fn finish(&mut self, result: PointResult) {
        self.state = PointState::Finished;
        self.progress = 100;
        self.result = result;
    }

    /// Mark the point failed; whatever result it holds is kept.
    pub fn fail(&mut self) {
        self.state = PointState::Failed;
        self.progress = 0;
    }

    /// Drop all progress after an aborted run.
    pub fn reset(&mut self) {
        self.state = PointState::Pending;
        self.progress = 0;
        self.result = PointResult::default();
    }

    pub fn includes_point(&self, x: i32, y: i32) -> bool {
        (self.x - x).abs() <= MARKER_RADIUS && (self.y - y).abs() <= MARKER_RADIUS
    }

    pub(crate) fn to_record(&self) -> PointRecordRef<'_> {
        PointRecordRef {
            x: self.x,
            y: self.y,
            result: &self.result,
            failed: self.is_failed(),
        }
    }

    /// Rebuild a persisted point. Stored points always come back finished;
    /// the stored `failed` flag is not restored.
    pub(crate) fn from_record(record: PointRecord) -> Self {
        let mut point = Self::new(record.x, record.y);
        point.finish(record.result);
        point
    }
}

/// Serialized form of a point: `{x, y, result, failed}`.
#[derive(Debug, Serialize)]
pub(crate) struct PointRecordRef<'a> {
    x: i32,
    y: i32,
    result: &'a PointResult,
    failed: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointRecord {
    x: i32,
    y: i32,
    #[serde(default)]
    result: PointResult,
    #[serde(default)]
    #[allow(dead_code)]
    failed: bool,
}
