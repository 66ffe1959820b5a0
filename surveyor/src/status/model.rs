use serde::Serialize;
use surveycore::survey::{PointResult, PointState};
use surveycore::telemetry::Metrics;
use surveycore::{SurveyPoint, SurveyStore};

/// A survey point as an outside viewer sees it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PointView {
    pub x: i32,
    pub y: i32,
    pub state: PointState,
    pub progress: u8,
    pub result: PointResult,
}

impl From<&SurveyPoint> for PointView {
    fn from(point: &SurveyPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            state: point.state(),
            progress: point.progress(),
            result: point.result().clone(),
        }
    }
}

/// Body of `GET /points`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct PointsView {
    pub points: Vec<PointView>,
    /// The point currently being measured, if any.
    pub active: Option<PointView>,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct StatusView {
    pub title: String,
    pub status: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Default)]
pub struct SurveyModel {
    pub points: PointsView,
    pub status: StatusView,
}

impl SurveyModel {
    pub fn new(title: &str) -> Self {
        Self {
            points: PointsView::default(),
            status: StatusView {
                title: title.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn set_points(&mut self, store: &SurveyStore) {
        self.points.points = store.points().iter().map(PointView::from).collect();
    }
}
