pub mod file;
pub mod point;
pub mod result;
pub mod store;

pub use file::SurveyFile;
pub use point::{PointState, SurveyPoint, MARKER_RADIUS};
pub use result::PointResult;
pub use store::SurveyStore;
