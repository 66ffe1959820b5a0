use crate::prelude::{SurveyError, SurveyResult};
use crate::survey::point::{PointRecord, PointRecordRef, SurveyPoint};

/// Survey points in creation order.
///
/// Order doubles as z-order: when markers overlap, the most recently added
/// point is the one a location resolves to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyStore {
    points: Vec<SurveyPoint>,
}

impl SurveyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<SurveyPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SurveyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn add(&mut self, point: SurveyPoint) {
        self.points.push(point);
    }

    /// Remove the first point equal to `point`.
    pub fn remove(&mut self, point: &SurveyPoint) -> bool {
        match self.points.iter().position(|candidate| candidate == point) {
            Some(index) => {
                self.points.remove(index);
                true
            }
            None => false,
        }
    }

    /// Index of the most recently added point containing the location.
    pub fn index_at(&self, x: i32, y: i32) -> Option<usize> {
        self.points.iter().rposition(|point| point.includes_point(x, y))
    }

    pub fn point_at(&self, x: i32, y: i32) -> Option<&SurveyPoint> {
        self.index_at(x, y).map(|index| &self.points[index])
    }

    pub fn remove_at(&mut self, x: i32, y: i32) -> Option<SurveyPoint> {
        self.index_at(x, y).map(|index| self.points.remove(index))
    }

    /// Relocate the point at `index`. Returns false if there is none.
    pub fn move_point(&mut self, index: usize, x: i32, y: i32) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                point.x = x;
                point.y = y;
                true
            }
            None => false,
        }
    }

    /// Snapshot of every point as a JSON array, in insertion order.
    pub fn serialize(&self) -> SurveyResult<Vec<u8>> {
        let records: Vec<PointRecordRef<'_>> =
            self.points.iter().map(SurveyPoint::to_record).collect();
        serde_json::to_vec(&records).map_err(|err| SurveyError::Encoding(err.to_string()))
    }

    /// Parse a snapshot written by [`Self::serialize`]. Every point comes
    /// back finished with full progress.
    pub fn load(bytes: &[u8]) -> SurveyResult<Vec<SurveyPoint>> {
        let records: Vec<PointRecord> = serde_json::from_slice(bytes)?;
        Ok(records.into_iter().map(SurveyPoint::from_record).collect())
    }
}
