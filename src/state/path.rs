//! Append-only record of visited positions.
//!
//! The map keeps one `VisitedPath` in a mutable cell that the frame loops
//! write to and the renderer reads in place. UI state only ever sees the
//! copies handed out by [`VisitedPath::take_snapshot`].

use std::rc::Rc;

use crate::config::PATH_DEDUP_THRESHOLD_DEG;
use crate::geo::{GeoPoint, planar_separation_deg};

#[derive(Debug, Clone)]
pub struct VisitedPath {
    points: Vec<GeoPoint>,
    threshold_deg: f64,
    published_len: Option<usize>,
}

impl Default for VisitedPath {
    fn default() -> Self {
        Self::with_threshold(PATH_DEDUP_THRESHOLD_DEG)
    }
}

impl VisitedPath {
    pub fn with_threshold(threshold_deg: f64) -> Self {
        Self { points: Vec::new(), threshold_deg, published_len: None }
    }

    pub fn from_points(points: Vec<GeoPoint>) -> Self {
        Self { points, ..Self::default() }
    }

    /// Adds `p` unless it is within the dedup threshold of the last sample.
    pub fn append(&mut self, p: GeoPoint) -> bool {
        if let Some(last) = self.points.last() {
            if planar_separation_deg(*last, p) < self.threshold_deg {
                return false;
            }
        }
        self.points.push(p);
        true
    }

    pub fn all(&self) -> &[GeoPoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.published_len = None;
    }

    /// Copy of the path if it changed since the previous snapshot.
    pub fn take_snapshot(&mut self) -> Option<Rc<Vec<GeoPoint>>> {
        if self.published_len == Some(self.points.len()) {
            return None;
        }
        self.published_len = Some(self.points.len());
        Some(Rc::new(self.points.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: GeoPoint = GeoPoint::new(8.6512, 49.8728);

    #[test]
    fn close_points_are_rejected() {
        let mut path = VisitedPath::default();
        assert!(path.append(START));
        assert!(!path.append(GeoPoint::new(START.lng + 0.00001, START.lat)));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn distant_point_adds_exactly_one() {
        let mut path = VisitedPath::default();
        path.append(START);
        assert!(path.append(GeoPoint::new(START.lng + 0.001, START.lat)));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn dedup_compares_against_last_only() {
        let mut path = VisitedPath::default();
        path.append(START);
        path.append(GeoPoint::new(START.lng + 0.001, START.lat));
        // back at the start is far from the last sample, so it counts
        assert!(path.append(START));
        assert_eq!(path.all().len(), 3);
    }

    #[test]
    fn snapshot_only_when_changed() {
        let mut path = VisitedPath::default();
        path.append(START);
        let first = path.take_snapshot().expect("first snapshot");
        assert_eq!(first.len(), 1);
        assert!(path.take_snapshot().is_none());
        path.append(GeoPoint::new(START.lng, START.lat + 0.001));
        assert_eq!(path.take_snapshot().map(|s| s.len()), Some(2));
    }

    #[test]
    fn clear_empties_and_republishes() {
        let mut path = VisitedPath::from_points(vec![START]);
        let _ = path.take_snapshot();
        path.clear();
        assert!(path.is_empty());
        assert_eq!(path.take_snapshot().map(|s| s.len()), Some(0));
    }
}
