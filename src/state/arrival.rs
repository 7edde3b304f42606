// Arrival detection for real (GPS) position updates
use crate::geo::{GeoPoint, haversine_distance_m};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub distance_m: f64,
    /// True only on the first update inside the radius.
    pub arrived_now: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArrivalDetector {
    arrived: bool,
}

impl ArrivalDetector {
    pub fn observe(&mut self, position: GeoPoint, target: GeoPoint, radius_m: f64) -> Observation {
        let distance_m = haversine_distance_m(position, target);
        let arrived_now = !self.arrived && distance_m < radius_m;
        if arrived_now {
            self.arrived = true;
        }
        Observation { distance_m, arrived_now }
    }

    #[cfg(test)]
    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    pub fn reset(&mut self) {
        self.arrived = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: GeoPoint = GeoPoint::new(8.6512, 49.8728);

    #[test]
    fn reports_distance_every_update() {
        let mut d = ArrivalDetector::default();
        let far = TARGET.offset_meters(100.0, 0.0);
        let obs = d.observe(far, TARGET, 5.0);
        assert!((obs.distance_m - 100.0).abs() < 0.5);
        assert!(!obs.arrived_now);
    }

    #[test]
    fn arrival_fires_once_while_lingering() {
        let mut d = ArrivalDetector::default();
        let inside = TARGET.offset_meters(2.0, 0.0);
        assert!(d.observe(inside, TARGET, 5.0).arrived_now);
        assert!(!d.observe(inside, TARGET, 5.0).arrived_now);
        assert!(!d.observe(TARGET, TARGET, 5.0).arrived_now);
        assert!(d.has_arrived());
    }

    #[test]
    fn reset_rearms() {
        let mut d = ArrivalDetector::default();
        d.observe(TARGET, TARGET, 5.0);
        d.reset();
        assert!(d.observe(TARGET, TARGET, 5.0).arrived_now);
    }
}
