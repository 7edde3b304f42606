// Real (GPS) position bookkeeping: walked distance and path samples.
use crate::geo::{GeoPoint, haversine_distance_m};
use crate::state::path::VisitedPath;

/// Where the marker sits and whether it came from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpsFix {
    /// Stand-in position while the device has no fix. Never walked, never recorded.
    Fallback(GeoPoint),
    Live(GeoPoint),
}

impl GpsFix {
    pub fn position(self) -> GeoPoint {
        match self {
            GpsFix::Fallback(p) | GpsFix::Live(p) => p,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GpsTrack {
    fix: Option<GpsFix>,
    walked_m: f64,
}

impl GpsTrack {
    #[cfg(test)]
    pub fn fix(&self) -> Option<GpsFix> {
        self.fix
    }

    pub fn walked_m(&self) -> f64 {
        self.walked_m
    }

    /// Parks the marker at `p` until a device fix arrives. A live fix wins.
    pub fn fallback(&mut self, p: GeoPoint) -> bool {
        if matches!(self.fix, Some(GpsFix::Live(_))) {
            return false;
        }
        self.fix = Some(GpsFix::Fallback(p));
        true
    }

    /// Device update. Distance grows only between consecutive live fixes, so
    /// the jump away from a fallback position is neither walked nor recorded.
    pub fn live(&mut self, p: GeoPoint, path: &mut VisitedPath) -> f64 {
        let step = match self.fix {
            Some(GpsFix::Live(prev)) => haversine_distance_m(prev, p),
            Some(GpsFix::Fallback(_)) | None => 0.0,
        };
        self.walked_m += step;
        self.fix = Some(GpsFix::Live(p));
        path.append(p);
        step
    }

    /// New mission: the distance starts over, the last fix is kept.
    pub fn reset_distance(&mut self) {
        self.walked_m = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: GeoPoint = GeoPoint::new(8.6512, 49.8728);

    fn far_away() -> GeoPoint {
        HOME.offset_meters(3_000.0, 2_000.0)
    }

    #[test]
    fn live_fixes_accumulate_distance() {
        let mut track = GpsTrack::default();
        let mut path = VisitedPath::default();
        assert_eq!(track.live(HOME, &mut path), 0.0);
        let step = track.live(HOME.offset_meters(50.0, 0.0), &mut path);
        assert!((step - 50.0).abs() < 0.5);
        assert!((track.walked_m() - 50.0).abs() < 0.5);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn first_live_fix_after_fallback_does_not_jump() {
        let mut track = GpsTrack::default();
        let mut path = VisitedPath::default();
        assert!(track.fallback(HOME));
        assert_eq!(track.fix(), Some(GpsFix::Fallback(HOME)));
        assert!(path.is_empty());

        let real = far_away();
        assert_eq!(track.live(real, &mut path), 0.0);
        assert_eq!(track.walked_m(), 0.0);
        assert_eq!(path.all(), &[real]);
        assert_eq!(track.fix().map(GpsFix::position), Some(real));

        track.live(real.offset_meters(0.0, 20.0), &mut path);
        assert!((track.walked_m() - 20.0).abs() < 0.5);
    }

    #[test]
    fn late_fallback_never_overrides_a_live_fix() {
        let mut track = GpsTrack::default();
        let mut path = VisitedPath::default();
        track.live(far_away(), &mut path);
        assert!(!track.fallback(HOME));
        assert_eq!(track.fix(), Some(GpsFix::Live(far_away())));
    }

    #[test]
    fn reset_keeps_the_last_fix() {
        let mut track = GpsTrack::default();
        let mut path = VisitedPath::default();
        track.live(HOME, &mut path);
        track.live(HOME.offset_meters(100.0, 0.0), &mut path);
        track.reset_distance();
        assert_eq!(track.walked_m(), 0.0);
        let step = track.live(HOME.offset_meters(130.0, 0.0), &mut path);
        assert!((track.walked_m() - step).abs() < 1e-9);
        assert!((step - 30.0).abs() < 0.5);
    }
}
