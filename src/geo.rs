//! Great-circle helpers on WGS84 degrees and the Web-Mercator pixel scale.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Rejects non-finite or out-of-range degrees, as read from a device fix.
    pub fn checked(lng: f64, lat: f64) -> Option<Self> {
        ((-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)).then_some(Self { lng, lat })
    }

    /// Linear interpolation of both axes independently.
    pub fn lerp(self, to: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lng: self.lng + (to.lng - self.lng) * t,
            lat: self.lat + (to.lat - self.lat) * t,
        }
    }

    /// Shifts the point by metric offsets (east, north), flat-earth approximation.
    pub fn offset_meters(self, east_m: f64, north_m: f64) -> GeoPoint {
        let lat_deg = north_m / METERS_PER_DEGREE_LAT;
        let lng_deg = east_m / (METERS_PER_DEGREE_LAT * self.lat.to_radians().cos());
        GeoPoint::new(self.lng + lng_deg, self.lat + lat_deg)
    }
}

pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Forward azimuth from `a` to `b`, in [0, 360).
pub fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negatives
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Euclidean separation in degree space. No trig, meant for hot paths.
pub fn planar_separation_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    (dx * dx + dy * dy).sqrt()
}

pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat.to_radians().cos() / 2f64.powf(zoom + 8.0)
}

pub fn meters_to_pixels(meters: f64, lat: f64, zoom: f64) -> f64 {
    let mpp = meters_per_pixel(lat, zoom);
    if mpp <= 0.0 { 0.0 } else { meters / mpp }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARMSTADT: GeoPoint = GeoPoint::new(8.6512, 49.8728);
    const FRANKFURT: GeoPoint = GeoPoint::new(8.6821, 50.1109);

    #[test]
    fn checked_rejects_bad_fixes() {
        assert_eq!(GeoPoint::checked(8.6512, 49.8728), Some(DARMSTADT));
        assert_eq!(GeoPoint::checked(f64::NAN, 49.0), None);
        assert_eq!(GeoPoint::checked(8.0, 91.0), None);
        assert_eq!(GeoPoint::checked(-181.0, 0.0), None);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let ab = haversine_distance_m(DARMSTADT, FRANKFURT);
        let ba = haversine_distance_m(FRANKFURT, DARMSTADT);
        assert!((ab - ba).abs() < 1e-6);
        assert_eq!(haversine_distance_m(DARMSTADT, DARMSTADT), 0.0);
    }

    #[test]
    fn distance_darmstadt_frankfurt() {
        let d = haversine_distance_m(DARMSTADT, FRANKFURT);
        assert!(d > 26_000.0 && d < 27_500.0, "expected ~26.6 km, got {d:.0} m");
    }

    #[test]
    fn short_distances_stay_stable() {
        let b = DARMSTADT.offset_meters(0.0, 1.0);
        let d = haversine_distance_m(DARMSTADT, b);
        assert!((d - 1.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn bearing_cardinals() {
        let north = GeoPoint::new(DARMSTADT.lng, DARMSTADT.lat + 0.01);
        let east = GeoPoint::new(DARMSTADT.lng + 0.01, DARMSTADT.lat);
        let south = GeoPoint::new(DARMSTADT.lng, DARMSTADT.lat - 0.01);
        let west = GeoPoint::new(DARMSTADT.lng - 0.01, DARMSTADT.lat);
        assert!(initial_bearing_deg(DARMSTADT, north).abs() < 1e-6);
        assert!((initial_bearing_deg(DARMSTADT, east) - 90.0).abs() < 0.1);
        assert!((initial_bearing_deg(DARMSTADT, south) - 180.0).abs() < 1e-6);
        assert!((initial_bearing_deg(DARMSTADT, west) - 270.0).abs() < 0.1);
    }

    #[test]
    fn bearing_is_in_range() {
        for i in 0..72 {
            let angle = (i as f64 * 5.0).to_radians();
            let b = GeoPoint::new(
                DARMSTADT.lng + 0.02 * angle.sin(),
                DARMSTADT.lat + 0.02 * angle.cos(),
            );
            let bearing = initial_bearing_deg(DARMSTADT, b);
            assert!((0.0..360.0).contains(&bearing), "bearing {bearing} out of range");
        }
    }

    #[test]
    fn meters_per_pixel_at_equator_zoom_zero() {
        let mpp = meters_per_pixel(0.0, 0.0);
        assert!((mpp - 156_543.03).abs() < 0.1, "got {mpp}");
        assert!((meters_per_pixel(0.0, 1.0) - mpp / 2.0).abs() < 1e-6);
    }

    #[test]
    fn reveal_radius_grows_with_zoom() {
        let r15 = meters_to_pixels(200.0, DARMSTADT.lat, 15.0);
        let r16 = meters_to_pixels(200.0, DARMSTADT.lat, 16.0);
        assert!((r16 / r15 - 2.0).abs() < 1e-9);
        assert!(r15 > 50.0 && r15 < 100.0, "got {r15}");
    }
}
