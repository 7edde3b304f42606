// Collectible "mystery" points scattered around a mission start
use rand::Rng;

use crate::config::{MYSTERY_JITTER_M, MYSTERY_NEAR_START_OFFSET_DEG};
use crate::geo::GeoPoint;
use crate::model::MysteryPoint;

/// Places `count` points along the line start -> goal_hint, each jittered on
/// both axes, plus one close to the start so the mechanic shows up at once.
pub fn generate<R: Rng + ?Sized>(
    start: GeoPoint,
    goal_hint: GeoPoint,
    count: usize,
    rng: &mut R,
) -> Vec<MysteryPoint> {
    let mut points = Vec::with_capacity(count + 1);
    let (dlng, dlat) = MYSTERY_NEAR_START_OFFSET_DEG;
    points.push(MysteryPoint::new(
        "mystery-start",
        GeoPoint::new(start.lng + dlng, start.lat + dlat),
    ));
    for i in 0..count {
        let t = (i + 1) as f64 / (count + 1) as f64;
        let base = start.lerp(goal_hint, t);
        let east = rng.gen_range(-MYSTERY_JITTER_M..=MYSTERY_JITTER_M);
        let north = rng.gen_range(-MYSTERY_JITTER_M..=MYSTERY_JITTER_M);
        points.push(MysteryPoint::new(format!("mystery-{i}"), base.offset_meters(east, north)));
    }
    points
}

/// A mission-supplied list is used verbatim, only reset to unfound.
pub fn from_badges(badges: &[MysteryPoint]) -> Vec<MysteryPoint> {
    badges
        .iter()
        .cloned()
        .map(|mut b| {
            b.found = false;
            b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_distance_m;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const START: GeoPoint = GeoPoint::new(8.6512, 49.8728);
    const GOAL: GeoPoint = GeoPoint::new(8.6700, 49.8800);

    #[test]
    fn generates_count_plus_near_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let pts = generate(START, GOAL, 5, &mut rng);
        assert_eq!(pts.len(), 6);
        assert!(pts.iter().all(|p| !p.found));
        let near = haversine_distance_m(START, pts[0].position());
        assert!(near < 100.0, "near-start point at {near:.0} m");
    }

    #[test]
    fn points_stay_near_the_line() {
        let mut rng = StdRng::seed_from_u64(42);
        let pts = generate(START, GOAL, 5, &mut rng);
        for (i, p) in pts.iter().skip(1).enumerate() {
            let t = (i + 1) as f64 / 6.0;
            let base = START.lerp(GOAL, t);
            let d = haversine_distance_m(base, p.position());
            // ±400 m on each axis
            assert!(d <= 400.0 * 2f64.sqrt() + 1.0, "point {i} is {d:.0} m off");
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let pts = generate(START, GOAL, 5, &mut rng);
        let mut ids: Vec<_> = pts.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn badge_list_is_reset_not_changed() {
        let mut b = MysteryPoint::new("cafe", GOAL);
        b.found = true;
        let pts = from_badges(&[b]);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].id, "cafe");
        assert_eq!(pts[0].position(), GOAL);
        assert!(!pts[0].found);
    }
}
