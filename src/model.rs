//! Core data models shared by the fog map, the missions and the export.

use serde::{Deserialize, Serialize};
use yew::Callback;

use crate::config::{XP_PER_BADGE, XP_PER_LEVEL, XP_PER_POINT};
use crate::geo::GeoPoint;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MysteryPoint {
    pub id: String,
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub found: bool,
}

impl MysteryPoint {
    pub fn new(id: impl Into<String>, at: GeoPoint) -> Self {
        Self { id: id.into(), lng: at.lng, lat: at.lat, found: false }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lng, self.lat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionId {
    Navigation,
    Detour,
    FreeRoam,
}

impl MissionId {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionId::Navigation => "navigation",
            MissionId::Detour => "detour",
            MissionId::FreeRoam => "free_roam",
        }
    }

    /// Target glow is drawn on top of the fog for these missions.
    pub fn forces_target_glow(self) -> bool {
        matches!(self, MissionId::Navigation)
    }

    /// Incentive variant: pickups are shown through the fog and reported.
    pub fn is_incentive(self) -> bool {
        matches!(self, MissionId::Detour)
    }
}

/// Delivered once when the walker reaches the mission target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrivalMetrics {
    pub distance_walked_m: f64,
    pub collected: u32,
    pub total_mystery: u32,
    pub path: Vec<GeoPoint>,
}

/// Final payload when a mission ends without arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct MissionOutcome {
    pub mission: MissionId,
    pub gave_up: bool,
    pub metrics: ArrivalMetrics,
}

/// Configuration handed to the fog map by a mission screen.
#[derive(Clone, PartialEq)]
pub struct MissionMode {
    pub active: bool,
    pub is_virtual: bool,
    pub start_position: Option<GeoPoint>,
    pub target: Option<GeoPoint>,
    pub mission_id: MissionId,
    pub arrival_radius: Option<f64>,
    pub badges: Option<Vec<MysteryPoint>>,
    pub route: Vec<GeoPoint>,
    pub on_arrival: Callback<ArrivalMetrics>,
    pub on_distance_update: Callback<f64>,
    pub on_outcome: Callback<MissionOutcome>,
    pub on_collectible_found: Callback<MysteryPoint>,
}

impl MissionMode {
    pub fn arrival_radius_m(&self) -> f64 {
        self.arrival_radius.unwrap_or(if self.is_virtual {
            crate::config::VIRTUAL_ARRIVAL_RADIUS_M
        } else {
            crate::config::REAL_ARRIVAL_RADIUS_M
        })
    }

    /// Identity of one mission activation; arrival latches reset when it changes.
    pub fn activation_key(&self) -> (MissionId, bool, Option<(u64, u64)>) {
        let target = self.target.map(|t| (t.lng.to_bits(), t.lat.to_bits()));
        (self.mission_id, self.active, target)
    }
}

// ---------------- Badges & levels -----------------
pub struct Badge {
    pub name: &'static str,
    pub icon: &'static str,
    pub threshold: usize,
}

pub const BADGES: &[Badge] = &[
    Badge { name: "Entdecker", icon: "🧭", threshold: 5 },
    Badge { name: "Wanderer", icon: "🥾", threshold: 25 },
    Badge { name: "Pfadfinder", icon: "🏕", threshold: 50 },
    Badge { name: "Kartograph", icon: "🗺", threshold: 100 },
    Badge { name: "Weltenbummler", icon: "🌍", threshold: 250 },
];

pub fn unlocked_badges(visited_count: usize) -> impl Iterator<Item = &'static Badge> {
    BADGES.iter().filter(move |b| visited_count >= b.threshold)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelStats {
    pub level: u32,
    pub current_xp: u32,
    pub next_level_xp: u32,
    /// Percent of the way to the next level (0..100).
    pub progress: f64,
    pub total_xp: u32,
}

pub fn calculate_level(visited_points: &[GeoPoint]) -> LevelStats {
    let visited = visited_points.len() as u32;
    let badges = unlocked_badges(visited_points.len()).count() as u32;
    let xp = visited * XP_PER_POINT + badges * XP_PER_BADGE;
    let current_xp = xp % XP_PER_LEVEL;
    LevelStats {
        level: xp / XP_PER_LEVEL + 1,
        current_xp,
        next_level_xp: XP_PER_LEVEL,
        progress: current_xp as f64 / XP_PER_LEVEL as f64 * 100.0,
        total_xp: xp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<GeoPoint> {
        (0..n).map(|i| GeoPoint::new(8.65 + i as f64 * 0.001, 49.87)).collect()
    }

    #[test]
    fn empty_path_is_level_one() {
        let stats = calculate_level(&[]);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.current_xp, 0);
        assert_eq!(stats.progress, 0.0);
        assert_eq!(stats.next_level_xp, 1000);
    }

    #[test]
    fn explorer_badge_adds_bonus_at_five_points() {
        let four = calculate_level(&points(4));
        assert_eq!(four.total_xp, 400);
        let five = calculate_level(&points(5));
        assert_eq!(five.total_xp, 5 * 100 + 500);
        assert_eq!(five.level, 2);
        assert_eq!(five.current_xp, 0);
    }

    #[test]
    fn progress_is_percent_of_level() {
        let stats = calculate_level(&points(7));
        // 700 + 500
        assert_eq!(stats.level, 2);
        assert_eq!(stats.current_xp, 200);
        assert!((stats.progress - 20.0).abs() < 1e-9);
    }

    #[test]
    fn badges_unlock_in_order() {
        let names: Vec<_> = unlocked_badges(60).map(|b| b.name).collect();
        assert_eq!(names, vec!["Entdecker", "Wanderer", "Pfadfinder"]);
    }

    #[test]
    fn incentive_and_glow_flags() {
        assert!(MissionId::Detour.is_incentive());
        assert!(!MissionId::Navigation.is_incentive());
        assert!(MissionId::Navigation.forces_target_glow());
        assert_eq!(MissionId::FreeRoam.as_str(), "free_roam");
    }
}
