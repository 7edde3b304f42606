//! Tunables for the fog map, the walk simulation and persistence, plus the
//! user-facing settings persisted in localStorage.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Real-world radius revealed around every visited point.
pub const FOG_REVEAL_RADIUS_M: f64 = 200.0;
/// Stroke widening applied to the tunnel so neighbouring samples overlap.
pub const TUNNEL_WIDEN_FACTOR: f64 = 1.2;
pub const FOG_COLOR: &str = "rgba(255,255,255,0.92)";
pub const BACKGROUND_COLOR: &str = "#e8eef2";
pub const GRID_COLOR: &str = "#cfd8de";

/// Deliberately unrealistic so sessions stay short.
pub const SIMULATED_SPEED_MPS: f64 = 250.0;
pub const COLLECT_RADIUS_M: f64 = 30.0;
pub const VIRTUAL_ARRIVAL_RADIUS_M: f64 = 20.0;
pub const REAL_ARRIVAL_RADIUS_M: f64 = 5.0;
pub const GUIDANCE_THROTTLE_MS: f64 = 100.0;

/// Minimum planar separation (degrees) between consecutive path samples.
pub const PATH_DEDUP_THRESHOLD_DEG: f64 = 0.00005;
pub const SNAPSHOT_INTERVAL_MS: u32 = 1000;
pub const PERSIST_DEBOUNCE_MS: f64 = 5000.0;
pub const GEOLOCATION_TIMEOUT_MS: i32 = 8000;

pub const DEFAULT_LOCATION: GeoPoint = GeoPoint::new(8.6512, 49.8728);
/// Points are scattered toward this spot when a mission brings no badge list.
pub const DEFAULT_GOAL_HINT: GeoPoint = GeoPoint::new(8.6566, 49.8776);
pub const MYSTERY_COUNT: usize = 5;
pub const MYSTERY_JITTER_M: f64 = 400.0;
pub const MYSTERY_NEAR_START_OFFSET_DEG: (f64, f64) = (0.0004, 0.0003);

pub const FLOATING_TEXT_LIFETIME_MS: f64 = 1500.0;
pub const FLOATING_TEXT_RISE_PX: f64 = 40.0;

pub const XP_PER_POINT: u32 = 100;
pub const XP_PER_BADGE: u32 = 500;
pub const XP_PER_LEVEL: u32 = 1000;
pub const XP_PER_COLLECTIBLE: u32 = 100;

pub const DEFAULT_ZOOM: f64 = 15.0;
pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 20.0;

const SETTINGS_KEY: &str = "fog_settings";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Recenter the camera on every simulated step.
    pub camera_follow: bool,
    pub show_route: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { camera_follow: true, show_route: true }
    }
}

impl Settings {
    pub fn load() -> Self {
        let raw = web_sys::window()
            .and_then(|win| win.local_storage().ok().flatten())
            .and_then(|store| store.get_item(SETTINGS_KEY).ok().flatten());
        match raw {
            Some(raw) => Self::from_json(&raw),
            None => Self::default(),
        }
    }

    pub fn save(&self) {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                if let Ok(s) = serde_json::to_string(self) {
                    let _ = store.set_item(SETTINGS_KEY, &s);
                }
            }
        }
    }

    fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let s = Settings::from_json(r#"{"show_route":false}"#);
        assert!(s.camera_follow);
        assert!(!s.show_route);
    }

    #[test]
    fn garbage_settings_fall_back() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
    }
}
