//! Simulated walking: click-to-walk interpolation driven once per frame.
//!
//! A walk is the only movement source in virtual mode. `begin` captures a
//! leg, then the frame loop calls `tick` until it reports `finished`.

use crate::config::{COLLECT_RADIUS_M, GUIDANCE_THROTTLE_MS, SIMULATED_SPEED_MPS};
use crate::geo::{GeoPoint, haversine_distance_m, initial_bearing_deg};
use crate::model::{ArrivalMetrics, MysteryPoint};
use crate::state::path::VisitedPath;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkTarget {
    pub target: GeoPoint,
    pub arrival_radius_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guidance {
    pub distance_m: f64,
    pub bearing_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub position: GeoPoint,
    pub progress: f64,
    pub finished: bool,
    /// Points found on this frame.
    pub collected: Vec<MysteryPoint>,
    /// Throttled distance/bearing to the mission target.
    pub guidance: Option<Guidance>,
    pub arrival: Option<ArrivalMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Leg {
    from: GeoPoint,
    to: GeoPoint,
    started_ms: f64,
    duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum WalkPhase {
    #[default]
    Idle,
    Walking(Leg),
}

#[derive(Debug, Clone)]
pub struct VirtualWalk {
    phase: WalkPhase,
    position: Option<GeoPoint>,
    pub distance_walked_m: f64,
    pub collected: u32,
    last_notify_ms: Option<f64>,
    arrival_fired: bool,
    speed_mps: f64,
    collect_radius_m: f64,
    throttle_ms: f64,
}

impl Default for VirtualWalk {
    fn default() -> Self {
        Self {
            phase: WalkPhase::Idle,
            position: None,
            distance_walked_m: 0.0,
            collected: 0,
            last_notify_ms: None,
            arrival_fired: false,
            speed_mps: SIMULATED_SPEED_MPS,
            collect_radius_m: COLLECT_RADIUS_M,
            throttle_ms: GUIDANCE_THROTTLE_MS,
        }
    }
}

impl VirtualWalk {
    pub fn is_walking(&self) -> bool {
        matches!(self.phase, WalkPhase::Walking(_))
    }

    pub fn set_position(&mut self, p: GeoPoint) {
        self.position = Some(p);
    }

    /// Where the next walk starts: last simulated, then real marker, then initial.
    pub fn origin(&self, marker: Option<GeoPoint>, initial: GeoPoint) -> GeoPoint {
        self.position.or(marker).unwrap_or(initial)
    }

    /// Planned duration of a walk between two points.
    pub fn duration_ms(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        haversine_distance_m(from, to) / self.speed_mps * 1000.0
    }

    /// Starts a leg. Returns false if one is already in flight.
    pub fn begin(&mut self, from: GeoPoint, to: GeoPoint, now_ms: f64) -> bool {
        if self.is_walking() {
            return false;
        }
        let duration_ms = self.duration_ms(from, to);
        log::debug!("walk: {:.0} m in {duration_ms:.0} ms", haversine_distance_m(from, to));
        self.position = Some(from);
        self.phase = WalkPhase::Walking(Leg { from, to, started_ms: now_ms, duration_ms });
        true
    }

    /// Drops the leg in flight, keeping the position reached so far.
    pub fn cancel(&mut self) {
        self.phase = WalkPhase::Idle;
    }

    /// Clears per-mission accumulators and re-arms arrival.
    pub fn reset_mission(&mut self) {
        self.distance_walked_m = 0.0;
        self.collected = 0;
        self.last_notify_ms = None;
        self.arrival_fired = false;
    }

    /// Advances the leg to `now_ms`. Returns None while idle.
    pub fn tick(
        &mut self,
        now_ms: f64,
        mystery: &mut [MysteryPoint],
        path: &mut VisitedPath,
        mission: Option<WalkTarget>,
    ) -> Option<TickReport> {
        let WalkPhase::Walking(leg) = self.phase else {
            return None;
        };
        let elapsed = (now_ms - leg.started_ms).max(0.0);
        let progress = if leg.duration_ms > 0.0 { (elapsed / leg.duration_ms).min(1.0) } else { 1.0 };
        let position = leg.from.lerp(leg.to, progress);

        let previous = self.position.unwrap_or(leg.from);
        self.distance_walked_m += haversine_distance_m(previous, position);
        self.position = Some(position);

        let mut collected = Vec::new();
        for point in mystery.iter_mut().filter(|p| !p.found) {
            if haversine_distance_m(position, point.position()) < self.collect_radius_m {
                point.found = true;
                self.collected += 1;
                collected.push(point.clone());
            }
        }

        path.append(position);

        let finished = progress >= 1.0;
        let mut guidance = None;
        let mut arrival = None;
        if let Some(m) = mission {
            let distance_m = haversine_distance_m(position, m.target);
            let due = self.last_notify_ms.is_none_or(|last| now_ms - last >= self.throttle_ms);
            if due || finished {
                self.last_notify_ms = Some(now_ms);
                guidance = Some(Guidance {
                    distance_m,
                    bearing_deg: initial_bearing_deg(position, m.target),
                });
            }
            if !self.arrival_fired && distance_m < m.arrival_radius_m {
                self.arrival_fired = true;
                arrival = Some(ArrivalMetrics {
                    distance_walked_m: self.distance_walked_m,
                    collected: self.collected,
                    total_mystery: mystery.len() as u32,
                    path: path.all().to_vec(),
                });
            }
        }

        if finished {
            self.phase = WalkPhase::Idle;
        }
        Some(TickReport { position, progress, finished, collected, guidance, arrival })
    }
}
