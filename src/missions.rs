//! Missions as data plus the one state machine every mission screen runs.
//!
//! Each mission is `Intro -> Active -> Feedback -> Done`. Events that do not
//! fit the current phase are ignored, so a repeated arrival after the first
//! one has no effect.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use yew::Reducible;

use crate::config::XP_PER_COLLECTIBLE;
use crate::geo::GeoPoint;
use crate::model::{ArrivalMetrics, MissionId, MissionOutcome, MysteryPoint};

#[derive(Debug)]
pub struct Question {
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scoring {
    /// Flat bonus for reaching the target.
    Arrival { bonus: u32 },
    /// Points per collected pickup, plus an arrival bonus.
    Collectibles { per_item: u32, arrival_bonus: u32 },
}

#[derive(Debug)]
pub struct MissionSpec {
    pub id: MissionId,
    pub title: &'static str,
    pub story: &'static str,
    pub choice: Question,
    pub briefing: &'static str,
    pub start: GeoPoint,
    pub target: GeoPoint,
    pub arrival_radius_m: Option<f64>,
    /// Fixed pickups `(id, lng, lat)`; ignored when `scatter` is set.
    pub badges: &'static [(&'static str, f64, f64)],
    pub scatter: bool,
    pub route: &'static [(f64, f64)],
    pub feedback: Question,
    pub scoring: Scoring,
}

impl MissionSpec {
    pub fn fixed_badges(&self) -> Option<Vec<MysteryPoint>> {
        if self.badges.is_empty() {
            return None;
        }
        Some(
            self.badges
                .iter()
                .map(|(id, lng, lat)| MysteryPoint::new(*id, GeoPoint::new(*lng, *lat)))
                .collect(),
        )
    }

    /// Pickups handed to the map: None lets the map scatter its own.
    pub fn mode_badges(&self) -> Option<Vec<MysteryPoint>> {
        if self.scatter { None } else { Some(self.fixed_badges().unwrap_or_default()) }
    }

    pub fn route(&self) -> Vec<GeoPoint> {
        self.route.iter().map(|(lng, lat)| GeoPoint::new(*lng, *lat)).collect()
    }

    pub fn score(&self, metrics: &ArrivalMetrics, arrived: bool) -> u32 {
        match self.scoring {
            Scoring::Arrival { bonus } => if arrived { bonus } else { 0 },
            Scoring::Collectibles { per_item, arrival_bonus } => {
                metrics.collected * per_item + if arrived { arrival_bonus } else { 0 }
            }
        }
    }
}

pub static MISSIONS: [MissionSpec; 2] = [
    MissionSpec {
        id: MissionId::Navigation,
        title: "Mission 1: Der Weg zum Schloss",
        story: "Ein Brief ist angekommen. Jemand bittet dich, ein Paket zum alten Schloss zu bringen. Der Nebel liegt dicht über der Stadt.",
        choice: Question {
            prompt: "Wie gehst du vor?",
            options: &["Ich folge der markierten Route.", "Ich suche mir meinen eigenen Weg.", "Ich frage erst jemanden nach dem Weg."],
        },
        briefing: "Erreiche das leuchtende Ziel. Tippe auf die Karte, um dorthin zu gehen.",
        start: GeoPoint::new(8.5500, 49.8600),
        target: GeoPoint::new(8.6560, 49.8750),
        arrival_radius_m: Some(20.0),
        badges: &[],
        scatter: false,
        route: &[(8.5500, 49.8600), (8.5800, 49.8640), (8.6100, 49.8690), (8.6350, 49.8730), (8.6560, 49.8750)],
        feedback: Question {
            prompt: "Wie leicht fiel dir die Orientierung?",
            options: &["Sehr leicht", "Eher leicht", "Teils, teils", "Eher schwer", "Sehr schwer"],
        },
        scoring: Scoring::Arrival { bonus: 500 },
    },
    MissionSpec {
        id: MissionId::Detour,
        title: "Mission 2: Geheimnisse im Nebel",
        story: "Auf dem Weg zur Mathildenhöhe sollen verborgene Schätze liegen. Niemand zwingt dich, sie zu suchen.",
        choice: Question {
            prompt: "Was ist dir wichtiger?",
            options: &["Schnell ankommen", "Möglichst viele Schätze finden", "Ich entscheide unterwegs"],
        },
        briefing: "Gehe zur Mathildenhöhe. Goldene Rauten sind Schätze, die du einsammeln kannst.",
        start: GeoPoint::new(8.6512, 49.8728),
        target: GeoPoint::new(8.6655, 49.8765),
        arrival_radius_m: None,
        badges: &[],
        scatter: true,
        route: &[],
        feedback: Question {
            prompt: "Hast du absichtlich Umwege gemacht?",
            options: &["Ja, wegen der Schätze", "Ja, aus Neugier", "Nein"],
        },
        scoring: Scoring::Collectibles { per_item: XP_PER_COLLECTIBLE, arrival_bonus: 500 },
    },
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionResult {
    pub mission: String,
    pub choice: Option<String>,
    pub rating: Option<String>,
    pub duration_ms: f64,
    pub distance_walked_m: f64,
    pub collected: u32,
    pub total_collectibles: u32,
    pub path_len: usize,
    pub gave_up: bool,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MissionPhase {
    Intro,
    Active { started_ms: f64 },
    Feedback { started_ms: f64, ended_ms: f64, metrics: ArrivalMetrics, gave_up: bool },
    Done(MissionResult),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MissionEvent {
    Choose { option: usize, now_ms: f64 },
    Arrived { metrics: ArrivalMetrics, now_ms: f64 },
    GaveUp { outcome: MissionOutcome, now_ms: f64 },
    Rate { option: usize },
}

#[derive(Clone, Debug)]
pub struct MissionMachine {
    spec: &'static MissionSpec,
    phase: MissionPhase,
    choice: Option<String>,
}

impl MissionMachine {
    pub fn new(spec: &'static MissionSpec) -> Self {
        Self { spec, phase: MissionPhase::Intro, choice: None }
    }

    pub fn phase(&self) -> &MissionPhase {
        &self.phase
    }

    pub fn result(&self) -> Option<&MissionResult> {
        match &self.phase {
            MissionPhase::Done(r) => Some(r),
            _ => None,
        }
    }

    /// Applies an event; returns false when it does not fit the phase.
    pub fn apply(&mut self, event: MissionEvent) -> bool {
        let next = match (&self.phase, event) {
            (MissionPhase::Intro, MissionEvent::Choose { option, now_ms }) => {
                let Some(text) = self.spec.choice.options.get(option) else {
                    return false;
                };
                self.choice = Some(text.to_string());
                MissionPhase::Active { started_ms: now_ms }
            }
            (MissionPhase::Active { started_ms }, MissionEvent::Arrived { metrics, now_ms }) => {
                MissionPhase::Feedback { started_ms: *started_ms, ended_ms: now_ms, metrics, gave_up: false }
            }
            (MissionPhase::Active { started_ms }, MissionEvent::GaveUp { outcome, now_ms }) => MissionPhase::Feedback {
                started_ms: *started_ms,
                ended_ms: now_ms,
                metrics: outcome.metrics,
                gave_up: true,
            },
            (MissionPhase::Feedback { started_ms, ended_ms, metrics, gave_up }, MissionEvent::Rate { option }) => {
                let Some(rating) = self.spec.feedback.options.get(option) else {
                    return false;
                };
                MissionPhase::Done(MissionResult {
                    mission: self.spec.id.as_str().to_string(),
                    choice: self.choice.clone(),
                    rating: Some(rating.to_string()),
                    duration_ms: (ended_ms - started_ms).max(0.0),
                    distance_walked_m: metrics.distance_walked_m,
                    collected: metrics.collected,
                    total_collectibles: metrics.total_mystery,
                    path_len: metrics.path.len(),
                    gave_up: *gave_up,
                    score: self.spec.score(metrics, !*gave_up),
                })
            }
            _ => return false,
        };
        log::debug!("mission {}: {}", self.spec.id.as_str(), phase_name(&next));
        self.phase = next;
        true
    }
}

impl Reducible for MissionMachine {
    type Action = MissionEvent;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        if next.apply(action) { Rc::new(next) } else { self }
    }
}

fn phase_name(phase: &MissionPhase) -> &'static str {
    match phase {
        MissionPhase::Intro => "intro",
        MissionPhase::Active { .. } => "active",
        MissionPhase::Feedback { .. } => "feedback",
        MissionPhase::Done(_) => "done",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(collected: u32) -> ArrivalMetrics {
        ArrivalMetrics {
            distance_walked_m: 1234.0,
            collected,
            total_mystery: 6,
            path: vec![GeoPoint::new(8.65, 49.87); 3],
        }
    }

    #[test]
    fn full_navigation_run() {
        let mut m = MissionMachine::new(&MISSIONS[0]);
        assert!(m.apply(MissionEvent::Choose { option: 1, now_ms: 1000.0 }));
        assert!(matches!(m.phase(), MissionPhase::Active { .. }));
        assert!(m.apply(MissionEvent::Arrived { metrics: metrics(0), now_ms: 31_000.0 }));
        assert!(m.apply(MissionEvent::Rate { option: 0 }));
        let r = m.result().expect("done");
        assert_eq!(r.mission, "navigation");
        assert_eq!(r.choice.as_deref(), Some("Ich suche mir meinen eigenen Weg."));
        assert_eq!(r.rating.as_deref(), Some("Sehr leicht"));
        assert_eq!(r.duration_ms, 30_000.0);
        assert_eq!(r.path_len, 3);
        assert_eq!(r.score, 500);
        assert!(!r.gave_up);
    }

    #[test]
    fn repeated_arrival_is_ignored() {
        let mut m = MissionMachine::new(&MISSIONS[0]);
        m.apply(MissionEvent::Choose { option: 0, now_ms: 0.0 });
        assert!(m.apply(MissionEvent::Arrived { metrics: metrics(0), now_ms: 10.0 }));
        assert!(!m.apply(MissionEvent::Arrived { metrics: metrics(0), now_ms: 20.0 }));
        match m.phase() {
            MissionPhase::Feedback { ended_ms, .. } => assert_eq!(*ended_ms, 10.0),
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn arrival_before_start_is_ignored() {
        let mut m = MissionMachine::new(&MISSIONS[1]);
        assert!(!m.apply(MissionEvent::Arrived { metrics: metrics(0), now_ms: 0.0 }));
        assert_eq!(m.phase(), &MissionPhase::Intro);
    }

    #[test]
    fn ignored_event_keeps_the_same_state() {
        let m = Rc::new(MissionMachine::new(&MISSIONS[0]));
        let next = m.clone().reduce(MissionEvent::Rate { option: 0 });
        assert!(Rc::ptr_eq(&m, &next));
        let next = next.reduce(MissionEvent::Choose { option: 0, now_ms: 0.0 });
        assert!(matches!(next.phase(), MissionPhase::Active { .. }));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut m = MissionMachine::new(&MISSIONS[0]);
        assert!(!m.apply(MissionEvent::Choose { option: 99, now_ms: 0.0 }));
    }

    #[test]
    fn giving_up_scores_collectibles_only() {
        let mut m = MissionMachine::new(&MISSIONS[1]);
        m.apply(MissionEvent::Choose { option: 1, now_ms: 0.0 });
        let outcome = MissionOutcome { mission: MissionId::Detour, gave_up: true, metrics: metrics(2) };
        assert!(m.apply(MissionEvent::GaveUp { outcome, now_ms: 5_000.0 }));
        m.apply(MissionEvent::Rate { option: 2 });
        let r = m.result().expect("done");
        assert!(r.gave_up);
        assert_eq!(r.collected, 2);
        assert_eq!(r.total_collectibles, 6);
        assert_eq!(r.score, 200);
    }

    #[test]
    fn detour_scatters_and_navigation_has_route() {
        assert!(MISSIONS[1].mode_badges().is_none());
        assert_eq!(MISSIONS[0].mode_badges(), Some(Vec::new()));
        let route = MISSIONS[0].route();
        assert_eq!(route.first(), Some(&MISSIONS[0].start));
        assert_eq!(route.last(), Some(&MISSIONS[0].target));
    }
}
