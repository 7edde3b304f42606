//! Study session flow: which screen is up, what the participant answered,
//! and the JSON export assembled at the end.

use std::collections::BTreeMap;
use std::rc::Rc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

use crate::calibration::CalibrationResult;
use crate::error::ValidationError;
use crate::geo::GeoPoint;
use crate::missions::{MISSIONS, MissionResult};

pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 16..=99;
pub const CONFIDENCE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

pub const GAMING_FREQUENCIES: [&str; 5] = ["Nie", "Selten", "Monatlich", "Wöchentlich", "Täglich"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Story,
    Profiling,
    Calibration,
    Mission(usize),
    Experiment,
}

impl Screen {
    pub fn next(self) -> Screen {
        match self {
            Screen::Story => Screen::Profiling,
            Screen::Profiling => Screen::Calibration,
            Screen::Calibration if MISSIONS.is_empty() => Screen::Experiment,
            Screen::Calibration => Screen::Mission(0),
            Screen::Mission(i) if i + 1 < MISSIONS.len() => Screen::Mission(i + 1),
            Screen::Mission(_) | Screen::Experiment => Screen::Experiment,
        }
    }
}

/// Raw form input; every field is optional until validated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileForm {
    pub gaming_frequency: Option<String>,
    pub age: Option<u8>,
    pub navigation_confidence: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnswers {
    pub gaming_frequency: String,
    pub age: u8,
    pub navigation_confidence: u8,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileAnswers, ValidationError> {
        let gaming_frequency = self
            .gaming_frequency
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingGamingFrequency)?;
        let age = self.age.ok_or(ValidationError::MissingAge)?;
        if !AGE_RANGE.contains(&age) {
            return Err(ValidationError::AgeOutOfRange { min: *AGE_RANGE.start(), max: *AGE_RANGE.end() });
        }
        if !CONFIDENCE_RANGE.contains(&self.navigation_confidence) {
            return Err(ValidationError::ConfidenceOutOfRange);
        }
        Ok(ProfileAnswers {
            gaming_frequency: gaming_frequency.to_string(),
            age,
            navigation_confidence: self.navigation_confidence,
        })
    }
}

pub fn participant_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("P-{:06X}", rng.gen_range(0..=0xFF_FFFFu32))
}

pub fn export_file_name(participant_id: &str) -> String {
    format!("fog_session_{participant_id}.json")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub participant_id: String,
    pub exported_at: String,
    pub profile: Option<ProfileAnswers>,
    pub calibration: Option<CalibrationResult>,
    pub missions: BTreeMap<String, MissionResult>,
    pub visited_points: Vec<GeoPoint>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub participant_id: String,
    pub screen: Screen,
    pub profile: Option<ProfileAnswers>,
    pub calibration: Option<CalibrationResult>,
    pub missions: BTreeMap<String, MissionResult>,
}

pub enum SessionAction {
    Advance,
    ProfileSubmitted(ProfileAnswers),
    CalibrationDone(CalibrationResult),
    MissionFinished(MissionResult),
}

impl SessionState {
    pub fn new(participant_id: String) -> Self {
        Self {
            participant_id,
            screen: Screen::Story,
            profile: None,
            calibration: None,
            missions: BTreeMap::new(),
        }
    }

    /// Snapshot for download; `exported_at` comes from the caller's clock.
    pub fn export(&self, exported_at: String, visited_points: Vec<GeoPoint>) -> SessionExport {
        SessionExport {
            participant_id: self.participant_id.clone(),
            exported_at,
            profile: self.profile.clone(),
            calibration: self.calibration.clone(),
            missions: self.missions.clone(),
            visited_points,
        }
    }
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            SessionAction::Advance => {}
            SessionAction::ProfileSubmitted(answers) => next.profile = Some(answers),
            SessionAction::CalibrationDone(result) => next.calibration = Some(result),
            SessionAction::MissionFinished(result) => {
                next.missions.insert(result.mission.clone(), result);
            }
        }
        next.screen = self.screen.next();
        log::info!("session {}: {:?} -> {:?}", next.participant_id, self.screen, next.screen);
        Rc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn valid_form() -> ProfileForm {
        ProfileForm { gaming_frequency: Some("Wöchentlich".into()), age: Some(28), navigation_confidence: 3 }
    }

    #[test]
    fn unset_gaming_frequency_is_rejected() {
        let form = ProfileForm { gaming_frequency: None, ..valid_form() };
        assert_eq!(form.validate(), Err(ValidationError::MissingGamingFrequency));
        let blank = ProfileForm { gaming_frequency: Some("  ".into()), ..valid_form() };
        assert_eq!(blank.validate(), Err(ValidationError::MissingGamingFrequency));
    }

    #[test]
    fn age_bounds() {
        assert_eq!(ProfileForm { age: None, ..valid_form() }.validate(), Err(ValidationError::MissingAge));
        assert!(matches!(
            ProfileForm { age: Some(15), ..valid_form() }.validate(),
            Err(ValidationError::AgeOutOfRange { min: 16, max: 99 })
        ));
        assert!(ProfileForm { age: Some(16), ..valid_form() }.validate().is_ok());
        assert!(ProfileForm { age: Some(100), ..valid_form() }.validate().is_err());
    }

    #[test]
    fn confidence_must_be_on_scale() {
        let form = ProfileForm { navigation_confidence: 0, ..valid_form() };
        assert_eq!(form.validate(), Err(ValidationError::ConfidenceOutOfRange));
    }

    #[test]
    fn participant_ids_are_six_hex_digits() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let id = participant_id(&mut rng);
            assert!(id.starts_with("P-"));
            assert_eq!(id.len(), 8);
            assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(export_file_name("P-00AB12"), "fog_session_P-00AB12.json");
    }

    #[test]
    fn flow_visits_every_screen_in_order() {
        let mut screen = Screen::Story;
        let mut seen = vec![screen];
        while screen != Screen::Experiment {
            screen = screen.next();
            seen.push(screen);
        }
        assert_eq!(seen[..3], [Screen::Story, Screen::Profiling, Screen::Calibration]);
        assert_eq!(seen.len(), 3 + MISSIONS.len() + 1);
        assert_eq!(Screen::Experiment.next(), Screen::Experiment);
    }

    #[test]
    fn mission_results_are_keyed_by_name() {
        let result = |mission: &str, score| MissionResult {
            mission: mission.into(),
            choice: None,
            rating: None,
            duration_ms: 0.0,
            distance_walked_m: 0.0,
            collected: 0,
            total_collectibles: 0,
            path_len: 0,
            gave_up: false,
            score,
        };
        let state = Rc::new(SessionState { screen: Screen::Mission(0), ..SessionState::new("P-000001".into()) });
        let state = state.reduce(SessionAction::MissionFinished(result("navigation", 1)));
        assert_eq!(state.screen, Screen::Mission(1));
        let state = state.reduce(SessionAction::MissionFinished(result("navigation", 2)));
        assert_eq!(state.missions.len(), 1);
        assert_eq!(state.missions["navigation"].score, 2);

        let export = state.export("2026-01-01T00:00:00Z".into(), vec![GeoPoint::new(8.6, 49.8)]);
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["participant_id"], "P-000001");
        assert_eq!(json["missions"]["navigation"]["score"], 2);
        assert!(json["profile"].is_null());
    }
}
