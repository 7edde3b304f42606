use yew::prelude::*;

use super::{
    calibration_screen::CalibrationScreen, experiment_screen::ExperimentScreen, mission_screen::MissionScreen,
    profiling_screen::ProfilingScreen, story_screen::StoryScreen,
};
use crate::calibration::CalibrationResult;
use crate::missions::{MISSIONS, MissionResult};
use crate::session::{ProfileAnswers, Screen, SessionAction, SessionState, participant_id};
use crate::storage::{open_store, resume_or_create};

/// Same id across reloads so the saved path is found again.
fn current_participant() -> String {
    let mut rng = rand::thread_rng();
    match resume_or_create(&*open_store(), &mut rng) {
        Ok(record) => record.user_id,
        Err(e) => {
            log::warn!("participant lookup failed: {e}");
            participant_id(&mut rng)
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_reducer(|| SessionState::new(current_participant()));
    let is_virtual = use_state(|| true);

    let advance = {
        let session = session.clone();
        Callback::from(move |_| session.dispatch(SessionAction::Advance))
    };
    let toggle_virtual = {
        let is_virtual = is_virtual.clone();
        Callback::from(move |_| is_virtual.set(!*is_virtual))
    };
    let on_profile = {
        let session = session.clone();
        Callback::from(move |answers: ProfileAnswers| session.dispatch(SessionAction::ProfileSubmitted(answers)))
    };
    let on_calibrated = {
        let session = session.clone();
        Callback::from(move |result: CalibrationResult| session.dispatch(SessionAction::CalibrationDone(result)))
    };
    let on_mission = {
        let session = session.clone();
        Callback::from(move |result: MissionResult| session.dispatch(SessionAction::MissionFinished(result)))
    };

    let user_id = AttrValue::from(session.participant_id.clone());
    let content = match session.screen {
        Screen::Story => html! {
            <StoryScreen is_virtual={*is_virtual} on_toggle_virtual={toggle_virtual} on_continue={advance} />
        },
        Screen::Profiling => html! { <ProfilingScreen on_submit={on_profile} /> },
        Screen::Calibration => html! { <CalibrationScreen on_done={on_calibrated} /> },
        Screen::Mission(index) => html! {
            <MissionScreen
                key={MISSIONS.get(index).map_or("mission", |m| m.id.as_str())}
                index={index}
                user_id={user_id}
                is_virtual={*is_virtual}
                on_finished={on_mission}
            />
        },
        Screen::Experiment => html! {
            <ExperimentScreen session={(*session).clone()} is_virtual={*is_virtual} />
        },
    };

    html! { <div id="root" style="position:relative; width:100vw; height:100vh;">{ content }</div> }
}
