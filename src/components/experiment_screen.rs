use std::rc::Rc;

use yew::prelude::*;

use super::fog_map::FogMap;
use crate::export::download_session;
use crate::geo::GeoPoint;
use crate::model::{MissionId, MissionMode};
use crate::session::SessionState;
use crate::util::iso_timestamp;

#[derive(Properties, PartialEq, Clone)]
pub struct ExperimentScreenProps {
    pub session: SessionState,
    pub is_virtual: bool,
}

/// Free roam after the missions, plus the data export.
#[function_component(ExperimentScreen)]
pub fn experiment_screen(props: &ExperimentScreenProps) -> Html {
    let visited = use_mut_ref(|| Rc::new(Vec::<GeoPoint>::new()));
    let export_status = use_state(|| None::<Result<(), String>>);

    let mode = MissionMode {
        active: false,
        is_virtual: props.is_virtual,
        start_position: None,
        target: None,
        mission_id: MissionId::FreeRoam,
        arrival_radius: None,
        badges: None,
        route: Vec::new(),
        on_arrival: Callback::from(|_| ()),
        on_distance_update: Callback::from(|_| ()),
        on_outcome: Callback::from(|_| ()),
        on_collectible_found: Callback::from(|_| ()),
    };
    let on_path_change = {
        let visited = visited.clone();
        Callback::from(move |snapshot: Rc<Vec<GeoPoint>>| *visited.borrow_mut() = snapshot)
    };
    let on_export = {
        let session = props.session.clone();
        let visited = visited.clone();
        let export_status = export_status.clone();
        Callback::from(move |_| {
            let points = visited.borrow().to_vec();
            let export = session.export(iso_timestamp(), points);
            match download_session(&export) {
                Ok(()) => export_status.set(Some(Ok(()))),
                Err(e) => {
                    log::error!("{e}");
                    export_status.set(Some(Err(e.to_string())));
                }
            }
        })
    };

    html! {
        <>
            <FogMap
                user_id={AttrValue::from(props.session.participant_id.clone())}
                mission={Some(mode)}
                on_path_change={on_path_change}
            />
            <div style="position:absolute; top:12px; right:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px; min-width:200px; display:flex; flex-direction:column; gap:6px;">
                <div style="font-weight:600;">{"Freies Erkunden"}</div>
                <div style="font-size:11px; opacity:0.7;">{ format!("Teilnehmer {}", props.session.participant_id) }</div>
                <div style="font-size:11px; opacity:0.7;">{ format!("{} Missionen abgeschlossen", props.session.missions.len()) }</div>
                <button onclick={on_export}>{"Daten exportieren"}</button>
                {
                    match &*export_status {
                        Some(Ok(())) => html! { <div style="font-size:11px; color:#3fb950;">{"Export gestartet."}</div> },
                        Some(Err(msg)) => html! { <div style="font-size:11px; color:#f85149;">{ format!("Export fehlgeschlagen: {msg}") }</div> },
                        None => html! {},
                    }
                }
            </div>
        </>
    }
}
