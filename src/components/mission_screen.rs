use yew::prelude::*;

use super::fog_map::FogMap;
use crate::missions::{MISSIONS, MissionEvent, MissionMachine, MissionPhase, MissionResult, Question};
use crate::model::{ArrivalMetrics, MissionMode, MissionOutcome, MysteryPoint};
use crate::util::{format_distance, format_duration, now_ms};

#[derive(Properties, PartialEq, Clone)]
pub struct MissionScreenProps {
    pub index: usize,
    pub user_id: AttrValue,
    pub is_virtual: bool,
    pub on_finished: Callback<MissionResult>,
}

const CARD: &str = "position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.87); border:2px solid #30363d; padding:24px 32px; border-radius:14px; max-width:520px; width:90%; font-size:14px; line-height:1.4;";

fn question_buttons(question: &Question, on_pick: &Callback<usize>) -> Html {
    html! {
        <div style="display:flex; flex-direction:column; gap:8px; margin-top:12px;">
            <div style="font-weight:600;">{ question.prompt }</div>
            { for question.options.iter().enumerate().map(|(i, option)| {
                let on_pick = on_pick.clone();
                html! { <button onclick={Callback::from(move |_| on_pick.emit(i))}>{ *option }</button> }
            }) }
        </div>
    }
}

#[function_component(MissionScreen)]
pub fn mission_screen(props: &MissionScreenProps) -> Html {
    let spec = MISSIONS.get(props.index).unwrap_or(&MISSIONS[0]);
    let machine = use_reducer(|| MissionMachine::new(spec));
    let found = use_state(|| None::<MysteryPoint>);

    // Done is terminal; hand the result upward once.
    {
        let on_finished = props.on_finished.clone();
        let result = machine.result().cloned();
        use_effect_with(result, move |result| {
            if let Some(result) = result {
                on_finished.emit(result.clone());
            }
            || ()
        });
    }

    let content = match machine.phase() {
        MissionPhase::Intro => {
            let on_pick = {
                let machine = machine.clone();
                Callback::from(move |option: usize| {
                    machine.dispatch(MissionEvent::Choose { option, now_ms: now_ms() })
                })
            };
            html! {
                <div style={CARD}>
                    <h2 style="margin:0 0 12px 0; font-size:22px; color:#58a6ff;">{ spec.title }</h2>
                    <p style="margin:0 0 8px 0;">{ spec.story }</p>
                    { question_buttons(&spec.choice, &on_pick) }
                </div>
            }
        }
        MissionPhase::Active { .. } => {
            let mode = MissionMode {
                active: true,
                is_virtual: props.is_virtual,
                start_position: Some(spec.start),
                target: Some(spec.target),
                mission_id: spec.id,
                arrival_radius: spec.arrival_radius_m,
                badges: spec.mode_badges(),
                route: spec.route(),
                on_arrival: {
                    let machine = machine.clone();
                    Callback::from(move |metrics: ArrivalMetrics| {
                        machine.dispatch(MissionEvent::Arrived { metrics, now_ms: now_ms() })
                    })
                },
                on_distance_update: Callback::from(|d: f64| log::trace!("distance to target {d:.0} m")),
                on_outcome: {
                    let machine = machine.clone();
                    Callback::from(move |outcome: MissionOutcome| {
                        machine.dispatch(MissionEvent::GaveUp { outcome, now_ms: now_ms() })
                    })
                },
                on_collectible_found: {
                    let found = found.clone();
                    Callback::from(move |point: MysteryPoint| found.set(Some(point)))
                },
            };
            let close_popup = {
                let found = found.clone();
                Callback::from(move |_| found.set(None))
            };
            html! {
                <>
                    <FogMap user_id={props.user_id.clone()} mission={Some(mode)} />
                    <div style="position:absolute; top:64px; left:50%; transform:translateX(-50%); background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:6px 12px; font-size:13px; max-width:80%; text-align:center; pointer-events:none;">
                        { spec.briefing }
                    </div>
                    {
                        if let Some(point) = &*found {
                            html! {
                                <div style="position:absolute; bottom:72px; left:50%; transform:translateX(-50%); background:#161b22; border:2px solid #d4af37; border-radius:12px; padding:14px 20px; display:flex; gap:12px; align-items:center;">
                                    <span style="font-size:24px;">{"💎"}</span>
                                    <span>{ format!("Schatz gefunden! ({})", point.id) }</span>
                                    <button onclick={close_popup}>{"OK"}</button>
                                </div>
                            }
                        } else {
                            html! {}
                        }
                    }
                </>
            }
        }
        MissionPhase::Feedback { started_ms, ended_ms, metrics, gave_up } => {
            let on_pick = {
                let machine = machine.clone();
                Callback::from(move |option: usize| machine.dispatch(MissionEvent::Rate { option }))
            };
            let headline = if *gave_up { "Mission abgebrochen" } else { "Ziel erreicht!" };
            html! {
                <div style={CARD}>
                    <h2 style="margin:0 0 12px 0; font-size:22px; color:#58a6ff;">{ headline }</h2>
                    <p style="margin:4px 0;">{ format!("Zeit: {}", format_duration(ended_ms - started_ms)) }</p>
                    <p style="margin:4px 0;">{ format!("Strecke: {}", format_distance(metrics.distance_walked_m)) }</p>
                    {
                        if metrics.total_mystery > 0 {
                            html! { <p style="margin:4px 0;">{ format!("Schätze: {} von {}", metrics.collected, metrics.total_mystery) }</p> }
                        } else {
                            html! {}
                        }
                    }
                    { question_buttons(&spec.feedback, &on_pick) }
                </div>
            }
        }
        MissionPhase::Done(_) => html! {
            <div style={CARD}>{"Speichere Ergebnis …"}</div>
        },
    };

    html! { <div style="position:absolute; inset:0;">{ content }</div> }
}
