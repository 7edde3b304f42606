use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use yew::prelude::*;

use crate::calibration::{
    CalibrationResult, ClickOutcome, MAX_DELAY_MS, MIN_DELAY_MS, ReactionPhase, ReactionTest, TRIALS,
};
use crate::util::now_ms;

#[derive(Properties, PartialEq, Clone)]
pub struct CalibrationScreenProps {
    pub on_done: Callback<CalibrationResult>,
}

type PendingSignal = Rc<RefCell<Option<(i32, Closure<dyn FnMut()>)>>>;

fn cancel_signal(pending: &PendingSignal) {
    if let Some((id, _cb)) = pending.borrow_mut().take() {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }
}

#[function_component(CalibrationScreen)]
pub fn calibration_screen(props: &CalibrationScreenProps) -> Html {
    let test = use_mut_ref(ReactionTest::default);
    let pending: PendingSignal = use_mut_ref(|| None);
    let message = use_state(|| None::<&'static str>);
    let force = use_force_update();

    {
        let pending = pending.clone();
        use_effect_with((), move |_| move || cancel_signal(&pending));
    }

    let arm = {
        let test = test.clone();
        let pending = pending.clone();
        let message = message.clone();
        let force = force.clone();
        Callback::from(move |_: MouseEvent| {
            if !test.borrow_mut().arm() {
                return;
            }
            message.set(None);
            let Some(win) = web_sys::window() else {
                return;
            };
            let delay = rand::thread_rng().gen_range(MIN_DELAY_MS..=MAX_DELAY_MS);
            let show = {
                let test = test.clone();
                let force = force.clone();
                Closure::wrap(Box::new(move || {
                    test.borrow_mut().show_signal(now_ms());
                    force.force_update();
                }) as Box<dyn FnMut()>)
            };
            match win.set_timeout_with_callback_and_timeout_and_arguments_0(
                show.as_ref().unchecked_ref(),
                delay as i32,
            ) {
                Ok(id) => {
                    // previous closure is dropped here, its timer already fired
                    cancel_signal(&pending);
                    *pending.borrow_mut() = Some((id, show));
                }
                Err(e) => log::warn!("calibration timer failed: {e:?}"),
            }
            force.force_update();
        })
    };

    let react = {
        let test = test.clone();
        let pending = pending.clone();
        let message = message.clone();
        let force = force.clone();
        let on_done = props.on_done.clone();
        Callback::from(move |_: MouseEvent| {
            let outcome = test.borrow_mut().click(now_ms());
            match outcome {
                ClickOutcome::Ignored => return,
                ClickOutcome::FalseStart => {
                    cancel_signal(&pending);
                    message.set(Some("Zu früh! Warte auf das grüne Feld."));
                }
                ClickOutcome::Recorded(ms) => {
                    log::debug!("reaction {ms:.0} ms");
                    message.set(None);
                }
                ClickOutcome::Finished => {
                    let result = test.borrow().result();
                    log::info!("calibration mean {:.0} ms, {} false starts", result.mean_ms, result.false_starts);
                    on_done.emit(result);
                    return;
                }
            }
            force.force_update();
        })
    };

    let phase = test.borrow().phase();
    let completed = test.borrow().completed();
    let (color, label) = match phase {
        ReactionPhase::Ready => ("#21262d", "Bereit?"),
        ReactionPhase::Waiting => ("#b62324", "Warten …"),
        ReactionPhase::Go { .. } => ("#238636", "Jetzt klicken!"),
        ReactionPhase::Finished => ("#21262d", "Fertig"),
    };

    html! {
        <div style="position:absolute; inset:0; display:flex; flex-direction:column; align-items:center; justify-content:center; gap:16px;">
            <h3 style="margin:0;">{"Reaktionstest"}</h3>
            <p style="margin:0; opacity:0.8; max-width:420px; text-align:center;">
                {"Klicke auf \"Start\" und warte, bis das Feld grün wird. Klicke dann so schnell wie möglich darauf."}
            </p>
            <div onmousedown={react}
                style={format!("width:260px; height:160px; border-radius:12px; border:1px solid #30363d; display:flex; align-items:center; justify-content:center; font-size:20px; font-weight:600; user-select:none; cursor:pointer; background:{color};")}>
                { label }
            </div>
            <div style="font-variant-numeric:tabular-nums;">{ format!("Durchgang {} von {}", (completed + 1).min(TRIALS), TRIALS) }</div>
            {
                if let Some(msg) = *message {
                    html! { <div style="color:#f85149; font-size:13px;">{ msg }</div> }
                } else {
                    html! {}
                }
            }
            <button onclick={arm} disabled={!matches!(phase, ReactionPhase::Ready)}>{"Start"}</button>
        </div>
    }
}
