use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::error::ValidationError;
use crate::session::{CONFIDENCE_RANGE, GAMING_FREQUENCIES, ProfileAnswers, ProfileForm};

#[derive(Properties, PartialEq, Clone)]
pub struct ProfilingScreenProps {
    pub on_submit: Callback<ProfileAnswers>,
}

#[function_component(ProfilingScreen)]
pub fn profiling_screen(props: &ProfilingScreenProps) -> Html {
    let form = use_state(ProfileForm::default);
    let error = use_state(|| None::<ValidationError>);

    let on_frequency = {
        let form = form.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            let gaming_frequency = (!value.is_empty()).then_some(value);
            form.set(ProfileForm { gaming_frequency, ..(*form).clone() });
        })
    };
    let on_age = {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            form.set(ProfileForm { age: value.trim().parse().ok(), ..(*form).clone() });
        })
    };
    let on_confidence = |level: u8| {
        let form = form.clone();
        Callback::from(move |_: MouseEvent| {
            form.set(ProfileForm { navigation_confidence: level, ..(*form).clone() });
        })
    };
    let on_submit = {
        let form = form.clone();
        let error = error.clone();
        let cb = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            match form.validate() {
                Ok(answers) => {
                    error.set(None);
                    cb.emit(answers);
                }
                Err(e) => {
                    log::info!("profile form rejected: {e:?}");
                    error.set(Some(e));
                }
            }
        })
    };

    let field = "display:flex; flex-direction:column; gap:6px;";
    html! {
        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:#161b22; border:1px solid #30363d; border-radius:12px; padding:20px 24px; width:90%; max-width:440px;">
            <h3 style="margin:0 0 14px 0; font-size:18px;">{"Ein paar Fragen vorab"}</h3>
            <form onsubmit={on_submit} style="display:flex; flex-direction:column; gap:14px;">
                <label style={field}>
                    <span>{"Wie oft spielst du Videospiele?"}</span>
                    <select onchange={on_frequency}>
                        <option value="" selected={form.gaming_frequency.is_none()}>{"Bitte wählen"}</option>
                        { for GAMING_FREQUENCIES.iter().map(|f| html! {
                            <option value={*f} selected={form.gaming_frequency.as_deref() == Some(*f)}>{ *f }</option>
                        }) }
                    </select>
                </label>
                <label style={field}>
                    <span>{"Alter"}</span>
                    <input type="number" min="16" max="99" oninput={on_age} />
                </label>
                <div style={field}>
                    <span>{"Wie sicher orientierst du dich in fremden Städten?"}</span>
                    <div style="display:flex; gap:6px;">
                        { for CONFIDENCE_RANGE.map(|level| {
                            let selected = form.navigation_confidence == level;
                            let style = if selected { "background:#1f6feb; border-color:#58a6ff;" } else { "" };
                            html! { <button type="button" style={style} onclick={on_confidence(level)}>{ level }</button> }
                        }) }
                    </div>
                    <span style="font-size:11px; opacity:0.6;">{"1 = sehr unsicher, 5 = sehr sicher"}</span>
                </div>
                {
                    if let Some(e) = &*error {
                        html! { <div style="color:#f85149; font-size:13px;">{ e.to_string() }</div> }
                    } else {
                        html! {}
                    }
                }
                <button type="submit">{"Weiter"}</button>
            </form>
        </div>
    }
}
