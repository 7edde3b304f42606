use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct StoryScreenProps {
    pub is_virtual: bool,
    pub on_toggle_virtual: Callback<()>,
    pub on_continue: Callback<()>,
}

#[function_component(StoryScreen)]
pub fn story_screen(props: &StoryScreenProps) -> Html {
    let continue_cb = {
        let cb = props.on_continue.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let toggle_cb = {
        let cb = props.on_toggle_virtual.clone();
        Callback::from(move |_| cb.emit(()))
    };
    html! {
        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.87); border:2px solid #30363d; padding:28px 36px; border-radius:14px; max-width:520px; width:90%; box-shadow:0 0 0 1px #1a1f24, 0 6px 18px rgba(0,0,0,0.6); font-size:14px; line-height:1.4;">
            <h2 style="margin:0 0 12px 0; font-size:22px; color:#58a6ff; text-align:center;">{"Im Nebel"}</h2>
            <p style="margin:4px 0 10px 0; text-align:center; opacity:0.85;">{"Über der Stadt liegt ein dichter Nebel. Nur wo du gewesen bist, lichtet er sich."}</p>
            <ul style="margin:0 0 12px 18px; padding:0; list-style:disc; display:flex; flex-direction:column; gap:4px;">
                <li>{"Zuerst beantwortest du ein paar kurze Fragen."}</li>
                <li>{"Danach folgt ein kurzer Reaktionstest."}</li>
                <li>{"Anschließend erwarten dich zwei Missionen auf der Karte."}</li>
                <li>{"Zum Schluss kannst du frei erkunden und deine Daten exportieren."}</li>
            </ul>
            <label style="display:flex; align-items:center; gap:8px; justify-content:center; cursor:pointer; margin:8px 0;">
                <input type="checkbox" checked={props.is_virtual} onclick={toggle_cb} />
                <span>{"Simulationsmodus (Tippen statt Gehen)"}</span>
            </label>
            <div style="display:flex; gap:12px; justify-content:center; margin-top:8px;">
                <button onclick={continue_cb}>{"Los geht's"}</button>
            </div>
            <div style="margin-top:12px; font-size:11px; opacity:0.6; text-align:center;">{"Ohne Simulationsmodus wird dein Gerätestandort verwendet."}</div>
        </div>
    }
}
