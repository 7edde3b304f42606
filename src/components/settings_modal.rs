use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct SettingsModalProps {
    pub show: bool,
    pub on_close: Callback<()>,
    pub camera_follow: bool,
    pub on_toggle_follow: Callback<()>,
    pub show_route: bool,
    pub on_toggle_route: Callback<()>,
    pub on_reset_path: Callback<()>,
}

#[function_component]
pub fn SettingsModal(props: &SettingsModalProps) -> Html {
    if !props.show {
        return html! {};
    }

    let close_cb = {
        let cb = props.on_close.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let toggle_follow_cb = {
        let cb = props.on_toggle_follow.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let toggle_route_cb = {
        let cb = props.on_toggle_route.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let reset_cb = {
        let cb = props.on_reset_path.clone();
        Callback::from(move |_| {
            let confirmed = web_sys::window()
                .map(|win| {
                    win.confirm_with_message("Der gesamte erkundete Pfad wird gelöscht. Fortfahren?")
                        .unwrap_or(false)
                })
                .unwrap_or(true);
            if confirmed {
                cb.emit(());
            }
        })
    };

    html! {<div style="position:absolute; inset:0; display:flex; align-items:center; justify-content:center; background:rgba(0,0,0,0.55); z-index:50;">
        <div style="background:#161b22; border:1px solid #30363d; border-radius:12px; padding:16px 20px; min-width:320px; max-width:440px; display:flex; flex-direction:column; gap:14px;">
            <div style="display:flex; justify-content:space-between; align-items:center;">
                <h3 style="margin:0; font-size:18px;">{"Einstellungen"}</h3>
                <button onclick={close_cb.clone()} style="padding:4px 8px;">{"Schließen"}</button>
            </div>
            <div style="display:flex; flex-direction:column; gap:10px;">
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={props.camera_follow} onclick={toggle_follow_cb} />
                    <span>{"Kamera folgt der Position"}</span>
                </label>
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={props.show_route} onclick={toggle_route_cb} />
                    <span>{"Route anzeigen"}</span>
                </label>
            </div>
            <div style="display:flex; gap:8px; flex-wrap:wrap;">
                <button onclick={reset_cb} style="background:#f85149; border:1px solid #b62324; color:#fff; flex:1;">{"Pfad zurücksetzen"}</button>
                <button onclick={close_cb} style="flex:0 0 auto;">{"Fertig"}</button>
            </div>
        </div>
    </div>}
}
