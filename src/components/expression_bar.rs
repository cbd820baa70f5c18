use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct ExpressionBarProps {
    pub source: String,
    pub on_input: Callback<String>,
    pub on_reset_camera: Callback<()>,
    pub on_fullscreen: Callback<()>,
    pub on_show_help: Callback<()>,
    pub on_open_settings: Callback<()>,
}

#[function_component(ExpressionBar)]
pub fn expression_bar(props: &ExpressionBarProps) -> Html {
    let input_cb = {
        let cb = props.on_input.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                cb.emit(input.value());
            }
        })
    };
    let reset_cb = {
        let cb = props.on_reset_camera.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let fullscreen_cb = {
        let cb = props.on_fullscreen.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let help_cb = {
        let cb = props.on_show_help.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let settings_cb = {
        let cb = props.on_open_settings.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {<div id="top-bar" style="display:flex; align-items:center; gap:8px; padding:8px 12px; background:#161b22; border-bottom:1px solid #30363d;">
        <label for="code" style="font-family:monospace; font-size:13px; opacity:0.8; white-space:nowrap;">
            {"f(t, i, x, y, mx, my, c) ="}
        </label>
        <input
            id="code"
            type="text"
            value={props.source.clone()}
            oninput={input_cb}
            spellcheck="false"
            autocomplete="off"
            style="flex:1; font-family:monospace; font-size:14px; padding:4px 8px; background:#0d1117; color:#eee; border:1px solid #30363d; border-radius:6px;"
        />
        <button onclick={reset_cb}>{"Reset View"}</button>
        <button onclick={fullscreen_cb}>{"Fullscreen"}</button>
        <button onclick={settings_cb}>{"Settings"}</button>
        <button onclick={help_cb}>{"Help"}</button>
    </div>}
}
