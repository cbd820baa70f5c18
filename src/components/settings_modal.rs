use yew::prelude::*;

use crate::model::{SettingKey, Settings};

#[derive(Properties, PartialEq, Clone)]
pub struct SettingsModalProps {
    pub show: bool,
    pub settings: Settings,
    /// Cartesian orientation has no effect while the emulator window is on.
    pub cartesian_locked: bool,
    pub on_toggle: Callback<SettingKey>,
    pub on_close: Callback<()>,
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

    let rows: Html = SettingKey::ALL
        .iter()
        .map(|&key| {
            let toggle_cb = props.on_toggle.reform(move |_: MouseEvent| key);
            let disabled = key == SettingKey::Cartesian && props.cartesian_locked;
            html! {
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input
                        type="checkbox"
                        checked={props.settings.get(key)}
                        disabled={disabled}
                        onclick={toggle_cb}
                    />
                    <span style={if disabled { "opacity:0.5;" } else { "" }}>{ key.label() }</span>
                </label>
            }
        })
        .collect();

    html! {<div style="position:absolute; inset:0; display:flex; align-items:center; justify-content:center; background:rgba(0,0,0,0.55); z-index:50;">
        <div style="background:#161b22; border:1px solid #30363d; border-radius:12px; padding:16px 20px; min-width:340px; max-width:480px; display:flex; flex-direction:column; gap:14px;">
            <div style="display:flex; justify-content:space-between; align-items:center;">
                <h3 style="margin:0; font-size:18px;">{"Settings"}</h3>
                <button onclick={close_cb.clone()} style="padding:4px 8px;">{"Close"}</button>
            </div>
            <div style="display:flex; flex-direction:column; gap:10px;">
                { rows }
            </div>
            <div style="font-size:11px; line-height:1.4; opacity:0.7;">{"Toggling the emulator re-frames the view to the fixed 16x16 window."}</div>
        </div>
    </div>}
}
