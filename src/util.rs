// Utility helpers shared across components.

use wasm_bindgen::JsValue;

pub fn clog(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// Milliseconds since page load; the time base for frame timing and `t`.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

pub fn load_item(key: &str) -> Option<String> {
    let win = web_sys::window()?;
    let store = win.local_storage().ok().flatten()?;
    store.get_item(key).ok().flatten()
}

pub fn store_item(key: &str, value: &str) {
    if let Some(win) = web_sys::window() {
        if let Ok(Some(store)) = win.local_storage() {
            let _ = store.set_item(key, value);
        }
    }
}
