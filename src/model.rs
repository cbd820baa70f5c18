//! Settings model for the visualizer.
//!
//! A flat set of named booleans read every frame by the evaluate/render pass
//! and written only by the settings UI. Persisted to localStorage as a single
//! JSON blob so toggles survive reloads.

use serde::{Deserialize, Serialize};

use crate::util::{load_item, store_item};

const SETTINGS_KEY: &str = "gt_settings";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Draw a disc per cell instead of filling the whole cell.
    pub use_circles: bool,
    /// Reinterpret the raw result as a packed 24-bit color.
    pub color_mode: bool,
    /// Increasing Y goes up on screen. Ignored while `emulator` is on.
    pub cartesian: bool,
    /// Overlay grid lines and per-cell labels.
    pub grid: bool,
    /// Grid labels show each cell's raw result instead of its coordinates.
    pub grid_values: bool,
    /// Pin the visible domain to the fixed 16x16 window.
    pub emulator: bool,
    pub smooth_zoom: bool,
    pub smooth_pan: bool,
    pub show_fps: bool,
    /// Clamp results to [-1, 1] before they reach shape intensity.
    pub clamp_results: bool,
    /// Stroke every cell rect, for inspecting cell boundaries.
    pub debug_outline: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_circles: true,
            color_mode: false,
            cartesian: true,
            grid: false,
            grid_values: false,
            emulator: false,
            smooth_zoom: true,
            smooth_pan: true,
            show_fps: false,
            clamp_results: true,
            debug_outline: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    UseCircles,
    ColorMode,
    Cartesian,
    Grid,
    GridValues,
    Emulator,
    SmoothZoom,
    SmoothPan,
    ShowFps,
    ClampResults,
    DebugOutline,
}

impl SettingKey {
    pub const ALL: [SettingKey; 11] = [
        SettingKey::UseCircles,
        SettingKey::ColorMode,
        SettingKey::Cartesian,
        SettingKey::Grid,
        SettingKey::GridValues,
        SettingKey::Emulator,
        SettingKey::SmoothZoom,
        SettingKey::SmoothPan,
        SettingKey::ShowFps,
        SettingKey::ClampResults,
        SettingKey::DebugOutline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingKey::UseCircles => "Circles",
            SettingKey::ColorMode => "Color Mode",
            SettingKey::Cartesian => "Cartesian Y",
            SettingKey::Grid => "Grid Overlay",
            SettingKey::GridValues => "Grid Shows Values",
            SettingKey::Emulator => "16x16 Emulator",
            SettingKey::SmoothZoom => "Smooth Zoom",
            SettingKey::SmoothPan => "Smooth Pan",
            SettingKey::ShowFps => "FPS Counter",
            SettingKey::ClampResults => "Clamp Results",
            SettingKey::DebugOutline => "Debug Outline",
        }
    }
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::UseCircles => self.use_circles,
            SettingKey::ColorMode => self.color_mode,
            SettingKey::Cartesian => self.cartesian,
            SettingKey::Grid => self.grid,
            SettingKey::GridValues => self.grid_values,
            SettingKey::Emulator => self.emulator,
            SettingKey::SmoothZoom => self.smooth_zoom,
            SettingKey::SmoothPan => self.smooth_pan,
            SettingKey::ShowFps => self.show_fps,
            SettingKey::ClampResults => self.clamp_results,
            SettingKey::DebugOutline => self.debug_outline,
        }
    }

    pub fn toggle(&mut self, key: SettingKey) {
        let flipped = !self.get(key);
        match key {
            SettingKey::UseCircles => self.use_circles = flipped,
            SettingKey::ColorMode => self.color_mode = flipped,
            SettingKey::Cartesian => self.cartesian = flipped,
            SettingKey::Grid => self.grid = flipped,
            SettingKey::GridValues => self.grid_values = flipped,
            SettingKey::Emulator => self.emulator = flipped,
            SettingKey::SmoothZoom => self.smooth_zoom = flipped,
            SettingKey::SmoothPan => self.smooth_pan = flipped,
            SettingKey::ShowFps => self.show_fps = flipped,
            SettingKey::ClampResults => self.clamp_results = flipped,
            SettingKey::DebugOutline => self.debug_outline = flipped,
        }
    }

    pub fn load() -> Self {
        load_item(SETTINGS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn persist(&self) {
        if let Ok(raw) = serde_json::to_string(self) {
            store_item(SETTINGS_KEY, &raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.use_circles);
        assert!(s.cartesian);
        assert!(s.smooth_zoom);
        assert!(s.smooth_pan);
        assert!(s.clamp_results);
        assert!(!s.color_mode);
        assert!(!s.emulator);
        assert!(!s.grid);
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut s = Settings::default();
        for key in SettingKey::ALL {
            let before = s.get(key);
            s.toggle(key);
            assert_eq!(s.get(key), !before);
            s.toggle(key);
            assert_eq!(s.get(key), before);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mut s = Settings::default();
        s.toggle(SettingKey::Emulator);
        s.toggle(SettingKey::ShowFps);
        let raw = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_partial_json_tolerated() {
        // Older persisted blobs may miss newer fields.
        let back: Settings = serde_json::from_str(r#"{"emulator":true}"#).unwrap();
        assert!(back.emulator);
        assert!(back.use_circles);
    }
}
