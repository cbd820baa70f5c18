// Camera state for the pannable, zoomable view over function space.
//
// `x`/`y` are the function-space coordinates at the viewport's top-left
// corner; `scale` is screen pixels per function-space unit. Pointer input
// moves only the pan target; `update` eases the live position toward it.

pub const MIN_SCALE: f64 = 10.0;
pub const MAX_SCALE: f64 = 1000.0;

/// Per-tick easing factor for smooth pan.
const PAN_LERP: f64 = 0.2;
/// Per-tick geometric decay for the wheel-driven zoom velocity.
const ZOOM_DECAY: f64 = 0.8;
/// Divisor turning accumulated wheel delta into a zoom factor.
const VELOCITY_TO_FACTOR: f64 = -4000.0;

/// Rows visible after a reset, fixed window: 16 cells plus a half-cell rim.
const EMULATOR_RESET_ROWS: f64 = 17.0;
/// Rows visible after a reset in the free-roaming view.
const DEFAULT_RESET_ROWS: f64 = 18.0;

#[derive(Debug, Clone)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub scale_velocity: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub panning: bool,
    pub last_x: f64,
    pub last_y: f64,
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (1.0 - t) * start + t * end
}

impl Camera {
    pub fn new(width: f64, height: f64) -> Self {
        let mut cam = Self {
            x: 0.0,
            y: 0.0,
            scale: MIN_SCALE,
            scale_velocity: 0.0,
            target_x: 0.0,
            target_y: 0.0,
            panning: false,
            last_x: 0.0,
            last_y: 0.0,
        };
        cam.reset(false, width, height);
        cam
    }

    /// Snap position, target and scale so that `(fx, fy)` lands on the
    /// viewport center. Kills any zoom velocity.
    pub fn center_on(&mut self, fx: f64, fy: f64, scale: f64, width: f64, height: f64) {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        let x = fx - (width / 2.0) / scale;
        let y = fy - (height / 2.0) / scale;
        self.x = x;
        self.y = y;
        self.target_x = x;
        self.target_y = y;
        self.scale = scale;
        self.scale_velocity = 0.0;
    }

    /// Mode-specific default window: the fixed 16x16 domain centered with a
    /// half-cell rim, or a near-origin window otherwise.
    pub fn reset(&mut self, emulator: bool, width: f64, height: f64) {
        if emulator {
            self.center_on(8.0, 8.0, height / EMULATOR_RESET_ROWS, width, height);
        } else {
            self.center_on(0.5, 0.5, height / DEFAULT_RESET_ROWS, width, height);
        }
    }

    /// Screen pixel to function-space point. Integer function-space
    /// coordinates sit at cell centers under this mapping.
    pub fn screen_to_fn(&self, px: f64, py: f64) -> (f64, f64) {
        let fx = (px - self.scale / 2.0 + self.scale * self.x) / self.scale;
        let fy = (py - self.scale / 2.0 + self.scale * self.y) / self.scale;
        (fx, fy)
    }

    /// Exact inverse of `screen_to_fn`.
    pub fn fn_to_screen(&self, fx: f64, fy: f64) -> (f64, f64) {
        let px = self.scale * (fx - self.x) + self.scale / 2.0;
        let py = self.scale * (fy - self.y) + self.scale / 2.0;
        (px, py)
    }

    /// Top-left pixel of the cell whose corner is at `(fx, fy)`; the
    /// corner-convention transform used for cell rects and the emulator
    /// frame.
    pub fn cell_origin(&self, fx: f64, fy: f64) -> (f64, f64) {
        (
            self.scale * (fx - self.x),
            self.scale * (fy - self.y),
        )
    }

    /// Rescale by `1 + factor`, clamped to the scale bounds, keeping the
    /// function-space point under the viewport center fixed. Position and
    /// pan target are re-anchored through the identical math so they never
    /// diverge under zoom alone.
    pub fn zoom_by(&mut self, factor: f64, center_x: f64, center_y: f64) {
        let new_scale = (self.scale * (1.0 + factor)).clamp(MIN_SCALE, MAX_SCALE);
        let old_scale = self.scale;
        let anchor = |coord: f64, center: f64| (center / old_scale + coord) - center / new_scale;
        self.x = anchor(self.x, center_x);
        self.y = anchor(self.y, center_y);
        self.target_x = anchor(self.target_x, center_x);
        self.target_y = anchor(self.target_y, center_y);
        self.scale = new_scale;
    }

    /// Drag delta in screen pixels; moves only the pan target.
    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        self.target_x -= dx_px / self.scale;
        self.target_y -= dy_px / self.scale;
    }

    /// One frame of motion: ease (or snap) toward the pan target, then decay
    /// and apply the zoom velocity.
    pub fn update(&mut self, smooth_pan: bool, smooth_zoom: bool, center_x: f64, center_y: f64) {
        if smooth_pan {
            self.x = lerp(self.x, self.target_x, PAN_LERP);
            self.y = lerp(self.y, self.target_y, PAN_LERP);
        } else {
            self.x = self.target_x;
            self.y = self.target_y;
        }

        if smooth_zoom {
            self.scale_velocity *= ZOOM_DECAY;
            self.zoom_by(self.scale_velocity / VELOCITY_TO_FACTOR, center_x, center_y);
        }
    }
}
