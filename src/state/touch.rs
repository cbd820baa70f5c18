// Touch/pinch gesture state for the canvas view.
#[derive(Default, Debug, Clone)]
pub struct TouchState {
    pub single_active: bool,
    pub pinch: bool,
    pub last_pinch_dist: f64,
    pub last_touch_x: f64,
    pub last_touch_y: f64,
}
