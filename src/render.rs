//! Mapping cell results to drawn shapes, plus the frame overlays.
//!
//! Color/shape policy decisions are plain functions over a `CellSample` so
//! they stay testable; the `CanvasRenderingContext2d` helpers below them are
//! thin.

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use crate::grid::{self, CellRange, CellSample, EMULATOR_CELLS};
use crate::model::Settings;
use crate::state::{Camera, Session};

const NEGATIVE_CIRCLE: &str = "#F24";
const POSITIVE_CIRCLE: &str = "#FFF";
const FRAME_STROKE: &str = "#F24";

/// Fixed quadratic curve from a clamped result to RGB. Positive values map
/// to grayscale, negative values to a tinted hue; the asymmetry is the
/// intended visual encoding.
pub fn quadratic_tint(v: f64) -> (u8, u8, u8) {
    let r = (201.24 * v * v).clamp(0.0, 255.0) as u8;
    if v > 0.0 {
        return (r, r, r);
    }
    let g = (26.82 * v * v).clamp(0.0, 255.0) as u8;
    let b = (53.66 * v * v).clamp(0.0, 255.0) as u8;
    (r, g, b)
}

/// Reinterpret the raw result as a packed 24-bit color, giving the
/// expression direct channel control. Non-finite values mask to black.
pub fn packed_rgb(raw: f64) -> (u8, u8, u8) {
    let bits = (raw.trunc() as i64 & 0xFF_FFFF) as u32;
    ((bits >> 16) as u8, (bits >> 8) as u8, bits as u8)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellPaint {
    pub css: String,
    /// Disc radius as a fraction of the half-cell; 1.0 fills the cell.
    pub radius_frac: f64,
}

/// Select one of the three mutually exclusive color policies.
pub fn cell_paint(sample: &CellSample, settings: &Settings) -> CellPaint {
    if settings.color_mode {
        let (r, g, b) = packed_rgb(sample.raw);
        CellPaint {
            css: format!("rgb({r} {g} {b})"),
            radius_frac: 1.0,
        }
    } else if settings.use_circles {
        let css = if sample.clamped < 0.0 {
            NEGATIVE_CIRCLE
        } else {
            POSITIVE_CIRCLE
        };
        CellPaint {
            css: css.to_string(),
            radius_frac: sample.clamped.abs(),
        }
    } else {
        let (r, g, b) = quadratic_tint(sample.clamped);
        CellPaint {
            css: format!("rgb({r} {g} {b})"),
            radius_frac: 1.0,
        }
    }
}

fn draw_cell(
    ctx: &CanvasRenderingContext2d,
    paint: &CellPaint,
    ox: f64,
    oy: f64,
    scale: f64,
    settings: &Settings,
) {
    ctx.set_fill_style_str(&paint.css);
    if settings.use_circles {
        ctx.begin_path();
        let radius = paint.radius_frac * scale / 2.0;
        ctx.arc(ox + scale / 2.0, oy + scale / 2.0, radius, 0.0, TAU).ok();
        ctx.fill();
    } else {
        // One pixel of overscan hides seams from fractional cell origins.
        ctx.fill_rect(ox, oy, scale + 1.0, scale + 1.0);
    }
    if settings.debug_outline {
        ctx.set_line_width(1.0);
        ctx.set_stroke_style_str("#555");
        ctx.stroke_rect(ox, oy, scale, scale);
    }
}

fn draw_cell_overlay(
    ctx: &CanvasRenderingContext2d,
    sample: &CellSample,
    ox: f64,
    oy: f64,
    scale: f64,
    bounds: (f64, f64, f64, f64),
    settings: &Settings,
) {
    let (gx1, gy1, gx2, gy2) = bounds;
    ctx.set_fill_style_str("#0008");
    ctx.fill_rect(ox, oy, scale, scale);
    ctx.set_stroke_style_str("#222");
    ctx.set_line_width(3.0);
    ctx.begin_path();
    ctx.move_to(ox, gy1);
    ctx.line_to(ox, gy2);
    ctx.stroke();
    ctx.begin_path();
    ctx.move_to(gx1, oy);
    ctx.line_to(gx2, oy);
    ctx.stroke();

    let on_axis = sample.x == 0 || sample.fy == 0.0;
    let highlight = on_axis && !settings.emulator && !settings.grid_values;
    ctx.set_shadow_color("#000");
    ctx.set_shadow_blur(5.0);
    ctx.set_fill_style_str(if highlight { "#FF0" } else { "#EEE" });
    let label = if settings.grid_values {
        if settings.color_mode {
            let bits = (sample.raw.trunc() as i64 & 0xFF_FFFF) as u32;
            format!("#{bits:06X}")
        } else {
            format!("{:.2}", sample.raw)
        }
    } else {
        format!("({}, {})", sample.x, sample.fy)
    };
    ctx.fill_text(&label, ox + scale / 2.0, oy + scale / 2.0).ok();
    ctx.set_shadow_color("rgba(0,0,0,0)");
}

fn draw_emulator_frame(ctx: &CanvasRenderingContext2d, camera: &Camera) {
    let lw = camera.scale / 3.0;
    let (x1, y1) = camera.cell_origin(0.0, 0.0);
    let (x2, y2) = camera.cell_origin(EMULATOR_CELLS as f64, EMULATOR_CELLS as f64);
    ctx.set_line_width(lw);
    ctx.set_stroke_style_str(FRAME_STROKE);
    ctx.stroke_rect(x1 - lw / 2.0, y1 - lw / 2.0, (x2 - x1) + lw, (y2 - y1) + lw);
}

/// Outlined diagnostic text, fixed position, drawn last and unaffected by
/// camera or grid state.
pub fn draw_fps(ctx: &CanvasRenderingContext2d, fps: f64) {
    ctx.set_stroke_style_str("#000");
    ctx.set_fill_style_str("#fff");
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_font("900 24px JetBrains Mono, monospace");
    ctx.set_line_width(3.0);
    let msg = format!("{:.0} FPS", fps);
    ctx.stroke_text(&msg, 10.0, 10.0).ok();
    ctx.fill_text(&msg, 10.0, 10.0).ok();
}

/// One full evaluate-and-draw pass over the visible range.
pub fn draw_frame(
    ctx: &CanvasRenderingContext2d,
    session: &Session,
    width: f64,
    height: f64,
    now_ms: f64,
) {
    let settings = session.settings;
    let cam = &session.camera;
    let t = session.elapsed_secs(now_ms);

    ctx.clear_rect(0.0, 0.0, width, height);

    let (mfx, mfy) = cam.screen_to_fn(session.mouse_x, session.mouse_y);
    let mouse = (mfx, grid::orient_y(mfy, &settings));

    let range = CellRange::visible(cam, width, height, settings.emulator);
    let bounds = if settings.emulator {
        let (x1, y1) = cam.cell_origin(0.0, 0.0);
        let (x2, y2) = cam.cell_origin(EMULATOR_CELLS as f64, EMULATOR_CELLS as f64);
        (x1, y1, x2, y2)
    } else {
        (0.0, 0.0, width, height)
    };

    if settings.grid {
        ctx.set_font(&format!("{}px Computer Modern Serif, serif", cam.scale / 8.0));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
    }

    grid::evaluate(session.program(), t, mouse, range, &settings, |sample| {
        let (ox, oy) = cam.cell_origin(sample.x as f64, sample.y as f64);
        let paint = cell_paint(&sample, &settings);
        draw_cell(ctx, &paint, ox, oy, cam.scale, &settings);
        if settings.grid {
            draw_cell_overlay(ctx, &sample, ox, oy, cam.scale, bounds, &settings);
        }
    });

    if settings.emulator {
        draw_emulator_frame(ctx, cam);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(raw: f64, clamped: f64) -> CellSample {
        CellSample {
            x: 0,
            y: 0,
            fy: 0.0,
            index: 1,
            raw,
            clamped,
        }
    }

    #[test]
    fn test_quadratic_tint_positive_is_grayscale() {
        assert_eq!(quadratic_tint(1.0), (201, 201, 201));
        assert_eq!(quadratic_tint(0.5), (50, 50, 50));
        assert_eq!(quadratic_tint(0.0), (0, 0, 0));
        // Saturates past the channel range.
        assert_eq!(quadratic_tint(2.0), (255, 255, 255));
    }

    #[test]
    fn test_quadratic_tint_negative_is_tinted() {
        assert_eq!(quadratic_tint(-1.0), (201, 26, 53));
        let (r, g, b) = quadratic_tint(-0.5);
        assert!(r > g && b > g);
    }

    #[test]
    fn test_packed_rgb() {
        assert_eq!(packed_rgb(0.0), (0, 0, 0));
        assert_eq!(packed_rgb(16711680.0), (255, 0, 0));
        assert_eq!(packed_rgb(65280.0), (0, 255, 0));
        assert_eq!(packed_rgb(255.9), (0, 0, 255));
        // Negative values wrap through the mask rather than erroring.
        assert_eq!(packed_rgb(-1.0), (255, 255, 255));
        assert_eq!(packed_rgb(f64::NAN), (0, 0, 0));
    }

    #[test]
    fn test_binary_circle_policy() {
        let settings = Settings::default(); // circles, no color mode
        let below = cell_paint(&sample(-0.25, -0.25), &settings);
        assert_eq!(below.css, NEGATIVE_CIRCLE);
        assert!((below.radius_frac - 0.25).abs() < 1e-12);
        let above = cell_paint(&sample(0.75, 0.75), &settings);
        assert_eq!(above.css, POSITIVE_CIRCLE);
        assert!((above.radius_frac - 0.75).abs() < 1e-12);
        let zero = cell_paint(&sample(0.0, 0.0), &settings);
        assert_eq!(zero.css, POSITIVE_CIRCLE);
        assert_eq!(zero.radius_frac, 0.0);
    }

    #[test]
    fn test_tint_policy_selected_without_circles() {
        let mut settings = Settings::default();
        settings.use_circles = false;
        let paint = cell_paint(&sample(1.0, 1.0), &settings);
        assert_eq!(paint.css, "rgb(201 201 201)");
    }

    #[test]
    fn test_true_color_policy_wins_and_is_full_size() {
        let mut settings = Settings::default();
        settings.color_mode = true;
        // Raw, unclamped value drives the color even though clamped is 1.
        let paint = cell_paint(&sample(16711680.0, 1.0), &settings);
        assert_eq!(paint.css, "rgb(255 0 0)");
        assert_eq!(paint.radius_frac, 1.0);
    }
}
