//! Per-frame evaluation of the compiled expression over every visible cell.

use crate::expr::{Env, Program};
use crate::model::Settings;
use crate::state::Camera;

/// Side length of the fixed emulator domain, in cells.
pub const EMULATOR_CELLS: i32 = 16;

/// Half-open cell range `[left, right) x [top, bottom)` intersecting the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CellRange {
    pub fn visible(camera: &Camera, width: f64, height: f64, emulator: bool) -> Self {
        if emulator {
            return Self {
                left: 0,
                top: 0,
                right: EMULATOR_CELLS,
                bottom: EMULATOR_CELLS,
            };
        }
        Self {
            left: camera.x.floor() as i32,
            top: camera.y.floor() as i32,
            right: (camera.x + width / camera.scale).ceil() as i32,
            bottom: (camera.y + height / camera.scale).ceil() as i32,
        }
    }

    pub fn count(&self) -> usize {
        let w = (self.right - self.left).max(0) as usize;
        let h = (self.bottom - self.top).max(0) as usize;
        w * h
    }
}

/// Y-orientation policy: cartesian flips Y so it increases upward, but the
/// emulator's fixed window always keeps screen orientation.
pub fn orient_y(y: f64, settings: &Settings) -> f64 {
    if settings.emulator {
        return y;
    }
    if settings.cartesian { -y + 0.0 } else { y }
}

pub fn clamp_unit(v: f64) -> f64 {
    v.clamp(-1.0, 1.0)
}

/// One evaluated cell, handed to the renderer. `x`/`y` are the grid
/// coordinates (screen orientation) used for rect placement; `fy` is the
/// orientation-corrected Y the expression saw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    pub x: i32,
    pub y: i32,
    pub fy: f64,
    /// 1-based row-major index within this frame.
    pub index: usize,
    pub raw: f64,
    pub clamped: f64,
}

/// Walk the range in row-major order (Y outer ascending, X inner ascending),
/// sample the program once per cell, and hand each result to `visit`.
/// Failed samples degrade to 0 so one bad cell never aborts the frame.
pub fn evaluate(
    program: &Program,
    t: f64,
    mouse: (f64, f64),
    range: CellRange,
    settings: &Settings,
    mut visit: impl FnMut(CellSample),
) {
    let count = range.count() as f64;
    let mut index = 0usize;
    for y in range.top..range.bottom {
        let fy = orient_y(y as f64, settings);
        for x in range.left..range.right {
            index += 1;
            let env = Env {
                t,
                i: index as f64,
                x: x as f64,
                y: fy,
                mx: mouse.0,
                my: mouse.1,
                c: count,
            };
            let raw = program.sample(&env).unwrap_or(0.0);
            let clamped = if settings.clamp_results {
                clamp_unit(raw)
            } else {
                raw
            };
            visit(CellSample {
                x,
                y,
                fy,
                index,
                raw,
                clamped,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(x: f64, y: f64, scale: f64) -> Camera {
        let mut cam = Camera::new(500.0, 500.0);
        cam.x = x;
        cam.y = y;
        cam.target_x = x;
        cam.target_y = y;
        cam.scale = scale;
        cam
    }

    #[test]
    fn test_visible_range_scenario() {
        // 500x500 viewport at scale 50 over the origin: exactly 10x10 cells.
        let cam = camera(0.0, 0.0, 50.0);
        let range = CellRange::visible(&cam, 500.0, 500.0, false);
        assert_eq!(
            range,
            CellRange {
                left: 0,
                top: 0,
                right: 10,
                bottom: 10
            }
        );
        assert_eq!(range.count(), 100);
        // Cell (0, 0) renders at the screen origin, one cell wide.
        assert_eq!(cam.cell_origin(0.0, 0.0), (0.0, 0.0));
        assert_eq!(cam.cell_origin(1.0, 1.0), (50.0, 50.0));
    }

    #[test]
    fn test_visible_range_overscans_fractional_edges() {
        let cam = camera(0.3, -0.7, 50.0);
        let range = CellRange::visible(&cam, 500.0, 500.0, false);
        assert_eq!(range.left, 0);
        assert_eq!(range.top, -1);
        assert_eq!(range.right, 11);
        assert_eq!(range.bottom, 10);
    }

    #[test]
    fn test_emulator_range_ignores_camera() {
        let cam = camera(-250.0, 981.5, 730.0);
        let range = CellRange::visible(&cam, 1920.0, 1080.0, true);
        assert_eq!(
            range,
            CellRange {
                left: 0,
                top: 0,
                right: 16,
                bottom: 16
            }
        );
        assert_eq!(range.count(), 256);
    }

    #[test]
    fn test_orientation_policy() {
        let mut settings = Settings::default();
        assert_eq!(orient_y(3.0, &settings), -3.0);
        settings.cartesian = false;
        assert_eq!(orient_y(3.0, &settings), 3.0);
        // Emulator wins over cartesian.
        settings.cartesian = true;
        settings.emulator = true;
        assert_eq!(orient_y(3.0, &settings), 3.0);
    }

    #[test]
    fn test_clamp_correctness() {
        let raw = [-5.0, -1.0, 0.0, 0.5, 5.0];
        let clamped: Vec<f64> = raw.iter().map(|&v| clamp_unit(v)).collect();
        assert_eq!(clamped, vec![-1.0, -1.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_row_major_index_contract() {
        let program = Program::compile("i").unwrap();
        let range = CellRange {
            left: -1,
            top: 2,
            right: 2,
            bottom: 4,
        };
        let settings = Settings {
            cartesian: false,
            ..Settings::default()
        };
        let mut seen = Vec::new();
        evaluate(&program, 0.0, (0.0, 0.0), range, &settings, |cell| {
            seen.push((cell.index, cell.x, cell.y, cell.raw));
        });
        assert_eq!(seen.len(), range.count());
        // i covers 1..=c with no gaps, Y outer, X inner.
        let expect = [
            (1, -1, 2),
            (2, 0, 2),
            (3, 1, 2),
            (4, -1, 3),
            (5, 0, 3),
            (6, 1, 3),
        ];
        for (got, want) in seen.iter().zip(expect) {
            assert_eq!((got.0, got.1, got.2), want);
            // The expression saw the same index it was assigned.
            assert_eq!(got.3, got.0 as f64);
        }
    }

    #[test]
    fn test_count_matches_c_argument() {
        let program = Program::compile("c").unwrap();
        let range = CellRange {
            left: 0,
            top: 0,
            right: 4,
            bottom: 3,
        };
        let mut calls = 0usize;
        evaluate(
            &program,
            0.0,
            (0.0, 0.0),
            range,
            &Settings::default(),
            |cell| {
                calls += 1;
                assert_eq!(cell.raw, 12.0);
            },
        );
        assert_eq!(calls, 12);
    }

    #[test]
    fn test_failed_samples_degrade_to_zero() {
        for source in ["1/0", "0/0", "log(0-1)"] {
            let program = Program::compile(source).unwrap();
            let range = CellRange {
                left: 0,
                top: 0,
                right: 2,
                bottom: 2,
            };
            evaluate(
                &program,
                0.0,
                (0.0, 0.0),
                range,
                &Settings::default(),
                |cell| {
                    assert_eq!(cell.raw, 0.0, "{source}");
                    assert_eq!(cell.clamped, 0.0, "{source}");
                },
            );
        }
    }

    #[test]
    fn test_clamp_setting_off_passes_raw_through() {
        let program = Program::compile("x*10").unwrap();
        let range = CellRange {
            left: 1,
            top: 0,
            right: 2,
            bottom: 1,
        };
        let mut settings = Settings::default();
        settings.clamp_results = false;
        evaluate(&program, 0.0, (0.0, 0.0), range, &settings, |cell| {
            assert_eq!(cell.clamped, 10.0);
        });
        settings.clamp_results = true;
        evaluate(&program, 0.0, (0.0, 0.0), range, &settings, |cell| {
            assert_eq!(cell.clamped, 1.0);
        });
    }

    #[test]
    fn test_cartesian_y_reaches_expression() {
        let program = Program::compile("y").unwrap();
        let range = CellRange {
            left: 0,
            top: 2,
            right: 1,
            bottom: 3,
        };
        let settings = Settings::default(); // cartesian on
        evaluate(&program, 0.0, (0.0, 0.0), range, &settings, |cell| {
            assert_eq!(cell.raw, -2.0);
            assert_eq!(cell.fy, -2.0);
            assert_eq!(cell.y, 2);
        });
    }
}
