// Per-visualizer mutable state, owned by the canvas view and passed by
// reference into the frame tick and the input handlers.

use crate::expr::Program;
use crate::model::Settings;

use super::Camera;

pub const FRAME_WINDOW: usize = 30;

/// Fixed-length ring of recent frame durations in milliseconds, continuously
/// overwritten for the rolling-average rate counter.
#[derive(Debug, Clone)]
pub struct FrameTimes {
    samples: [f64; FRAME_WINDOW],
    next: usize,
}

impl FrameTimes {
    pub fn new() -> Self {
        Self {
            samples: [16.666; FRAME_WINDOW],
            next: 0,
        }
    }

    pub fn record(&mut self, duration_ms: f64) {
        self.samples[self.next] = duration_ms;
        self.next = (self.next + 1) % FRAME_WINDOW;
    }

    pub fn fps(&self) -> f64 {
        let mean = self.samples.iter().sum::<f64>() / FRAME_WINDOW as f64;
        1000.0 / mean
    }
}

impl Default for FrameTimes {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Session {
    pub camera: Camera,
    pub settings: Settings,
    pub source: String,
    program: Program,
    epoch_ms: f64,
    /// Pointer position in screen pixels, clamped to the viewport.
    pub mouse_x: f64,
    pub mouse_y: f64,
    pub frames: FrameTimes,
    last_frame_ms: f64,
}

impl Session {
    pub fn new(source: &str, settings: Settings, width: f64, height: f64, now_ms: f64) -> Self {
        let mut session = Self {
            camera: Camera::new(width, height),
            settings,
            source: String::new(),
            program: Program::zero(),
            epoch_ms: now_ms,
            mouse_x: 0.0,
            mouse_y: 0.0,
            frames: FrameTimes::new(),
            last_frame_ms: now_ms,
        };
        if settings.emulator {
            session.camera.reset(true, width, height);
        }
        session.recompile(source, now_ms);
        session
    }

    /// Swap in a fresh compile of `source`. The program and its time origin
    /// are replaced together so `t` restarts at 0 for the new code; a failed
    /// compile degrades to the constant-zero program.
    pub fn recompile(&mut self, source: &str, now_ms: f64) {
        // Recovery is silent: the visualization goes flat instead of
        // surfacing authoring errors mid-animation.
        self.program = Program::compile(source).unwrap_or_else(|_| Program::zero());
        self.epoch_ms = now_ms;
        self.source = source.to_string();
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Seconds since the current program was compiled; the `t` argument.
    pub fn elapsed_secs(&self, now_ms: f64) -> f64 {
        (now_ms - self.epoch_ms) / 1000.0
    }

    /// Marks the end of a frame (for averaging).
    pub fn record_frame(&mut self, now_ms: f64) {
        self.frames.record(now_ms - self.last_frame_ms);
        self.last_frame_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Env;

    #[test]
    fn test_frame_ring_overwrites_oldest() {
        let mut frames = FrameTimes::new();
        // Preloaded at ~60Hz.
        assert!((frames.fps() - 60.0).abs() < 0.1);
        for _ in 0..FRAME_WINDOW {
            frames.record(33.333);
        }
        assert!((frames.fps() - 30.0).abs() < 0.1);
        // Partial overwrite blends old and new samples.
        for _ in 0..(FRAME_WINDOW / 2) {
            frames.record(16.666);
        }
        let fps = frames.fps();
        assert!(fps > 30.0 && fps < 60.0);
    }

    #[test]
    fn test_recompile_resets_time_origin() {
        let mut session = Session::new("t", Settings::default(), 500.0, 500.0, 0.0);
        assert!((session.elapsed_secs(120_000.0) - 120.0).abs() < 1e-9);
        // Two minutes in, new code starts back at t = 0.
        session.recompile("t*2", 120_000.0);
        assert!(session.elapsed_secs(120_000.0).abs() < 1e-9);
        assert!((session.elapsed_secs(120_500.0) - 0.5).abs() < 1e-9);
        assert_eq!(session.source, "t*2");
    }

    #[test]
    fn test_invalid_source_degrades_to_zero() {
        let mut session = Session::new("x+y", Settings::default(), 500.0, 500.0, 0.0);
        session.recompile("{{{", 100.0);
        let env = Env {
            x: 3.0,
            y: 4.0,
            ..Env::default()
        };
        assert_eq!(session.program().sample(&env), Ok(0.0));
    }

    #[test]
    fn test_hostile_sources_always_sample_zero() {
        let mut session = Session::new("t", Settings::default(), 500.0, 500.0, 0.0);
        for source in ["1/0", "undefinedVar", "{{{", ""] {
            session.recompile(source, 0.0);
            for i in 0..16 {
                let env = Env {
                    t: 1.0,
                    i: (i + 1) as f64,
                    x: i as f64,
                    y: -(i as f64),
                    ..Env::default()
                };
                let value = session.program().sample(&env).unwrap_or(0.0);
                assert_eq!(value, 0.0, "{source}");
            }
        }
    }

    #[test]
    fn test_frame_recording_uses_deltas() {
        let mut session = Session::new("0", Settings::default(), 500.0, 500.0, 1000.0);
        for n in 1..=FRAME_WINDOW as u32 {
            session.record_frame(1000.0 + n as f64 * 20.0);
        }
        // Thirty 20ms frames: 50 fps.
        assert!((session.frames.fps() - 50.0).abs() < 0.1);
    }
}
