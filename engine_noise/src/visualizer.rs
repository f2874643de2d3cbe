//! Software-rendered display using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            ENGINE NOISE SIMULATOR            │
//! │                                              │
//! │       CURRENT STATE: ACCELERATING            │
//! │                                              │
//! │  [██████████████░░░░░░░░░░░░░░░░░░░░░░░░░]   │
//! │   0   ^0.1            ^0.5              1.0  │
//! │                                              │
//! │  status line                                 │
//! │  key legend                                  │
//! └──────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use engine_core::{EngineState, ACCELERATING_CEILING, IDLE_CEILING};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::sensor::{Axis, SimInput, SimPreset};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 640;
pub const WIN_H:     usize = 300;
const TITLE_Y:       usize = 28;
const STATE_Y:       usize = 90;
const METER_X:       usize = 40;
const METER_Y:       usize = 150;
const METER_W:       usize = WIN_W - 2 * METER_X;
const METER_H:       usize = 28;
/// Magnitude shown at the right edge of the meter.
const METER_MAX:     f64   = 1.0;
const STATUS_Y:      usize = WIN_H - 48;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const PANEL_COLOR:   u32   = 0xFF16213E;
const TEXT_COLOR:    u32   = 0xFFEEEEEE;
const DIM_COLOR:     u32   = 0xFF888888;
const TICK_COLOR:    u32   = 0xFFFFD700;

/// What the window asks the application to do after polling input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    Continue,
    ToggleListening,
    Quit,
}

/// Fill colour for each state.
pub fn state_color(state: EngineState) -> u32 {
    match state {
        EngineState::Idle         => 0xFF4CAF50,
        EngineState::Accelerating => 0xFFFFA726,
        EngineState::Decelerating => 0xFFE53935,
    }
}

/// Pixels of the meter filled for `magnitude`, clamped to the meter width.
pub fn meter_fill(magnitude: f64, width: usize) -> usize {
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return if magnitude == f64::INFINITY { width } else { 0 };
    }
    ((magnitude / METER_MAX).min(1.0) * width as f64).round() as usize
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// Present only when the simulated sensor is in use.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Engine Noise Simulator",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the keyboard. Sensor keys are forwarded to the simulator.
    pub fn poll_input(&mut self) -> UiAction {
        if !self.window.is_open() { return UiAction::Quit; }

        let once = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        if once(Key::Q) || once(Key::Escape) { return UiAction::Quit; }
        let toggle = once(Key::P);

        let mut inputs = Vec::new();
        if once(Key::Key1) { inputs.push(SimInput::Preset(SimPreset::Still)); }
        if once(Key::Key2) { inputs.push(SimInput::Preset(SimPreset::Cruise)); }
        if once(Key::Key3) { inputs.push(SimInput::Preset(SimPreset::Hard)); }
        if once(Key::E)    { inputs.push(SimInput::Fault); }

        let held = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);
        let step = 0.05;
        if held(Key::Up)    { inputs.push(SimInput::Nudge { axis: Axis::X, delta:  step }); }
        if held(Key::Down)  { inputs.push(SimInput::Nudge { axis: Axis::X, delta: -step }); }
        if held(Key::Right) { inputs.push(SimInput::Nudge { axis: Axis::Y, delta:  step }); }
        if held(Key::Left)  { inputs.push(SimInput::Nudge { axis: Axis::Y, delta: -step }); }

        if let Some(tx) = &self.sim_tx {
            for input in inputs {
                let _ = tx.send(input);
            }
        }

        if toggle { UiAction::ToggleListening } else { UiAction::Continue }
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        state:     EngineState,
        magnitude: Option<f64>,
        listening: bool,
        status:    &str,
    ) {
        self.buf.fill(BG_COLOR);

        self.draw_centered("ENGINE NOISE SIMULATOR", TITLE_Y, 3, TEXT_COLOR);

        let line = format!("CURRENT STATE: {}", state.label());
        self.draw_centered(&line, STATE_Y, 2, state_color(state));

        // ── Meter ─────────────────────────────────────────────────────────
        self.fill_rect(METER_X, METER_Y, METER_W, METER_H, PANEL_COLOR);
        if let Some(m) = magnitude {
            let w = meter_fill(m, METER_W);
            self.fill_rect(METER_X, METER_Y, w, METER_H, state_color(EngineState::from_magnitude(m)));
            self.draw_label(&format!("{:.3}", m), METER_X + METER_W - 40, METER_Y - 14, 2, DIM_COLOR);
        }
        for threshold in [IDLE_CEILING, ACCELERATING_CEILING] {
            let x = METER_X + meter_fill(threshold, METER_W);
            self.fill_rect(x, METER_Y - 4, 2, METER_H + 8, TICK_COLOR);
            self.draw_label(&format!("{}", threshold), x.saturating_sub(6), METER_Y + METER_H + 8, 2, TICK_COLOR);
        }
        self.draw_border(METER_X, METER_Y, METER_W, METER_H, DIM_COLOR);

        // ── Status + legend ───────────────────────────────────────────────
        let sensor = if listening { "SENSOR ON" } else { "SENSOR OFF" };
        self.draw_label(&format!("{}  {}", sensor, status), 10, STATUS_Y, 2, TEXT_COLOR);
        self.draw_label(
            "1/2/3=preset  arrows=nudge  E=fault  P=pause  Q=quit",
            10, WIN_H - 16, 1, DIM_COLOR,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    fn draw_centered(&mut self, text: &str, y: usize, scale: usize, color: u32) {
        let w = label_width(text, scale);
        self.draw_label(text, WIN_W.saturating_sub(w) / 2, y, scale, color);
    }

    /// 3×5 bitmap text, each font pixel drawn as a `scale`×`scale` square.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (0b100 >> col) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Width in pixels of `text` at `scale`.
pub fn label_width(text: &str, scale: usize) -> usize {
    (text.chars().count() * 4).saturating_sub(1) * scale
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font (upper-case; lower-case folds onto it)
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000; 5],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_fill_scales_and_clamps() {
        assert_eq!(meter_fill(0.0, 500), 0);
        assert_eq!(meter_fill(0.5, 500), 250);
        assert_eq!(meter_fill(1.0, 500), 500);
        assert_eq!(meter_fill(3.0, 500), 500);
        assert_eq!(meter_fill(-1.0, 500), 0);
        assert_eq!(meter_fill(f64::NAN, 500), 0);
        assert_eq!(meter_fill(f64::INFINITY, 500), 500);
    }

    #[test]
    fn each_state_has_its_own_color() {
        let colors: Vec<u32> = EngineState::ALL.iter().map(|s| state_color(*s)).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn state_labels_have_glyphs() {
        for state in EngineState::ALL {
            for ch in format!("CURRENT STATE: {}", state.label()).chars() {
                let g = glyph(ch);
                // Only space is blank; unknown characters fall back to a dot.
                assert!(ch == ' ' || g != [0b000, 0b000, 0b010, 0b000, 0b000], "missing glyph {:?}", ch);
            }
        }
    }

    #[test]
    fn label_width_counts_gaps() {
        assert_eq!(label_width("", 2), 0);
        assert_eq!(label_width("A", 1), 3);
        assert_eq!(label_width("AB", 2), 14);
    }
}
