//! # engine_noise
//!
//! Accelerometer-driven engine noise simulator. Acceleration samples are
//! classified by magnitude (see [`engine_core`]) and the matching engine
//! sound is looped while a small window shows the current state.
//!
//! ## Pieces
//!
//! | Module | Role |
//! |---|---|
//! | [`sensor`] | Sensor sources on their own thread, delivered over a channel to a [`sensor::SensorListener`] |
//! | [`player`] | Playback thread that loops one `engine_*.mp3` at a time |
//! | [`session`] | Owns the listener and the classifier; tears both down on drop |
//! | [`visualizer`] | `minifb` window: state label, magnitude meter, simulator keys |
//! | [`app`] | Windowed and headless loops |
//!
//! ## Feature flags
//!
//! * (default) — **Null audio**: sound files are resolved and logged, not heard.
//! * `audio` — plays through the default output device via `rodio`.
//!
//! ### Simulator keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1` | Still (magnitude 0.0 → Idle) |
//! | `2` | Cruise (magnitude 0.3 → Accelerating) |
//! | `3` | Hard (magnitude 1.0 → Decelerating) |
//! | `↑` / `↓` | Nudge X by ±0.05 (repeats while held) |
//! | `→` / `←` | Nudge Y by ±0.05 |
//! | `E` | Inject a sensor fault (sampling stops) |
//! | `P` | Pause / resume sampling |
//! | `Q` / `Esc` | Quit |

pub mod error;
pub mod sensor;
pub mod player;
pub mod session;
pub mod visualizer;
pub mod app;

pub use error::{AppError, SensorError};
