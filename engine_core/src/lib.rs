//! # engine_core
//!
//! The sensor-to-sound state machine behind the engine noise simulator.
//!
//! An [`AccelerationSample`] is reduced to its magnitude, the magnitude is
//! bucketed into an [`EngineState`], and a [`Classifier`] asks a
//! [`SoundPlayer`] to loop the matching sound whenever the bucket changes.
//! The current state is held in a [`Published`] value that any display can
//! read or subscribe to.
//!
//! ## Magnitude → state
//!
//! | Magnitude | State | Sound |
//! |---|---|---|
//! | `m < 0.1` | Idle | `engine_idle.mp3` |
//! | `0.1 ≤ m < 0.5` | Accelerating | `engine_accelerating.mp3` |
//! | `m ≥ 0.5` | Decelerating | `engine_decelerating.mp3` |
//!
//! ## Quick start
//!
//! ```rust
//! use engine_core::{AccelerationSample, Classifier, EngineState, PlaybackError, SoundId, SoundPlayer};
//!
//! struct Quiet;
//! impl SoundPlayer for Quiet {
//!     fn play(&mut self, _sound: SoundId) -> Result<(), PlaybackError> { Ok(()) }
//!     fn stop(&mut self) {}
//! }
//!
//! let mut classifier = Classifier::new(Quiet);
//! classifier.handle_sample(&AccelerationSample::new(0.3, 0.0, 0.0));
//! assert_eq!(classifier.state(), EngineState::Accelerating);
//! assert_eq!(classifier.state().label(), "Accelerating");
//! ```

pub mod state;
pub mod published;
pub mod player;
pub mod classifier;

pub use state::{
    classify, AccelerationSample, EngineState, SoundId,
    ACCELERATING_CEILING, IDLE_CEILING, SOUND_EXTENSION,
};
pub use published::{Published, SubscriptionId};
pub use player::{PlaybackError, SoundPlayer};
pub use classifier::{Classifier, Transition};
