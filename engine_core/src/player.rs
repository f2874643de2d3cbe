//! The audio collaborator as seen by the classifier.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::SoundId;

/// Why a loop could not be started. Every variant is non-fatal: the caller
/// logs it and keeps the previous loop.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("sound file not found: {sound} ({})", .path.display())]
    AssetMissing { sound: SoundId, path: PathBuf },

    #[error("cannot decode {sound}: {reason}")]
    Decode { sound: SoundId, reason: String },

    #[error("audio engine initialization failed: {0}")]
    Init(String),

    #[error("playback thread is not running")]
    Disconnected,
}

/// Loops one sound at a time.
///
/// A successful [`play`](SoundPlayer::play) replaces whatever was looping
/// before. A failed one must leave the previous loop untouched.
pub trait SoundPlayer {
    fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError>;
    fn stop(&mut self);
}

impl<P: SoundPlayer + ?Sized> SoundPlayer for Box<P> {
    fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError> { (**self).play(sound) }
    fn stop(&mut self) { (**self).stop() }
}

impl<P: SoundPlayer + ?Sized> SoundPlayer for &mut P {
    fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError> { (**self).play(sound) }
    fn stop(&mut self) { (**self).stop() }
}
