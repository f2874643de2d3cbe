//! Classifier & player bridge.
//!
//! [`Classifier`] turns each sample into an [`EngineState`], and on a
//! genuine change asks its [`SoundPlayer`] to loop the matching sound.
//! Only after the player accepts does the published state move, so the
//! displayed label and the looping sound never disagree.

use tracing::{debug, info, warn};

use crate::player::{PlaybackError, SoundPlayer};
use crate::published::{Published, SubscriptionId};
use crate::state::{AccelerationSample, EngineState};

// ════════════════════════════════════════════════════════════════════════════
// Transition
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of feeding one classified state to the classifier.
#[derive(Debug)]
pub enum Transition {
    /// The state's loop is already playing; nothing was requested.
    Unchanged(EngineState),
    /// The player accepted the new loop and the published state moved.
    Switched { from: EngineState, to: EngineState },
    /// The player refused; the published state and the loop are untouched.
    Failed { attempted: EngineState, error: PlaybackError },
}

impl Transition {
    pub fn is_switch(&self) -> bool { matches!(self, Transition::Switched { .. }) }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

pub struct Classifier<P> {
    player:         P,
    published:      Published<EngineState>,
    /// State whose loop is currently playing. `None` before the first
    /// successful start and after `stop_audio`.
    active:         Option<EngineState>,
    last_magnitude: Option<f64>,
}

impl<P: SoundPlayer> Classifier<P> {
    /// The published state starts at `Idle` with nothing playing.
    pub fn new(player: P) -> Self {
        Classifier {
            player,
            published:      Published::new(EngineState::Idle),
            active:         None,
            last_magnitude: None,
        }
    }

    pub fn state(&self) -> EngineState { self.published.get() }

    pub fn published(&self) -> &Published<EngineState> { &self.published }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(EngineState) + Send + 'static,
    {
        self.published.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.published.unsubscribe(id)
    }

    pub fn active_loop(&self) -> Option<EngineState> { self.active }

    /// Magnitude of the most recent sample seen by [`handle_sample`](Self::handle_sample).
    pub fn last_magnitude(&self) -> Option<f64> { self.last_magnitude }

    pub fn handle_sample(&mut self, sample: &AccelerationSample) -> Transition {
        let magnitude = sample.magnitude();
        self.last_magnitude = Some(magnitude);
        self.apply_transition(EngineState::from_magnitude(magnitude))
    }

    /// Switch to `next` unless its loop is already playing.
    pub fn apply_transition(&mut self, next: EngineState) -> Transition {
        if self.active == Some(next) {
            return Transition::Unchanged(next);
        }

        let from = self.published.get();
        match self.player.play(next.sound()) {
            Ok(()) => {
                self.active = Some(next);
                self.published.set(next);
                info!(from = %from, to = %next, sound = %next.sound(), "engine state changed");
                Transition::Switched { from, to: next }
            }
            Err(error) => {
                warn!(state = %next, %error, "error playing sound; keeping {}", from);
                Transition::Failed { attempted: next, error }
            }
        }
    }

    /// Stop the current loop. The published label keeps its last value.
    pub fn stop_audio(&mut self) {
        if let Some(state) = self.active.take() {
            debug!(state = %state, "stopping engine loop");
            self.player.stop();
        }
    }

    pub fn player(&self) -> &P { &self.player }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SoundId;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Records every request and fails for the sounds listed in `missing`.
    #[derive(Default)]
    struct RecordingPlayer {
        requests: Vec<SoundId>,
        stops:    usize,
        missing:  Vec<SoundId>,
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError> {
            self.requests.push(sound);
            if self.missing.contains(&sound) {
                return Err(PlaybackError::AssetMissing {
                    sound,
                    path: PathBuf::from(sound.file_name()),
                });
            }
            Ok(())
        }
        fn stop(&mut self) { self.stops += 1; }
    }

    fn sample(x: f64, y: f64, z: f64) -> AccelerationSample {
        AccelerationSample::new(x, y, z)
    }

    #[test]
    fn still_sample_starts_idle_loop() {
        let mut c = Classifier::new(RecordingPlayer::default());
        let t = c.handle_sample(&sample(0.0, 0.0, 0.0));
        assert!(matches!(t, Transition::Switched { from: EngineState::Idle, to: EngineState::Idle }));
        assert_eq!(c.player().requests, vec![SoundId::IDLE]);
        assert_eq!(c.state().label(), "Idle");
        assert_eq!(c.active_loop(), Some(EngineState::Idle));
    }

    #[test]
    fn moderate_sample_accelerates() {
        let mut c = Classifier::new(RecordingPlayer::default());
        c.handle_sample(&sample(0.3, 0.0, 0.0));
        assert_eq!(c.player().requests, vec![SoundId::ACCELERATING]);
        assert_eq!(c.state().label(), "Accelerating");
        assert_eq!(c.last_magnitude(), Some(0.3));
    }

    #[test]
    fn repeated_bucket_plays_once() {
        let mut c = Classifier::new(RecordingPlayer::default());
        for _ in 0..3 {
            c.handle_sample(&sample(0.3, 0.0, 0.0));
            assert_eq!(c.state(), EngineState::Accelerating);
        }
        assert_eq!(c.player().requests, vec![SoundId::ACCELERATING]);
    }

    #[test]
    fn same_state_applied_twice_requests_once() {
        let mut c = Classifier::new(RecordingPlayer::default());
        assert!(c.apply_transition(EngineState::Decelerating).is_switch());
        assert!(matches!(
            c.apply_transition(EngineState::Decelerating),
            Transition::Unchanged(EngineState::Decelerating)
        ));
        assert_eq!(c.player().requests.len(), 1);
    }

    #[test]
    fn hard_sample_decelerates() {
        let mut c = Classifier::new(RecordingPlayer::default());
        c.handle_sample(&sample(1.0, 0.0, 0.0));
        assert_eq!(c.player().requests, vec![SoundId::DECELERATING]);
        assert_eq!(c.state(), EngineState::Decelerating);
    }

    #[test]
    fn missing_asset_keeps_previous_label() {
        let player = RecordingPlayer { missing: vec![SoundId::IDLE], ..Default::default() };
        let mut c = Classifier::new(player);
        c.handle_sample(&sample(0.3, 0.0, 0.0));
        assert_eq!(c.state(), EngineState::Accelerating);

        let t = c.handle_sample(&sample(0.0, 0.0, 0.0));
        assert!(matches!(
            t,
            Transition::Failed { attempted: EngineState::Idle, error: PlaybackError::AssetMissing { .. } }
        ));
        assert_eq!(c.state().label(), "Accelerating");
        assert_eq!(c.active_loop(), Some(EngineState::Accelerating));
    }

    #[test]
    fn failed_switch_is_attempted_again_on_next_sample() {
        let player = RecordingPlayer { missing: vec![SoundId::DECELERATING], ..Default::default() };
        let mut c = Classifier::new(player);
        c.handle_sample(&sample(2.0, 0.0, 0.0));
        c.handle_sample(&sample(2.0, 0.0, 0.0));
        assert_eq!(c.player().requests, vec![SoundId::DECELERATING, SoundId::DECELERATING]);
        assert_eq!(c.active_loop(), None);
        assert_eq!(c.state(), EngineState::Idle);
    }

    #[test]
    fn every_non_self_transition_switches() {
        for from in EngineState::ALL {
            for to in EngineState::ALL {
                if from == to { continue; }
                let mut c = Classifier::new(RecordingPlayer::default());
                c.apply_transition(from);
                let t = c.apply_transition(to);
                assert!(matches!(t, Transition::Switched { from: f, to: n } if f == from && n == to));
                assert_eq!(c.player().requests, vec![from.sound(), to.sound()]);
            }
        }
    }

    #[test]
    fn subscribers_see_only_real_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut c = Classifier::new(RecordingPlayer::default());
        let s = Arc::clone(&seen);
        c.subscribe(move |state| s.lock().unwrap().push(state.label()));

        for m in [0.0, 0.3, 0.3, 0.7, 0.7, 0.05] {
            c.handle_sample(&sample(m, 0.0, 0.0));
        }
        // The first Idle does not change the published value, so it is not announced.
        assert_eq!(*seen.lock().unwrap(), vec!["Accelerating", "Decelerating", "Idle"]);
    }

    #[test]
    fn stop_audio_keeps_label_and_forgets_loop() {
        let mut c = Classifier::new(RecordingPlayer::default());
        c.handle_sample(&sample(0.3, 0.0, 0.0));
        c.stop_audio();
        c.stop_audio();
        assert_eq!(c.player().stops, 1);
        assert_eq!(c.state(), EngineState::Accelerating);
        assert_eq!(c.active_loop(), None);

        // Same bucket after a stop restarts the loop.
        c.handle_sample(&sample(0.3, 0.0, 0.0));
        assert_eq!(c.player().requests.len(), 2);
    }

    #[test]
    fn boxed_player_works() {
        let boxed: Box<dyn SoundPlayer> = Box::new(RecordingPlayer::default());
        let mut c = Classifier::new(boxed);
        assert!(c.handle_sample(&sample(0.1, 0.0, 0.0)).is_switch());
        assert_eq!(c.state(), EngineState::Accelerating);
    }
}
