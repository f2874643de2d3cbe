//! A listening session: one sensor subscription feeding one classifier.
//!
//! The session owns both halves, so tearing it down unsubscribes from the
//! sensor and silences the loop in a fixed order.

use engine_core::{Classifier, EngineState, SoundPlayer, SubscriptionId};
use tracing::debug;

use crate::sensor::SensorListener;

pub struct Session<P: SoundPlayer> {
    listener:   SensorListener,
    classifier: Classifier<P>,
}

impl<P: SoundPlayer> Session<P> {
    pub fn new(listener: SensorListener, player: P) -> Self {
        Session { listener, classifier: Classifier::new(player) }
    }

    /// Begin sampling. Idempotent; logs and does nothing if the sensor is
    /// unavailable.
    pub fn start(&mut self) { self.listener.start(); }

    /// Halt sampling. The current state and its loop are kept.
    pub fn stop(&mut self) { self.listener.stop(); }

    /// Halt sampling and silence the loop.
    pub fn shutdown(&mut self) {
        self.listener.stop();
        self.classifier.stop_audio();
    }

    /// Feed every pending sample to the classifier, in arrival order.
    /// Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let samples = self.listener.drain();
        for sample in &samples {
            self.classifier.handle_sample(sample);
        }
        if !samples.is_empty() {
            debug!(count = samples.len(), state = %self.classifier.state(), "samples classified");
        }
        samples.len()
    }

    pub fn state(&self) -> EngineState { self.classifier.state() }

    pub fn label(&self) -> &'static str { self.classifier.state().label() }

    pub fn last_magnitude(&self) -> Option<f64> { self.classifier.last_magnitude() }

    pub fn is_listening(&self) -> bool { self.listener.is_running() }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(EngineState) + Send + 'static,
    {
        self.classifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.classifier.unsubscribe(id)
    }
}

impl<P: SoundPlayer> Drop for Session<P> {
    fn drop(&mut self) { self.shutdown(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::player::{AssetCatalog, AudioPlayer, Backend};
    use crate::sensor::{ScriptedSensorSource, SensorReading};
    use engine_core::{AccelerationSample, PlaybackError, SoundId};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Shares its request log so it can be inspected after the session drops.
    #[derive(Clone, Default)]
    struct SharedPlayer {
        log:     Arc<Mutex<Vec<String>>>,
        missing: Vec<SoundId>,
    }

    impl SoundPlayer for SharedPlayer {
        fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError> {
            self.log.lock().unwrap().push(format!("play {}", sound));
            if self.missing.contains(&sound) {
                return Err(PlaybackError::AssetMissing { sound, path: sound.file_name().into() });
            }
            Ok(())
        }
        fn stop(&mut self) { self.log.lock().unwrap().push("stop".into()); }
    }

    fn s(x: f64) -> AccelerationSample { AccelerationSample::new(x, 0.0, 0.0) }

    fn scripted(readings: Vec<SensorReading>) -> SensorListener {
        SensorListener::new(ScriptedSensorSource::new(readings)).with_interval(Duration::from_millis(1))
    }

    fn run_to_end<P: SoundPlayer>(session: &mut Session<P>) -> usize {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut handled = 0;
        while session.is_listening() && Instant::now() < deadline {
            handled += session.pump();
            thread::sleep(Duration::from_millis(2));
        }
        handled
    }

    #[test]
    fn samples_drive_state_and_sound() {
        let player = SharedPlayer::default();
        let log = Arc::clone(&player.log);
        let readings = [0.0, 0.3, 0.3, 0.3, 1.0].into_iter().map(|x| SensorReading::Sample(s(x))).collect();
        let mut session = Session::new(scripted(readings), player);

        session.start();
        assert_eq!(run_to_end(&mut session), 5);
        assert_eq!(session.state(), EngineState::Decelerating);
        assert_eq!(session.last_magnitude(), Some(1.0));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["play engine_idle", "play engine_accelerating", "play engine_decelerating"]
        );
    }

    #[test]
    fn delivery_error_freezes_last_state() {
        let readings = vec![
            SensorReading::Sample(s(0.3)),
            SensorReading::Error(SensorError::Delivery("gone".into())),
            SensorReading::Sample(s(1.0)),
        ];
        let mut session = Session::new(scripted(readings), SharedPlayer::default());
        session.start();
        run_to_end(&mut session);
        assert!(!session.is_listening());
        assert_eq!(session.label(), "Accelerating");
    }

    #[test]
    fn unavailable_sensor_leaves_idle() {
        let player = SharedPlayer::default();
        let log = Arc::clone(&player.log);
        let mut session = Session::new(SensorListener::new(ScriptedSensorSource::unavailable()), player);
        session.start();
        assert!(!session.is_listening());
        assert_eq!(session.pump(), 0);
        assert_eq!(session.label(), "Idle");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_asset_keeps_label() {
        let player = SharedPlayer { missing: vec![SoundId::IDLE], ..Default::default() };
        let readings = vec![SensorReading::Sample(s(0.3)), SensorReading::Sample(s(0.0))];
        let mut session = Session::new(scripted(readings), player);
        session.start();
        run_to_end(&mut session);
        assert_eq!(session.label(), "Accelerating");
    }

    #[test]
    fn subscribers_follow_published_state() {
        let labels = Arc::new(Mutex::new(Vec::new()));
        let readings = [0.3, 0.7, 0.05].into_iter().map(|x| SensorReading::Sample(s(x))).collect();
        let mut session = Session::new(scripted(readings), SharedPlayer::default());
        let l = Arc::clone(&labels);
        session.subscribe(move |state| l.lock().unwrap().push(state.label()));
        session.start();
        run_to_end(&mut session);
        assert_eq!(*labels.lock().unwrap(), vec!["Accelerating", "Decelerating", "Idle"]);
    }

    #[test]
    fn drop_stops_sampling_and_audio() {
        let player = SharedPlayer::default();
        let log = Arc::clone(&player.log);
        let readings = (0..500).map(|_| SensorReading::Sample(s(0.3))).collect();
        {
            let mut session = Session::new(scripted(readings), player);
            session.start();
            let deadline = Instant::now() + Duration::from_secs(2);
            while session.pump() == 0 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
        }
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("stop"));
    }

    #[test]
    fn stop_keeps_loop_playing() {
        let player = SharedPlayer::default();
        let log = Arc::clone(&player.log);
        let readings = (0..500).map(|_| SensorReading::Sample(s(0.3))).collect();
        let mut session = Session::new(scripted(readings), player);
        session.start();
        let deadline = Instant::now() + Duration::from_secs(2);
        while session.pump() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        session.stop();
        assert!(!session.is_listening());
        assert_eq!(*log.lock().unwrap(), vec!["play engine_accelerating"]);
    }

    #[test]
    fn works_with_audio_thread() {
        let dir = tempfile::tempdir().unwrap();
        for state in EngineState::ALL {
            std::fs::write(dir.path().join(state.sound().file_name()), b"ID3").unwrap();
        }
        let player = AudioPlayer::spawn(AssetCatalog::new(dir.path()), Backend::Null);
        let readings = [0.0, 0.2, 0.9].into_iter().map(|x| SensorReading::Sample(s(x))).collect();
        let mut session = Session::new(scripted(readings), player);
        session.start();
        run_to_end(&mut session);
        assert_eq!(session.state(), EngineState::Decelerating);
    }
}
