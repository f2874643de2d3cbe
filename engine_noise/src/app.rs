//! Application wiring: configuration, the windowed loop and a headless loop.
//!
//! Both loops build the same pieces: an [`AudioPlayer`] on its own thread,
//! a [`SensorListener`] over the configured source, and a [`Session`] that
//! owns them. Samples are drained and classified on the loop's own thread.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use engine_core::EngineState;
use tracing::{info, warn};

use crate::error::AppError;
use crate::player::{AssetCatalog, AudioPlayer, Backend};
use crate::sensor::{ReplaySensorSource, SensorListener, SensorSource, SimInput, SimSensorSource, SAMPLE_INTERVAL};
use crate::session::Session;
use crate::visualizer::{UiAction, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where acceleration samples come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SensorKind {
    /// Keyboard-driven simulator in the display window.
    Sim,
    /// Recorded `x,y,z` rows.
    Replay { path: PathBuf, loop_replay: bool },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub sensor:  SensorKind,
    /// Directory holding the three `engine_*.mp3` files.
    pub assets:  PathBuf,
    pub backend: Backend,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            sensor:  SensorKind::Sim,
            assets:  PathBuf::from("assets"),
            backend: Backend::Device,
        }
    }
}

impl AppConfig {
    /// Headless runs have no window to drive the simulator from.
    pub fn validate_headless(&self) -> Result<(), AppError> {
        match self.sensor {
            SensorKind::Sim => Err(AppError::Config(
                "headless mode needs a replay sensor (--sensor replay --replay <file>)".into(),
            )),
            SensorKind::Replay { .. } => Ok(()),
        }
    }
}

/// Build the sensor source. The simulator also returns the sender its
/// window feeds.
fn build_source(kind: &SensorKind) -> (Option<Sender<SimInput>>, Box<dyn SensorSource>) {
    match kind {
        SensorKind::Sim => {
            let (tx, source) = SimSensorSource::channel();
            (Some(tx), Box::new(source))
        }
        SensorKind::Replay { path, loop_replay } => {
            (None, Box::new(ReplaySensorSource::new(path.clone()).looping(*loop_replay)))
        }
    }
}

fn build_player(cfg: &AppConfig) -> AudioPlayer {
    let catalog = AssetCatalog::new(cfg.assets.clone());
    for sound in catalog.missing() {
        warn!(%sound, path = %catalog.path_for(sound).display(), "sound file not found");
    }
    AudioPlayer::spawn(catalog, cfg.backend)
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the windowed loop
// ════════════════════════════════════════════════════════════════════════════

/// Open the window, start sampling, and run until the window closes.
///
/// Sampling starts when the window opens and stops when it closes.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let (sim_tx, source) = build_source(&cfg.sensor);
    let mut vis = Visualizer::new(sim_tx)?;

    let player = build_player(&cfg);
    let mut session = Session::new(SensorListener::from_box(source), player);
    session.start();

    let mut status = if session.is_listening() {
        String::from("READY")
    } else {
        String::from("ACCELEROMETER NOT AVAILABLE")
    };

    while vis.is_open() {
        match vis.poll_input() {
            UiAction::Quit => break,
            UiAction::ToggleListening => {
                if session.is_listening() {
                    session.stop();
                    status = String::from("PAUSED");
                } else {
                    session.start();
                    status = String::from("RESUMED");
                }
            }
            UiAction::Continue => {}
        }

        let was_listening = session.is_listening();
        session.pump();
        if was_listening && !session.is_listening() {
            status = String::from("SENSOR STOPPED");
        }

        vis.render(session.state(), session.last_magnitude(), session.is_listening(), &status);
    }

    session.shutdown();
    info!(state = %session.state(), "window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// run_headless() — no window, labels go to the log
// ════════════════════════════════════════════════════════════════════════════

/// Run without a window until the sensor stops. Returns the final state.
pub fn run_headless(cfg: AppConfig) -> Result<EngineState, AppError> {
    cfg.validate_headless()?;
    let (_, source) = build_source(&cfg.sensor);

    let player = build_player(&cfg);
    let mut session = Session::new(SensorListener::from_box(source), player);
    session.subscribe(|state| info!(label = state.label(), "current state"));
    session.start();

    let mut handled = 0usize;
    while session.is_listening() {
        handled += session.pump();
        thread::sleep(SAMPLE_INTERVAL / 2);
    }

    session.shutdown();
    info!(samples = handled, state = %session.state(), "sensor stopped");
    Ok(session.state())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
