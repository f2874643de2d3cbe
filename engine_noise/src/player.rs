//! Looping sound playback thread.
//!
//! The output device lives on its own thread and is driven by
//! [`PlayerCommand`]s. [`AudioPlayer::play`] waits for the thread's answer,
//! so the classifier knows whether the new loop started before it publishes
//! the new state.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use engine_core::{EngineState, PlaybackError, SoundId, SoundPlayer};
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// AssetCatalog — sound id → bundled file
// ════════════════════════════════════════════════════════════════════════════

/// Directory holding `engine_idle.mp3`, `engine_accelerating.mp3` and
/// `engine_decelerating.mp3`.
#[derive(Clone, Debug)]
pub struct AssetCatalog {
    root: PathBuf,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetCatalog { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn path_for(&self, sound: SoundId) -> PathBuf {
        self.root.join(sound.file_name())
    }

    pub fn resolve(&self, sound: SoundId) -> Result<PathBuf, PlaybackError> {
        let path = self.path_for(sound);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PlaybackError::AssetMissing { sound, path })
        }
    }

    /// Sounds with no file on disk.
    pub fn missing(&self) -> Vec<SoundId> {
        EngineState::ALL.iter()
            .map(|s| s.sound())
            .filter(|&sound| !self.path_for(sound).is_file())
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub enum PlayerCommand {
    /// Replace the current loop with `sound`; the outcome goes to `reply`.
    Play { sound: SoundId, reply: Sender<Result<(), PlaybackError>> },
    /// Silence the current loop.
    Stop,
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AudioOut — abstraction over rodio / null
// ════════════════════════════════════════════════════════════════════════════

/// Which output the playback thread should try to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// The default audio device (needs the `audio` feature).
    Device,
    /// No device: loops are tracked and logged only.
    Null,
}

trait AudioOut {
    fn name(&self) -> &'static str;
    /// Start looping `path`. On error the previous loop must keep playing.
    fn start_loop(&mut self, sound: SoundId, path: &Path) -> Result<(), PlaybackError>;
    fn stop(&mut self);
}

/// Only a file that is not there is a missing asset; anything else that
/// stops it opening is reported with the io error text.
#[cfg_attr(not(feature = "audio"), allow(dead_code))]
fn open_error(sound: SoundId, path: &Path, err: io::Error) -> PlaybackError {
    match err.kind() {
        io::ErrorKind::NotFound => PlaybackError::AssetMissing { sound, path: path.to_path_buf() },
        _ => PlaybackError::Decode { sound, reason: format!("cannot open {}: {}", path.display(), err) },
    }
}

// ── rodio backend ─────────────────────────────────────────────────────────

#[cfg(feature = "audio")]
struct RodioOut {
    _stream: rodio::OutputStream,
    handle:  rodio::OutputStreamHandle,
    sink:    Option<rodio::Sink>,
}

#[cfg(feature = "audio")]
impl RodioOut {
    fn open() -> Result<Self, PlaybackError> {
        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| PlaybackError::Init(e.to_string()))?;
        Ok(RodioOut { _stream: stream, handle, sink: None })
    }
}

#[cfg(feature = "audio")]
impl AudioOut for RodioOut {
    fn name(&self) -> &'static str { "rodio" }

    fn start_loop(&mut self, sound: SoundId, path: &Path) -> Result<(), PlaybackError> {
        use rodio::Source;
        use std::fs::File;
        use std::io::BufReader;

        let file = File::open(path).map_err(|e| open_error(sound, path, e))?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::Decode { sound, reason: e.to_string() })?;
        let sink = rodio::Sink::try_new(&self.handle)
            .map_err(|e| PlaybackError::Init(e.to_string()))?;

        sink.append(source.repeat_infinite());
        if let Some(previous) = self.sink.replace(sink) {
            previous.stop();
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

// ── null backend (no device, or built without `audio`) ────────────────────

#[derive(Default)]
struct NullOut {
    looping: Option<SoundId>,
}

impl AudioOut for NullOut {
    fn name(&self) -> &'static str { "null" }

    fn start_loop(&mut self, sound: SoundId, path: &Path) -> Result<(), PlaybackError> {
        debug!(%sound, path = %path.display(), "looping (null output)");
        self.looping = Some(sound);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sound) = self.looping.take() {
            debug!(%sound, "loop stopped (null output)");
        }
    }
}

/// Open the requested output, falling back to `NullOut` with a warning.
fn open_audio_output(backend: Backend) -> Box<dyn AudioOut> {
    match backend {
        Backend::Null => Box::new(NullOut::default()),
        #[cfg(feature = "audio")]
        Backend::Device => match RodioOut::open() {
            Ok(out) => Box::new(out),
            Err(e) => {
                warn!(error = %e, "cannot open audio device; using null output");
                Box::new(NullOut::default())
            }
        },
        #[cfg(not(feature = "audio"))]
        Backend::Device => {
            warn!("built without the `audio` feature; using null output");
            Box::new(NullOut::default())
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AudioPlayer — handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub struct AudioPlayer {
    cmd_tx: Sender<PlayerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl AudioPlayer {
    /// Spawn the playback thread. The output is opened on that thread.
    pub fn spawn(catalog: AssetCatalog, backend: Backend) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let thread = thread::spawn(move || player_thread(catalog, backend, cmd_rx));
        AudioPlayer { cmd_tx, thread: Some(thread) }
    }

    /// Start looping `sound`, replacing any current loop. Blocks until the
    /// playback thread has tried.
    pub fn play(&self, sound: SoundId) -> Result<(), PlaybackError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(PlayerCommand::Play { sound, reply: reply_tx })
            .map_err(|_| PlaybackError::Disconnected)?;
        reply_rx.recv().map_err(|_| PlaybackError::Disconnected)?
    }

    pub fn stop(&self) { let _ = self.cmd_tx.send(PlayerCommand::Stop); }
}

impl SoundPlayer for AudioPlayer {
    fn play(&mut self, sound: SoundId) -> Result<(), PlaybackError> { AudioPlayer::play(self, sound) }
    fn stop(&mut self) { AudioPlayer::stop(self) }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread(catalog: AssetCatalog, backend: Backend, cmd_rx: Receiver<PlayerCommand>) {
    let mut out = open_audio_output(backend);
    info!(output = out.name(), assets = %catalog.root().display(), "audio output ready");

    for cmd in cmd_rx {
        match cmd {
            PlayerCommand::Play { sound, reply } => {
                let result = catalog
                    .resolve(sound)
                    .and_then(|path| out.start_loop(sound, &path));
                let _ = reply.send(result);
            }
            PlayerCommand::Stop => out.stop(),
            PlayerCommand::Quit => break,
        }
    }
    out.stop();
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
