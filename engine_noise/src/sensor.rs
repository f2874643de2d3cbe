//! Accelerometer sources and the listener that owns their subscription.
//!
//! A [`SensorSource`] runs on its own thread and pushes [`SensorReading`]s
//! into an `mpsc` channel. The [`SensorListener`] owns that thread and the
//! receiving end; the application drains it once per frame, so every sample
//! is classified on the same context, one at a time.
//!
//! Consumers don't need to know whether samples come from the keyboard
//! simulator, a replay file, or a scripted list.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine_core::AccelerationSample;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::SensorError;

/// Fixed sampling interval (0.1 s).
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Longest a source sleeps before re-checking its stop flag.
const STOP_POLL: Duration = Duration::from_millis(10);

// ════════════════════════════════════════════════════════════════════════════
// SensorReading
// ════════════════════════════════════════════════════════════════════════════

/// What a source delivers each interval: a sample, or the error that ends
/// the session.
#[derive(Debug)]
pub enum SensorReading {
    Sample(AccelerationSample),
    Error(SensorError),
}

// ════════════════════════════════════════════════════════════════════════════
// SensorSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SensorReading`]s over a channel.
pub trait SensorSource: Send + 'static {
    fn name(&self) -> &str;

    /// Whether the capability exists at all. Checked by
    /// [`SensorListener::start`] before spawning.
    fn is_available(&self) -> bool { true }

    /// Deliver readings every `interval` until `stop` is set, the receiver
    /// hangs up, or the source runs dry. A source returns right after
    /// sending an [`SensorReading::Error`].
    fn run(&mut self, interval: Duration, tx: &Sender<SensorReading>, stop: &AtomicBool);
}

/// Sleep for `interval` in short slices. Returns false if `stop` was raised.
fn pace(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_POLL));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSensorSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    Preset(SimPreset),
    /// Add `delta` to one axis of the simulated vector.
    Nudge { axis: Axis, delta: f64 },
    /// Make the sensor report a delivery error on its next tick.
    Fault,
}

/// One canned vector per engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPreset {
    Still,   // 1
    Cruise,  // 2
    Hard,    // 3
}

impl SimPreset {
    pub fn sample(&self) -> AccelerationSample {
        match self {
            SimPreset::Still  => AccelerationSample::new(0.0, 0.0, 0.0),
            SimPreset::Cruise => AccelerationSample::new(0.3, 0.0, 0.0),
            SimPreset::Hard   => AccelerationSample::new(1.0, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis { X, Y, Z }

/// Sensor source driven by [`SimInput`] events from the visualizer window.
///
/// It holds a current vector and re-emits it every interval, so holding a
/// preset behaves like a device sitting in one bucket.
pub struct SimSensorSource {
    rx:      Receiver<SimInput>,
    current: AccelerationSample,
}

impl SimSensorSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimSensorSource { rx, current: SimPreset::Still.sample() }
    }

    /// Create a source plus the sender the window will feed.
    pub fn channel() -> (Sender<SimInput>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, SimSensorSource::new(rx))
    }

    pub fn current(&self) -> AccelerationSample { self.current }

    /// Apply one input. Returns true when it asks for a fault.
    fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Preset(p) => self.current = p.sample(),
            SimInput::Nudge { axis, delta } => match axis {
                Axis::X => self.current.x += delta,
                Axis::Y => self.current.y += delta,
                Axis::Z => self.current.z += delta,
            },
            SimInput::Fault => return true,
        }
        false
    }
}

impl SensorSource for SimSensorSource {
    fn name(&self) -> &str { "simulator" }

    fn run(&mut self, interval: Duration, tx: &Sender<SensorReading>, stop: &AtomicBool) {
        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => {
                        if self.apply(input) {
                            // Inputs queued behind the fault belong to the failed session.
                            while self.rx.try_recv().is_ok() {}
                            let err = SensorError::Delivery("simulated sensor fault".into());
                            let _ = tx.send(SensorReading::Error(err));
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    // Window closed.
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if tx.send(SensorReading::Sample(self.current)).is_err() { return; }
            if !pace(interval, stop) { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySensorSource — CSV file of x,y,z rows
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct ReplayRow {
    x: f64,
    y: f64,
    z: f64,
}

/// Replays a recorded session from a CSV file with an `x,y,z` header.
/// Extra columns (timestamps, labels) are ignored.
///
/// The source is unavailable when the file does not exist. A row that
/// fails to parse ends the session with a delivery error.
pub struct ReplaySensorSource {
    path:        PathBuf,
    loop_replay: bool,
}

impl ReplaySensorSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReplaySensorSource { path: path.into(), loop_replay: false }
    }

    /// Start over from the first row when the file is exhausted.
    pub fn looping(mut self, loop_replay: bool) -> Self {
        self.loop_replay = loop_replay;
        self
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>, SensorError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|source| SensorError::Replay { path: self.path.clone(), source })
    }
}

impl SensorSource for ReplaySensorSource {
    fn name(&self) -> &str { "replay" }

    fn is_available(&self) -> bool { self.path.is_file() }

    fn run(&mut self, interval: Duration, tx: &Sender<SensorReading>, stop: &AtomicBool) {
        loop {
            let mut reader = match self.reader() {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(SensorReading::Error(e));
                    return;
                }
            };

            let mut rows = 0usize;
            for result in reader.deserialize::<ReplayRow>() {
                if stop.load(Ordering::SeqCst) { return; }
                let reading = match result {
                    Ok(row) => SensorReading::Sample(AccelerationSample::new(row.x, row.y, row.z)),
                    Err(source) => {
                        let err = SensorError::Replay { path: self.path.clone(), source };
                        let _ = tx.send(SensorReading::Error(err));
                        return;
                    }
                };
                if tx.send(reading).is_err() { return; }
                rows += 1;
                if !pace(interval, stop) { return; }
            }

            debug!(rows, path = %self.path.display(), "replay pass finished");
            if !self.loop_replay || rows == 0 {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSensorSource — fixed readings
// ════════════════════════════════════════════════════════════════════════════

/// Delivers a fixed list of readings, one per interval, then finishes.
///
/// Stopping part-way keeps the undelivered readings for the next start.
pub struct ScriptedSensorSource {
    readings:  VecDeque<SensorReading>,
    available: bool,
}

impl ScriptedSensorSource {
    pub fn new(readings: impl IntoIterator<Item = SensorReading>) -> Self {
        ScriptedSensorSource { readings: readings.into_iter().collect(), available: true }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = AccelerationSample>) -> Self {
        Self::new(samples.into_iter().map(SensorReading::Sample))
    }

    /// A source that reports itself as missing.
    pub fn unavailable() -> Self {
        ScriptedSensorSource { readings: VecDeque::new(), available: false }
    }
}

impl SensorSource for ScriptedSensorSource {
    fn name(&self) -> &str { "scripted" }

    fn is_available(&self) -> bool { self.available }

    fn run(&mut self, interval: Duration, tx: &Sender<SensorReading>, stop: &AtomicBool) {
        while !stop.load(Ordering::SeqCst) {
            let Some(reading) = self.readings.pop_front() else { return };
            let fatal = matches!(reading, SensorReading::Error(_));
            if tx.send(reading).is_err() || fatal { return; }
            if !pace(interval, stop) { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SensorListener
// ════════════════════════════════════════════════════════════════════════════

/// A running source: its thread, its channel and its stop flag.
/// The thread hands the source back when it finishes.
struct Subscription {
    stop:   Arc<AtomicBool>,
    rx:     Receiver<SensorReading>,
    thread: JoinHandle<Box<dyn SensorSource>>,
}

enum Halt {
    Failed(SensorError),
    Finished,
}

/// Owns one sensor source and, while sampling, its subscription.
pub struct SensorListener {
    source:   Option<Box<dyn SensorSource>>,
    name:     String,
    interval: Duration,
    running:  Option<Subscription>,
}

impl SensorListener {
    pub fn new<S: SensorSource>(source: S) -> Self {
        Self::from_box(Box::new(source))
    }

    pub fn from_box(source: Box<dyn SensorSource>) -> Self {
        SensorListener {
            name:     source.name().to_string(),
            source:   Some(source),
            interval: SAMPLE_INTERVAL,
            running:  None,
        }
    }

    /// Override the sampling interval. Used by tests to run scripts quickly.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration { self.interval }

    pub fn is_running(&self) -> bool { self.running.is_some() }

    /// Begin sampling.
    ///
    /// Logs and returns without sampling if the source is unavailable.
    /// Calling `start` while already running is a no-op.
    pub fn start(&mut self) {
        if self.running.is_some() {
            debug!(source = %self.name, "accelerometer already running; start ignored");
            return;
        }
        let Some(mut source) = self.source.take() else {
            error!(source = %self.name, "sensor source was lost; cannot start");
            return;
        };
        if !source.is_available() {
            let err = SensorError::Unavailable(self.name.clone());
            warn!(error = %err, "not starting accelerometer updates");
            self.source = Some(source);
            return;
        }

        let (tx, rx) = mpsc::channel::<SensorReading>();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let interval = self.interval;

        let thread = thread::spawn(move || {
            source.run(interval, &tx, &flag);
            source
        });

        info!(source = %self.name, interval_ms = interval.as_millis() as u64, "accelerometer updates started");
        self.running = Some(Subscription { stop, rx, thread });
    }

    /// Halt sampling and reclaim the source. No-op when not running.
    pub fn stop(&mut self) {
        let Some(sub) = self.running.take() else { return };
        sub.stop.store(true, Ordering::SeqCst);
        drop(sub.rx);
        match sub.thread.join() {
            Ok(source) => self.source = Some(source),
            Err(_) => error!(source = %self.name, "sensor thread panicked; source dropped"),
        }
        info!(source = %self.name, "accelerometer updates stopped");
    }

    /// Take every pending sample without blocking.
    ///
    /// An error reading stops sampling; anything queued after it is
    /// discarded. A source that finished on its own is reaped here too.
    pub fn drain(&mut self) -> Vec<AccelerationSample> {
        let mut out = Vec::new();
        let mut halt = None;

        if let Some(sub) = &self.running {
            loop {
                match sub.rx.try_recv() {
                    Ok(SensorReading::Sample(s)) => out.push(s),
                    Ok(SensorReading::Error(e)) => { halt = Some(Halt::Failed(e)); break; }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => { halt = Some(Halt::Finished); break; }
                }
            }
        }

        match halt {
            Some(Halt::Failed(e)) => {
                error!(source = %self.name, error = %e, "accelerometer error; stopping updates");
                self.stop();
            }
            Some(Halt::Finished) => {
                info!(source = %self.name, "sensor source finished");
                self.stop();
            }
            None => {}
        }
        out
    }
}

impl Drop for SensorListener {
    fn drop(&mut self) { self.stop(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
