//! Error types for the sensor side and the application shell.
//!
//! Playback errors live in `engine_core` next to the player contract.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    /// The capability is absent; sampling never begins.
    #[error("accelerometer is not available ({0})")]
    Unavailable(String),

    /// The source failed mid-session.
    #[error("accelerometer delivery failed: {0}")]
    Delivery(String),

    #[error("replay file {}: {source}", .path.display())]
    Replay {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
