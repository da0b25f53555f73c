//! Error types shared by the player engine, persistence, and browser glue.

use thiserror::Error;

/// Errors surfaced by playback, storage, and upload operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// The media element could not play the current track.
    #[error("Playback failed: {0}")]
    Playback(String),

    /// Writing a persisted value failed.
    #[error("Storage write failed for `{key}`: {message}")]
    Storage { key: String, message: String },

    /// A playable reference could not be created for the selected file.
    #[error("Could not open selected file: {0}")]
    MediaRef(String),

    /// A browser object the player depends on is missing.
    #[error("Browser {0} is unavailable")]
    Unavailable(&'static str),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
