//! Common error types for radiovote

use thiserror::Error;

/// Common result type for radiovote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across radiovote crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The identity already has a vote recorded for this track
    #[error("Already voted on track {track_identity}")]
    AlreadyVoted { track_identity: String },
}

impl Error {
    /// True for rejections the caller can fix by correcting the request
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// True when a submission hit the one-vote-per-track constraint
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::AlreadyVoted { .. })
    }
}
