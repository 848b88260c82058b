//! # radiovote Common Library
//!
//! Shared code for the radiovote server and its clients:
//! - Track identity derivation (the key that correlates metadata and votes)
//! - Now-playing metadata model and polling session context
//! - Vote ledger (SQLite-backed, one vote per listener per track)
//! - Database initialization
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod now_playing;
pub mod track_identity;

pub use error::{Error, Result};
pub use now_playing::{NowPlaying, NowPlayingSession};
pub use track_identity::{track_identity, TRACK_SEPARATOR};
