//! Now-playing metadata model
//!
//! The stream's metadata feed is polled by clients; each poll yields a
//! [`NowPlaying`] snapshot. [`NowPlayingSession`] carries the state between
//! polls (which track was last shown) so callers can tell when the track
//! changed and the vote widget needs to be refreshed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::track_identity::track_identity;
use crate::{Error, Result};

/// One snapshot of the metadata feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl NowPlaying {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
        }
    }

    /// Parse a metadata feed response body
    ///
    /// Unknown fields are ignored and missing artist/title default to empty.
    pub fn from_feed_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::InvalidInput(format!("Malformed now-playing metadata: {}", e)))
    }

    /// Voting key for this track
    pub fn track_identity(&self) -> String {
        track_identity(&self.artist, &self.title)
    }

    /// Human-readable "Artist - Title" line
    pub fn display_line(&self) -> String {
        let artist = self.artist.trim();
        let title = self.title.trim();

        match (artist.is_empty(), title.is_empty()) {
            (false, false) => format!("{} - {}", artist, title),
            (false, true) => artist.to_string(),
            (true, false) => title.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Polling context for a single listener view
///
/// Holds the track identity observed by the previous poll.
#[derive(Debug, Default)]
pub struct NowPlayingSession {
    current: Option<NowPlaying>,
    current_identity: Option<String>,
}

impl NowPlayingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly polled snapshot
    ///
    /// Returns `true` when the track differs from the previous poll (by
    /// track identity), including the very first observation.
    pub fn observe(&mut self, now_playing: NowPlaying) -> bool {
        let identity = now_playing.track_identity();
        let changed = self.current_identity.as_deref() != Some(identity.as_str());

        if changed {
            debug!(
                "Track changed: {:?} -> {}",
                self.current_identity, identity
            );
        }

        self.current_identity = Some(identity);
        self.current = Some(now_playing);
        changed
    }

    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }

    pub fn current_track_identity(&self) -> Option<&str> {
        self.current_identity.as_deref()
    }
}
