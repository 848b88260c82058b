//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Sign of a vote
///
/// Serialized as the bare integer `1` or `-1`. Conversion from any other
/// integer fails, so an out-of-range value never reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Polarity {
    Up,
    Down,
}

impl Polarity {
    pub fn value(self) -> i64 {
        match self {
            Polarity::Up => 1,
            Polarity::Down => -1,
        }
    }
}

impl From<Polarity> for i64 {
    fn from(polarity: Polarity) -> Self {
        polarity.value()
    }
}

impl TryFrom<i64> for Polarity {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Polarity::Up),
            -1 => Ok(Polarity::Down),
            other => Err(Error::InvalidInput(format!(
                "polarity must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

/// A recorded vote; immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub track_identity: String,
    pub identity: String,
    pub polarity: Polarity,
    pub created_at: NaiveDateTime,
}

/// Up/down counts for one track, computed on demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub up_count: i64,
    pub down_count: i64,
}

/// Whether an identity has voted on a track, and which way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
    pub polarity: Option<Polarity>,
}

impl VoteStatus {
    pub fn not_voted() -> Self {
        Self::default()
    }

    pub fn voted(polarity: Polarity) -> Self {
        Self {
            has_voted: true,
            polarity: Some(polarity),
        }
    }
}
