//! Vote API
//!
//! - `GET  /api/votes/:track_identity`        tally for a track
//! - `GET  /api/votes/:track_identity/status` has the caller voted, and how
//! - `POST /api/votes`                        cast a vote
//!
//! The track identity is taken verbatim from the caller; the server never
//! recomputes it from artist/title.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use radiovote_common::db::{Polarity, Tally, VoteStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::identity::ClientIdentity;
use crate::AppState;

/// Tally response for `GET /api/votes/:track_identity`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResponse {
    pub track_identity: String,
    pub up_count: i64,
    pub down_count: i64,
}

/// Body of `POST /api/votes`
///
/// Fields are loosely typed so that missing and mistyped values surface as
/// validation errors with a useful message instead of a generic JSON rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    #[serde(default)]
    pub track_identity: Option<String>,
    #[serde(default)]
    pub polarity: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteResponse {
    pub success: bool,
    pub up_count: i64,
    pub down_count: i64,
}

impl From<Tally> for SubmitVoteResponse {
    fn from(tally: Tally) -> Self {
        Self {
            success: true,
            up_count: tally.up_count,
            down_count: tally.down_count,
        }
    }
}

/// GET /api/votes/:track_identity
pub async fn get_tally(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<TallyResponse>> {
    let track_identity = track_identity_from_path(path)?;
    let tally = state.ledger.tally(&track_identity).await?;

    Ok(Json(TallyResponse {
        track_identity,
        up_count: tally.up_count,
        down_count: tally.down_count,
    }))
}

/// GET /api/votes/:track_identity/status
///
/// A caller whose identity cannot be resolved has, by definition, not voted.
pub async fn get_vote_status(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    ClientIdentity(identity): ClientIdentity,
) -> ApiResult<Json<VoteStatus>> {
    let track_identity = track_identity_from_path(path)?;
    let status = match identity {
        Some(identity) => state.ledger.has_voted(&track_identity, &identity).await?,
        None => VoteStatus::not_voted(),
    };

    Ok(Json(status))
}

/// POST /api/votes
pub async fn submit_vote(
    State(state): State<AppState>,
    ClientIdentity(identity): ClientIdentity,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitVoteResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let track_identity = request
        .track_identity
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("trackIdentity is required".to_string()))?;

    let polarity = parse_polarity(request.polarity.as_ref())?;

    let identity = identity.ok_or_else(|| {
        warn!("Vote on {} refused: client identity unavailable", track_identity);
        ApiError::Validation("Unable to determine client identity".to_string())
    })?;

    let tally = state
        .ledger
        .submit(&track_identity, &identity, polarity)
        .await?;

    info!(
        "Vote {:+} on {} (now +{} -{})",
        polarity.value(),
        track_identity,
        tally.up_count,
        tally.down_count
    );

    Ok(Json(tally.into()))
}

/// Undecodable path segments (e.g. invalid UTF-8) become validation errors
fn track_identity_from_path(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    path.map(|Path(track_identity)| track_identity).map_err(|rejection| {
        ApiError::Validation(format!("Invalid trackIdentity: {}", rejection.body_text()))
    })
}

/// Accept exactly the JSON integers 1 and -1
fn parse_polarity(value: Option<&Value>) -> ApiResult<Polarity> {
    let value = match value {
        None | Some(Value::Null) => {
            return Err(ApiError::Validation("polarity is required".to_string()))
        }
        Some(value) => value,
    };

    let raw = value
        .as_i64()
        .ok_or_else(|| ApiError::Validation(format!("polarity must be 1 or -1, got {}", value)))?;

    Ok(Polarity::try_from(raw)?)
}

/// Build vote routes
pub fn vote_routes() -> Router<AppState> {
    Router::new()
        .route("/api/votes", post(submit_vote))
        .route("/api/votes/:track_identity", get(get_tally))
        .route("/api/votes/:track_identity/status", get(get_vote_status))
}
