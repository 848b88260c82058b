//! radiovote-server library
//!
//! REST API for anonymous per-track voting on a live radio stream.

use axum::Router;
use radiovote_common::db::VoteLedger;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod identity;

pub use crate::error::{ApiError, ApiResult};
use crate::identity::{IdentityResolver, NetworkIdentityResolver};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Vote storage
    pub ledger: VoteLedger,
    /// Voter identity strategy
    pub identity_resolver: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Create state using the default network-based identity resolver
    pub fn new(ledger: VoteLedger) -> Self {
        Self::with_resolver(ledger, Arc::new(NetworkIdentityResolver))
    }

    pub fn with_resolver(ledger: VoteLedger, identity_resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            ledger,
            identity_resolver,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::vote_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
