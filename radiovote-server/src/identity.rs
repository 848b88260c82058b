//! Anonymous voter identity
//!
//! Listeners are not authenticated; a vote is keyed on an identity derived
//! from network-layer hints. Shared NAT, proxies and VPNs can merge distinct
//! listeners into one identity or split one listener into several. That is
//! the accepted cost of anonymous voting, so the derivation sits behind the
//! [`IdentityResolver`] trait rather than growing into fingerprinting.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::AppState;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Peer address set by a lower-level transport as a request extension
///
/// Consulted only when no socket-level `ConnectInfo` is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPeer(pub String);

/// Transport-level peer addresses known for a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerAddresses {
    /// Socket peer (axum `ConnectInfo<SocketAddr>`)
    pub socket: Option<SocketAddr>,
    /// Peer reported by the underlying connection object
    pub connection: Option<String>,
}

/// Strategy for deriving a voter identity from request metadata
pub trait IdentityResolver: Send + Sync + 'static {
    /// `None` when nothing usable is available
    fn resolve(&self, headers: &HeaderMap, peer: &PeerAddresses) -> Option<String>;
}

/// Default resolver: first non-empty of
/// 1. first token of `X-Forwarded-For` (trimmed)
/// 2. `X-Real-IP` (verbatim)
/// 3. socket peer IP
/// 4. connection peer address
///
/// No address syntax validation is done; whatever a proxy injects is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkIdentityResolver;

impl IdentityResolver for NetworkIdentityResolver {
    fn resolve(&self, headers: &HeaderMap, peer: &PeerAddresses) -> Option<String> {
        forwarded_for(headers)
            .or_else(|| real_ip(headers))
            .or_else(|| peer.socket.map(|addr| addr.ip().to_string()))
            .or_else(|| peer.connection.clone())
            .filter(|identity| !identity.is_empty())
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn real_ip(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_REAL_IP)?.to_str().ok()?;
    (!value.is_empty()).then(|| value.to_string())
}

/// Extractor yielding the resolved identity for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The ConnectInfo extractor also honours MockConnectInfo
        let socket = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr);
        let connection = parts
            .extensions
            .get::<ConnectionPeer>()
            .map(|peer| peer.0.clone());

        let peer = PeerAddresses { socket, connection };
        Ok(ClientIdentity(state.identity_resolver.resolve(&parts.headers, &peer)))
    }
}
