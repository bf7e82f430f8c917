//! Client address resolution, honoring a configured reverse-proxy header.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::state::AppState;

/// Used when neither the proxy header nor the socket address is known.
pub const UNKNOWN_IP: &str = "unknown";

/// The caller's address as a string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Resolve from the proxy header when configured, else the peer address.
    pub fn resolve(headers: &HeaderMap, ip_header: Option<&str>, peer: Option<SocketAddr>) -> Self {
        let forwarded = ip_header
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, peer) {
            (Some(ip), _) => Self(ip.to_string()),
            (None, Some(addr)) => Self(addr.ip().to_string()),
            (None, None) => Self(UNKNOWN_IP.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract the client address from request parts.
pub fn client_ip(parts: &Parts, state: &AppState) -> ClientIp {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    ClientIp::resolve(
        &parts.headers,
        state.config.reverse_proxy.ip_header.as_deref(),
        peer,
    )
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(client_ip(parts, state))
    }
}
