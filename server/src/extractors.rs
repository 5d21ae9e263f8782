//! Custom Axum extractors.
//!
//! `ClientIp` attributes each scan to the gate device that sent it, and
//! `AdminSession` guards the admin endpoints behind a bearer token.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::net::{IpAddr, Ipv4Addr};

use crate::error::AppError;
use crate::server::AppState;

/// Scanner identity recorded with every admission.
///
/// The gate service sits behind a reverse proxy, so the address comes
/// from proxy headers; a request carrying none reads as loopback.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

impl ClientIp {
    /// Proxy headers consulted in order of trust. `X-Forwarded-For`
    /// lists hop addresses and the first entry is the client.
    const PROXY_HEADERS: [&'static str; 2] = ["x-forwarded-for", "x-real-ip"];

    fn from_headers(headers: &HeaderMap) -> Self {
        let advertised = Self::PROXY_HEADERS.iter().find_map(|name| {
            let raw = headers.get(*name)?.to_str().ok()?;
            raw.split(',').next()?.trim().parse::<IpAddr>().ok()
        });
        Self(advertised.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Authenticated admin session.
///
/// Extracts the bearer token from the `Authorization` header and checks
/// it against the live session registry. Handlers that take this
/// extractor reject unauthenticated requests with 401 before running.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// The bearer token that authenticated this request.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;

        if !state.sessions.validate(token).await {
            return Err(AppError::unauthorized("Invalid or expired session"));
        }

        Ok(Self {
            token: token.to_string(),
        })
    }
}
