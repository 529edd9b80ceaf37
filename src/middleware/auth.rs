//! Authentication filter and request identity.
//!
//! The filter runs once per request, before every handler. It only
//! annotates: a valid Bearer token binds a verified identity, the
//! deprecated `User-Id` header binds an explicitly unverified one, and
//! anything else binds nothing. The request always proceeds; rejection
//! happens at the `Identity` extractor when a handler demands a caller.

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::token;
use crate::config;
use crate::error::ApiError;

/// Identity bound to a request by the authentication filter.
///
/// The two variants are deliberately separate: `LegacyHeader` carries a
/// caller-asserted id with no proof, and nothing downstream is allowed
/// to treat it as verified.
#[derive(Clone, Debug)]
pub enum RequestIdentity {
    /// Established from a validated Bearer token.
    Bearer { user_id: i64, username: String },
    /// Deprecated `User-Id` header fallback. Unverified; any caller can
    /// assert any id. Kept only for pre-JWT clients.
    LegacyHeader { user_id: i64 },
}

impl RequestIdentity {
    pub fn user_id(&self) -> i64 {
        match self {
            RequestIdentity::Bearer { user_id, .. } => *user_id,
            RequestIdentity::LegacyHeader { user_id } => *user_id,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            RequestIdentity::Bearer { username, .. } => Some(username),
            RequestIdentity::LegacyHeader { .. } => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, RequestIdentity::Bearer { .. })
    }
}

/// Fail-open authentication filter. Never produces a response itself.
pub async fn identity_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(identity) = resolve_identity(&headers) {
        // First binding wins; nothing upstream inserts one today
        if request.extensions().get::<RequestIdentity>().is_none() {
            request.extensions_mut().insert(identity);
        }
    }

    next.run(request).await
}

fn resolve_identity(headers: &HeaderMap) -> Option<RequestIdentity> {
    if let Some(candidate) = extract_bearer(headers) {
        return match token::validate_token(candidate) {
            Ok(claims) => Some(RequestIdentity::Bearer {
                user_id: claims.uid,
                username: claims.sub,
            }),
            Err(e) => {
                // Invalid and missing tokens are equivalent downstream
                debug!("token rejected: {}", e);
                None
            }
        };
    }

    if config::config().security.allow_user_id_header {
        if let Some(raw) = headers.get("User-Id").and_then(|v| v.to_str().ok()) {
            if let Ok(user_id) = raw.trim().parse::<i64>() {
                warn!(
                    user_id,
                    "deprecated unauthenticated User-Id header accepted; migrate to Bearer tokens"
                );
                return Some(RequestIdentity::LegacyHeader { user_id });
            }
        }
    }

    None
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extractor handlers use to require a caller. Identity flows from here
/// into services as an explicit parameter; there is no ambient context.
#[derive(Clone, Debug)]
pub struct Identity(pub RequestIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(Identity)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
