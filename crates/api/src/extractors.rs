//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use ecowatch_common::AppError;

use crate::middleware::AppState;

/// Header carrying the caller-supplied identity.
pub const IDENTITY_HEADER: &str = "x-identity";

/// Caller identity taken from the `X-Identity` header. Not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or_else(|| AppError::Validation("X-Identity header is required".to_string()))
    }
}

/// Compare two tokens in time independent of where they first differ.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Caller holding the configured admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(AppError::Forbidden(
                "administrative endpoints are disabled".to_string(),
            ));
        };

        let presented = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if tokens_match(token, expected) => Ok(Self),
            _ => Err(AppError::Unauthorized),
        }
    }
}
