//! Session extraction
//!
//! Handlers that take an `AuthSession` argument only run for requests that
//! carry a verifiable session token. Any failure, missing token included,
//! rejects with the single indistinct authentication message.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use common::error::Error;
use common::models::SessionPayload;

use crate::cookie;
use crate::error::ApiError;
use crate::state::AppState;

/// The verified session of the current request
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionPayload);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            cookie::token_from_headers(&parts.headers).ok_or(ApiError(Error::Unauthenticated))?;

        // Expired and malformed tokens reject identically here; the token
        // module keeps them apart for the password-reset flow only.
        let payload = state
            .tokens
            .verify(&token)
            .map_err(|_| ApiError(Error::Unauthenticated))?;

        Ok(Self(payload))
    }
}
