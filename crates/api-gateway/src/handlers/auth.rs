//! Session and password handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use common::error::{Error, Result};
use common::models::{PasswordResetEntry, SessionPayload};
use security::CredentialVerifier;
use storage_adapter::transaction::{TaskValue, TransactionTask};

use crate::cookie;
use crate::error::ApiResult;
use crate::extract::AuthSession;
use crate::state::AppState;

/// Length of the random reset token before encoding
pub const RESET_TOKEN_BYTES: usize = 64;

/// Sleep window for reset requests against unknown addresses
const ENUMERATION_SLEEP_MIN_MS: u64 = 300;
const ENUMERATION_SLEEP_MAX_MS: u64 = 400;

/// Development-only response header echoing the fresh token
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let member = state
        .verifier
        .verify(&request.username, &request.password)
        .await?;
    let payload = state.session_for(&member).await?;
    let token = state.tokens.issue(&payload)?;

    let mut headers = HeaderMap::new();
    let session_cookie = cookie::session_cookie(
        &token,
        &state.api_path,
        state.token_ttl_secs,
        state.is_production,
    );
    headers.insert(SET_COOKIE, header_value(&session_cookie)?);
    if !state.is_production {
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), header_value(&token)?);
    }

    info!("Member {} logged in", member.id);
    Ok((headers, Json(payload)))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> ApiResult<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    let clearing = cookie::clearing_cookie(&state.api_path, state.is_production);
    headers.insert(SET_COOKIE, header_value(&clearing)?);

    debug!("Member {} logged out", session.member_id);
    Ok((StatusCode::NO_CONTENT, headers))
}

/// `GET /auth/me`
///
/// Re-reads permissions and roles from storage rather than trusting the
/// claims baked into the token at login time.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> ApiResult<Json<SessionPayload>> {
    let member = state
        .members
        .member_by_id(session.member_id)
        .await?
        .ok_or(Error::Unauthenticated)?;
    let payload = state.session_for(&member).await?;
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// `PATCH /auth/password`
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    if request.new_password.is_empty() {
        return Err(Error::IncompleteCredentials.into());
    }

    // The old password runs through the full verifier
    let member = state
        .verifier
        .verify(&session.username, &request.old_password)
        .await?;

    let hash = CredentialVerifier::hash_secret(&request.new_password)?;
    state.members.update_password_hash(member.id, &hash).await?;

    info!("Member {} changed their password", member.id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// `POST /auth/forgot-password`
///
/// Answers identically for known and unknown addresses; the unknown path
/// sleeps so response timing does not reveal which addresses exist.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    if request.email.is_empty() {
        return Err(Error::IncompleteCredentials.into());
    }

    match state.members.member_by_email(&request.email).await? {
        Some(member) => {
            let token = generate_reset_token();
            state
                .resets
                .create_entry(PasswordResetEntry {
                    email: member.email.clone(),
                    token: token.clone(),
                    created_at: Utc::now(),
                })
                .await?;
            state.mailer.send_password_reset(&member.email, &token).await?;
        }
        None => {
            let millis = {
                let mut rng = rand::thread_rng();
                rng.gen_range(ENUMERATION_SLEEP_MIN_MS..ENUMERATION_SLEEP_MAX_MS)
            };
            sleep(Duration::from_millis(millis)).await;
            debug!("Password reset requested for an unknown address");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// `POST /auth/reset-password`
///
/// The password update and the reset-entry cleanup commit atomically; a
/// failure in either leaves both untouched.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    if request.email.is_empty() || request.token.is_empty() || request.new_password.is_empty() {
        return Err(Error::IncompleteCredentials.into());
    }

    let entry = state
        .resets
        .entry_by_email_and_token(&request.email, &request.token)
        .await?
        .ok_or_else(|| Error::NotFound("Password reset entry".to_string()))?;
    if entry.is_expired(Utc::now()) {
        state.resets.delete_entries_by_email(&request.email).await?;
        return Err(Error::ExpiredToken.into());
    }

    let member = state
        .members
        .member_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::NotFound("Member for password reset".to_string()))?;
    let member_id = member.id;
    let hash = CredentialVerifier::hash_secret(&request.new_password)?;
    let email = request.email.clone();

    let update: TransactionTask = Box::new(move |tables, _| {
        tables.set_password_hash(member_id, &hash)?;
        Ok(TaskValue::None)
    });
    let cleanup: TransactionTask =
        Box::new(move |tables, _| Ok(TaskValue::Count(tables.delete_password_resets(&email))));
    state.coordinator.run_atomically(vec![update, cleanup]).await?;

    info!("Member {} completed a password reset", member_id);
    Ok(StatusCode::NO_CONTENT)
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Storage(format!("Invalid header value: {}", e)))
}
