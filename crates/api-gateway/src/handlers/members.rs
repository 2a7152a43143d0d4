//! Permission and director term handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::models::{Permission, PermissionClaim, RoleAssignment};
use common::types::{catalog, MemberId, PermissionId, RoleId};
use security::guard;
use security::PermissionCheck;

use crate::error::ApiResult;
use crate::extract::AuthSession;
use crate::state::AppState;

/// `GET /members/permissions`
///
/// The catalog is visible to any member holding at least one permission.
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> ApiResult<Json<Vec<Permission>>> {
    guard::require_any(&session, &catalog::ALL_PERMISSIONS)?;
    let permissions = state.permissions.all_permissions().await?;
    Ok(Json(permissions))
}

#[derive(Debug, Serialize)]
pub struct MemberPermissionsResponse {
    pub member_id: MemberId,
    pub permissions: Vec<PermissionClaim>,
    pub roles: Vec<RoleId>,
}

/// `GET /members/:id/permissions`
///
/// Members see their own effective permissions; seeing someone else's
/// takes member administration.
pub async fn member_permissions(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(member_id): Path<MemberId>,
) -> ApiResult<Json<MemberPermissionsResponse>> {
    guard::require_self_or_permission(
        &session,
        member_id,
        &[catalog::MEMBER_ADMINISTRATION, catalog::ADMIN],
        PermissionCheck::Any,
    )?;

    let effective = state
        .aggregator
        .effective_permissions(member_id, Utc::now())
        .await?;
    Ok(Json(MemberPermissionsResponse {
        member_id,
        permissions: effective.permissions,
        roles: effective.roles,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub member_id: MemberId,
    pub permission_id: PermissionId,
}

/// `POST /members/permissions`
///
/// Authority comes from the delegation rule, evaluated against the actor's
/// current permissions rather than the ones baked into the session token.
pub async fn grant_permission(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<GrantRequest>,
) -> ApiResult<StatusCode> {
    let actor = state
        .aggregator
        .effective_permissions(session.member_id, Utc::now())
        .await?;
    state
        .delegation
        .grant(&actor, request.member_id, request.permission_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /members/permissions`
pub async fn revoke_permission(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<GrantRequest>,
) -> ApiResult<StatusCode> {
    let actor = state
        .aggregator
        .effective_permissions(session.member_id, Utc::now())
        .await?;
    state
        .delegation
        .revoke(&actor, request.member_id, request.permission_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DirectorsQuery {
    /// Restrict the listing to currently active terms
    #[serde(default)]
    pub current: bool,
}

/// `GET /members/directors`
pub async fn list_directors(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<DirectorsQuery>,
) -> ApiResult<Json<Vec<RoleAssignment>>> {
    guard::require_any(&session, &catalog::ALL_PERMISSIONS)?;

    let mut assignments = state.roles.all_assignments().await?;
    if query.current {
        let now = Utc::now();
        assignments.retain(|a| a.contains(now));
    }
    Ok(Json(assignments))
}

#[derive(Debug, Deserialize)]
pub struct StartTermRequest {
    pub member_id: MemberId,
    pub role_id: RoleId,
    /// Start of the term; defaults to now
    pub from: Option<DateTime<Utc>>,
}

/// `POST /members/directors`
pub async fn start_term(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<StartTermRequest>,
) -> ApiResult<StatusCode> {
    guard::require_all(&session, &[catalog::ADMIN])?;
    let from = request.from.unwrap_or_else(Utc::now);
    state
        .terms
        .start_term(request.member_id, request.role_id, from)
        .await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /members/directors/:role_id`
pub async fn end_term(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(role_id): Path<RoleId>,
) -> ApiResult<StatusCode> {
    guard::require_all(&session, &[catalog::ADMIN])?;
    state.terms.end_term_now(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
