//! Route table

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, members};
use crate::state::AppState;

/// Builds the router, mounted under the configured API path
pub fn router(state: Arc<AppState>) -> Router {
    let api_path = state.api_path.clone();

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", patch(auth::change_password))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route(
            "/members/permissions",
            get(members::list_permissions)
                .post(members::grant_permission)
                .delete(members::revoke_permission),
        )
        .route("/members/:id/permissions", get(members::member_permissions))
        .route(
            "/members/directors",
            get(members::list_directors).post(members::start_term),
        )
        .route("/members/directors/:role_id", delete(members::end_term))
        .with_state(state);

    // Credentialed CORS cannot use wildcards, so the origin is mirrored
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .nest(&api_path, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
