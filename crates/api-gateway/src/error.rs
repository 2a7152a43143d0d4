//! HTTP error mapping
//!
//! Every handler error passes through here on its way out. The mapping is
//! deliberately lossy: storage details are logged and replaced with a
//! generic message, and token failures collapse into one authentication
//! message so a caller cannot tell a bad signature from a missing session.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use common::error::Error;

/// Result type for request handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A domain error on its way into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// The JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::IncompleteCredentials | Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.0.to_string())
            }
            Error::InvalidToken | Error::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, Error::Unauthenticated.to_string())
            }
            Error::Unauthorized => (StatusCode::FORBIDDEN, self.0.to_string()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            Error::RoleAlreadyHeld(_) => (StatusCode::CONFLICT, self.0.to_string()),
            Error::ExpiredToken => (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string()),
            Error::Storage(detail) => {
                error!("Storage failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::RoleId;

    fn status_of(err: Error) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn credential_failures_are_unauthorized() {
        assert_eq!(
            status_of(Error::IncompleteCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(Error::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn token_failures_collapse_into_one_message() {
        let invalid = ApiError(Error::InvalidToken).into_response();
        let missing = ApiError(Error::Unauthenticated).into_response();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn the_rest_of_the_taxonomy() {
        assert_eq!(status_of(Error::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(Error::NotFound("Member with id 9".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::RoleAlreadyHeld(RoleId(5))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::ExpiredToken),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_details_never_leak() {
        let response =
            ApiError(Error::Storage("unreachable table members".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
