//! HTTP surface of the Member Portal
//!
//! This crate exposes the access-control core over a REST API. Every
//! protected route runs token verification, then the authorization guard,
//! then the handler; the three unauthenticated routes are login and the two
//! password-reset endpoints.

pub mod cookie;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use error::ApiError;
pub use extract::AuthSession;
pub use mailer::{LogMailer, Mailer};
pub use routes::router;
pub use state::AppState;
