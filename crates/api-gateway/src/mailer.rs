//! Outbound mail collaborator
//!
//! Actual delivery is out of scope here; the portal binary wires in the
//! logging implementation and deployments substitute a real transport.

use async_trait::async_trait;
use tracing::info;

use common::error::Result;

/// Sends the password reset mail
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a reset token to the given address
    async fn send_password_reset(&self, email: &str, token: &str) -> Result<()>;
}

/// Mailer that only logs, for development and tests
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, _token: &str) -> Result<()> {
        // The token itself stays out of the logs
        info!("Password reset requested for {}", email);
        Ok(())
    }
}
