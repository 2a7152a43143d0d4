//! Credential verifier
//!
//! Checks a presented secret against a member's stored hash. A lookup miss
//! is padded with a randomized sleep so that "unknown user" and "wrong
//! secret" are indistinguishable by response timing.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;
use tracing::debug;

use common::error::{Error, Result};
use common::models::Member;
use storage_adapter::MemberStore;

/// Lower bound of the anti-enumeration sleep on a failed lookup
const LOOKUP_MISS_SLEEP_MIN_MS: u64 = 50;
/// Upper bound of the anti-enumeration sleep on a failed lookup
const LOOKUP_MISS_SLEEP_MAX_MS: u64 = 110;

/// Verifies presented credentials against stored secret hashes
pub struct CredentialVerifier {
    /// Member storage
    members: Arc<dyn MemberStore>,
}

impl CredentialVerifier {
    /// Creates a new credential verifier
    pub fn new(members: Arc<dyn MemberStore>) -> Self {
        Self { members }
    }

    /// Verifies a presented secret for the member with the given login name
    ///
    /// Empty input fails fast with `IncompleteCredentials` before any lookup.
    /// An unknown identifier and a wrong secret both fail with the same
    /// `InvalidCredentials`; the unknown-identifier path sleeps for a
    /// randomized 50-110 ms first so the two are indistinguishable by timing.
    pub async fn verify(&self, identifier: &str, secret: &str) -> Result<Member> {
        if identifier.is_empty() || secret.is_empty() {
            return Err(Error::IncompleteCredentials);
        }

        let member = match self.members.member_by_username(identifier).await? {
            Some(member) => member,
            None => {
                sleep_randomly(LOOKUP_MISS_SLEEP_MIN_MS, LOOKUP_MISS_SLEEP_MAX_MS).await;
                return Err(Error::InvalidCredentials);
            }
        };

        let parsed =
            PasswordHash::new(&member.password_hash).map_err(|_| Error::InvalidCredentials)?;
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .map_err(|_| Error::InvalidCredentials)?;

        debug!("Credentials verified for member {}", member.id);
        Ok(member)
    }

    /// Hashes a new secret for storage
    pub fn hash_secret(secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Storage(format!("Failed to hash secret: {}", e)))
    }
}

/// Sleeps for a randomized duration within `[min_ms, max_ms)`
async fn sleep_randomly(min_ms: u64, max_ms: u64) {
    let millis = rand::thread_rng().gen_range(min_ms..max_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::MemberStatus;
    use std::time::Instant;
    use storage_adapter::{ConnectionPool, Database, MemoryStore};

    async fn verifier_with_member(username: &str, secret: &str) -> CredentialVerifier {
        let pool = Arc::new(ConnectionPool::new(Arc::new(Database::new()), 4));
        let store = MemoryStore::new(pool.clone());

        let hash = CredentialVerifier::hash_secret(secret).unwrap();
        let conn = pool.acquire().await.unwrap();
        conn.write(|t| {
            t.insert_member(
                username.to_string(),
                format!("{}@example.org", username),
                hash,
                MemberStatus::Active,
            )
        })
        .unwrap();

        CredentialVerifier::new(Arc::new(store))
    }

    #[tokio::test]
    async fn empty_input_fails_fast_before_any_lookup() {
        let verifier = verifier_with_member("m.mustermann", "s3cret").await;

        let started = Instant::now();
        let outcome = verifier.verify("", "s3cret").await;
        assert!(matches!(outcome, Err(Error::IncompleteCredentials)));
        assert!(started.elapsed() < Duration::from_millis(40));

        assert!(matches!(
            verifier.verify("m.mustermann", "").await,
            Err(Error::IncompleteCredentials)
        ));
    }

    #[tokio::test]
    async fn correct_secret_returns_the_member() {
        let verifier = verifier_with_member("m.mustermann", "s3cret").await;
        let member = verifier.verify("m.mustermann", "s3cret").await.unwrap();
        assert_eq!(member.username, "m.mustermann");
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_user_fail_identically() {
        let verifier = verifier_with_member("m.mustermann", "s3cret").await;

        let wrong_secret = verifier.verify("m.mustermann", "wrong").await;
        let unknown_user = verifier.verify("nobody", "wrong").await;

        assert!(matches!(wrong_secret, Err(Error::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(Error::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_user_lookup_is_padded_by_the_randomized_sleep() {
        let verifier = verifier_with_member("m.mustermann", "s3cret").await;

        let started = Instant::now();
        let _ = verifier.verify("nobody", "whatever").await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(LOOKUP_MISS_SLEEP_MIN_MS));
    }

    #[tokio::test]
    async fn failure_latencies_fall_in_the_same_window() {
        let verifier = verifier_with_member("m.mustermann", "s3cret").await;

        let started = Instant::now();
        let _ = verifier.verify("m.mustermann", "wrong").await;
        let wrong_secret = started.elapsed();

        let started = Instant::now();
        let _ = verifier.verify("nobody", "wrong").await;
        let unknown_user = started.elapsed();

        assert!(unknown_user >= Duration::from_millis(LOOKUP_MISS_SLEEP_MIN_MS));
        // The hashing cost depends heavily on the build profile, so the
        // window is generous: neither failure path may take more than
        // twenty times as long as the other.
        let (fast, slow) = if wrong_secret < unknown_user {
            (wrong_secret, unknown_user)
        } else {
            (unknown_user, wrong_secret)
        };
        assert!(
            slow < fast * 20,
            "wrong secret took {:?}, unknown user took {:?}",
            wrong_secret,
            unknown_user
        );
    }

    #[test]
    fn hashing_the_same_secret_twice_salts_differently() {
        let first = CredentialVerifier::hash_secret("s3cret").unwrap();
        let second = CredentialVerifier::hash_secret("s3cret").unwrap();
        assert_ne!(first, second);
    }
}
