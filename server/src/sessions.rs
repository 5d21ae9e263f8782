//! In-memory admin session management.
//!
//! Sessions are bearer tokens held in process memory. A restart signs
//! every admin out, which is acceptable for a single-operator tool.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use gatekeeper_ticketing::generate_token;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Byte length of session tokens before encoding.
const SESSION_TOKEN_BYTES: usize = 32;

/// Admin session registry.
///
/// Issues bearer tokens against a configured password and validates
/// them until they expire. Expired sessions are dropped on access.
#[derive(Clone)]
pub struct AdminSessions {
    sessions: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    password: String,
    ttl: Duration,
}

impl AdminSessions {
    /// Create a session registry with the given admin password and
    /// session lifetime.
    #[must_use]
    pub fn new(password: String, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            password,
            ttl,
        }
    }

    /// Attempt a login. Returns the bearer token and its expiry on
    /// success, `None` if the password does not match.
    ///
    /// The comparison is constant-time to avoid leaking password
    /// length or prefix information through response timing.
    pub async fn login(&self, password: &str) -> Option<(String, DateTime<Utc>)> {
        if !constant_time_eq(password.as_bytes(), self.password.as_bytes()) {
            return None;
        }

        let token = generate_token(SESSION_TOKEN_BYTES);
        let expires_at = Utc::now() + self.ttl;

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, expiry| *expiry > Utc::now());
        sessions.insert(token.clone(), expires_at);

        Some((token, expires_at))
    }

    /// Check whether a token names a live session.
    pub async fn validate(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(expiry) if *expiry > Utc::now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Revoke a session. Revoking an unknown token is a no-op.
    pub async fn revoke(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn sessions() -> AdminSessions {
        AdminSessions::new("hunter2".to_string(), Duration::minutes(60))
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        assert!(sessions().login("letmein").await.is_none());
    }

    #[tokio::test]
    async fn test_login_issues_valid_token() {
        let sessions = sessions();
        let (token, expires_at) = sessions.login("hunter2").await.unwrap();

        assert!(expires_at > Utc::now());
        assert!(sessions.validate(&token).await);
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        assert!(!sessions().validate("nope").await);
    }

    #[tokio::test]
    async fn test_revoke_ends_session() {
        let sessions = sessions();
        let (token, _) = sessions.login("hunter2").await.unwrap();

        sessions.revoke(&token).await;
        assert!(!sessions.validate(&token).await);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let sessions = AdminSessions::new("hunter2".to_string(), Duration::minutes(-1));
        let (token, _) = sessions.login("hunter2").await.unwrap();

        assert!(!sessions.validate(&token).await);
    }
}
