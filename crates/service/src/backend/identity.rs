use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ServiceError;

/// Snapshot of the signed-in operator as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Opaque bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Successful password sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub identity: Identity,
    pub token: AccessToken,
}

/// Sign-in rejection. `message` is the provider's text, shown verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Identity provider abstraction (credential check and session issuance).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the token no longer identifies anyone.
    async fn current_identity(&self, token: &AccessToken) -> Result<Option<Identity>, ServiceError>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SignedIn, AuthError>;
    async fn sign_out(&self, token: &AccessToken) -> Result<(), ServiceError>;
}

/// In-memory identity provider for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

    #[derive(Default)]
    pub struct MockIdentityProvider {
        users: Mutex<HashMap<String, String>>,      // email -> password
        sessions: Mutex<HashMap<String, Identity>>, // token -> identity
        unavailable: AtomicBool,
        sign_in_calls: AtomicUsize,
    }

    impl MockIdentityProvider {
        pub fn with_user(email: &str, password: &str) -> Self {
            let p = Self::default();
            p.users.lock().unwrap().insert(email.to_string(), password.to_string());
            p
        }

        /// Make every call fail as if the provider were unreachable.
        pub fn set_unavailable(&self, down: bool) {
            self.unavailable.store(down, Ordering::SeqCst);
        }

        pub fn sign_in_calls(&self) -> usize {
            self.sign_in_calls.load(Ordering::SeqCst)
        }

        pub fn active_sessions(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }

        /// Issue a session directly, bypassing the password check.
        pub fn issue(&self, email: &str) -> AccessToken {
            let token = format!("tok-{}", uuid::Uuid::new_v4());
            let identity = Identity { id: format!("user-{email}"), email: Some(email.to_string()) };
            self.sessions.lock().unwrap().insert(token.clone(), identity);
            AccessToken::new(token)
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn current_identity(&self, token: &AccessToken) -> Result<Option<Identity>, ServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ServiceError::Transport("identity provider unreachable".into()));
            }
            Ok(self.sessions.lock().unwrap().get(token.as_str()).cloned())
        }

        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AuthError::new("Failed to fetch"));
            }
            let known = self.users.lock().unwrap().get(email).cloned();
            match known {
                Some(p) if p == password => {
                    let token = self.issue(email);
                    let identity = self.sessions.lock().unwrap()[token.as_str()].clone();
                    Ok(SignedIn { identity, token })
                }
                _ => Err(AuthError::new(INVALID_CREDENTIALS)),
            }
        }

        async fn sign_out(&self, token: &AccessToken) -> Result<(), ServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ServiceError::Transport("identity provider unreachable".into()));
            }
            self.sessions.lock().unwrap().remove(token.as_str());
            Ok(())
        }
    }
}
