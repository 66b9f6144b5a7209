use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, instrument, warn};

use crate::backend::{IdentityProvider, SignedIn};

/// Shown when the same email already has a sign-in awaiting the provider.
pub const SIGN_IN_IN_PROGRESS: &str = "A sign-in for this account is already in progress";

/// Emails with a sign-in awaiting the provider, shared by every login view
/// of one console.
#[derive(Clone, Default)]
pub struct SignInGate {
    pending: Arc<Mutex<HashSet<String>>>,
}

impl SignInGate {
    /// Claims `email` until the returned guard drops; `None` while another
    /// claim on it is held.
    pub fn begin(&self, email: &str) -> Option<PendingSignIn> {
        let key = email.trim().to_ascii_lowercase();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(key.clone()) {
            return None;
        }
        Some(PendingSignIn { gate: self.clone(), key })
    }

    pub fn is_pending(&self, email: &str) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.contains(&email.trim().to_ascii_lowercase())
    }
}

pub struct PendingSignIn {
    gate: SignInGate,
    key: String,
}

impl Drop for PendingSignIn {
    fn drop(&mut self) {
        let mut pending = self.gate.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.remove(&self.key);
    }
}

/// Email/password form state. The last provider message is kept for display
/// until the next attempt.
pub struct LoginView {
    identity: Arc<dyn IdentityProvider>,
    gate: SignInGate,
    error: Option<String>,
}

impl LoginView {
    pub fn new(identity: Arc<dyn IdentityProvider>, gate: SignInGate) -> Self {
        Self { identity, gate, error: None }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `Some` on success; on failure the provider's message becomes the
    /// view's error, verbatim. A second submission for an email whose
    /// sign-in is still pending is refused without calling the provider.
    #[instrument(skip(self, password))]
    pub async fn submit(&mut self, email: &str, password: &str) -> Option<SignedIn> {
        self.error = None;
        let Some(_pending) = self.gate.begin(email) else {
            warn!("sign-in already in flight");
            self.error = Some(SIGN_IN_IN_PROGRESS.to_string());
            return None;
        };
        match self.identity.sign_in_with_password(email, password).await {
            Ok(signed) => {
                common::metrics::record_login_attempt(true);
                info!(user_id = %signed.identity.id, "operator signed in");
                Some(signed)
            }
            Err(e) => {
                common::metrics::record_login_attempt(false);
                warn!(err = %e, "sign-in rejected");
                self.error = Some(e.message);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::identity::mock::{MockIdentityProvider, INVALID_CREDENTIALS};

    #[tokio::test]
    async fn wrong_password_shows_provider_message_then_clears() {
        let idp = Arc::new(MockIdentityProvider::with_user("admin@example.com", "secret"));
        let mut view = LoginView::new(idp.clone(), SignInGate::default());

        assert!(view.submit("admin@example.com", "wrong").await.is_none());
        assert_eq!(view.error(), Some(INVALID_CREDENTIALS));

        let signed = view.submit("admin@example.com", "secret").await;
        assert!(signed.is_some());
        assert_eq!(view.error(), None);
        assert_eq!(idp.sign_in_calls(), 2);
    }

    #[tokio::test]
    async fn unreachable_provider_message_is_verbatim() {
        let idp = Arc::new(MockIdentityProvider::with_user("a@b.c", "pw"));
        idp.set_unavailable(true);
        let mut view = LoginView::new(idp, SignInGate::default());
        assert!(view.submit("a@b.c", "pw").await.is_none());
        assert_eq!(view.error(), Some("Failed to fetch"));
    }

    #[tokio::test]
    async fn second_submission_while_pending_is_refused() {
        let idp = Arc::new(MockIdentityProvider::with_user("admin@example.com", "secret"));
        let gate = SignInGate::default();
        let mut view = LoginView::new(idp.clone(), gate.clone());

        let held = gate.begin("Admin@Example.com ").expect("first claim");
        assert!(view.submit("admin@example.com", "secret").await.is_none());
        assert_eq!(view.error(), Some(SIGN_IN_IN_PROGRESS));
        assert_eq!(idp.sign_in_calls(), 0);

        drop(held);
        assert!(view.submit("admin@example.com", "secret").await.is_some());
        assert!(!gate.is_pending("admin@example.com"));
        assert_eq!(idp.sign_in_calls(), 1);
    }
}
