use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::backend::{AccessToken, Identity, IdentityProvider};

/// Identity and token of the operator behind the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: Identity,
    pub token: AccessToken,
}

/// Navigation targets of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Console,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Console => "/admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Authenticated(SessionContext),
    Redirect(Route),
}

/// Gate in front of every protected view.
#[derive(Clone)]
pub struct SessionGuard {
    identity: Arc<dyn IdentityProvider>,
}

impl SessionGuard {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Missing token, unknown token and provider failure all send the
    /// operator to the login route. No retry.
    #[instrument(skip_all)]
    pub async fn check(&self, token: Option<AccessToken>) -> GuardOutcome {
        let Some(token) = token else {
            return GuardOutcome::Redirect(Route::Login);
        };
        match self.identity.current_identity(&token).await {
            Ok(Some(identity)) => GuardOutcome::Authenticated(SessionContext { identity, token }),
            Ok(None) => {
                debug!("session token no longer valid");
                GuardOutcome::Redirect(Route::Login)
            }
            Err(e) => {
                warn!(err = %e, "identity check failed");
                GuardOutcome::Redirect(Route::Login)
            }
        }
    }

    /// Ends the remote session and returns where to go next. A failing
    /// provider is logged only.
    #[instrument(skip_all, fields(user_id = %session.identity.id))]
    pub async fn sign_out(&self, session: &SessionContext) -> Route {
        if let Err(e) = self.identity.sign_out(&session.token).await {
            warn!(err = %e, "sign-out failed");
            common::metrics::record_remote_failure("sign out");
        }
        Route::Root
    }
}
