use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{ensure_success, error_message, SupabaseClient};
use crate::backend::{AccessToken, AuthError, Identity, IdentityProvider, SignedIn};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Identity,
}

/// GoTrue password auth.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    #[instrument(skip_all)]
    async fn current_identity(&self, token: &AccessToken) -> Result<Option<Identity>, ServiceError> {
        let resp = self
            .client
            .request(Method::GET, "/auth/v1/user", Some(token))
            .send()
            .await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => {
                let resp = ensure_success(resp).await?;
                Ok(Some(resp.json::<Identity>().await?))
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let resp = self
            .client
            .request(Method::POST, "/auth/v1/token?grant_type=password", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::new(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });
            warn!(status = status.as_u16(), %message, "password sign-in rejected");
            return Err(AuthError::new(message));
        }

        let body: TokenResponse = resp.json().await.map_err(|e| AuthError::new(e.to_string()))?;
        info!(user_id = %body.user.id, "password sign-in succeeded");
        Ok(SignedIn { identity: body.user, token: AccessToken::new(body.access_token) })
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), ServiceError> {
        let resp = self
            .client
            .request(Method::POST, "/auth/v1/logout", Some(token))
            .send()
            .await?;
        // An already-dead session counts as signed out.
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => ensure_success(resp).await.map(|_| ()),
        }
    }
}
