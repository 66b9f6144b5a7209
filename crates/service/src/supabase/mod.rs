//! Hosted backend: Supabase auth (GoTrue), rows (PostgREST) and storage
//! over plain HTTP with `reqwest`.

pub mod auth;
pub mod rest;
pub mod storage;

use configs::SupabaseConfig;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::backend::AccessToken;
use crate::errors::ServiceError;

pub use auth::SupabaseAuth;
pub use rest::SupabaseRest;
pub use storage::SupabaseStorage;

/// Shared HTTP client plus project URL and anon key.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client. No request timeout is configured; calls are bounded
    /// by the network stack only.
    pub fn new(cfg: &SupabaseConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("portfolio-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, &cfg.url, &cfg.anon_key))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the `apikey` header; `Authorization` carries the user's
    /// token when given, the anon key otherwise.
    fn request(&self, method: Method, path: &str, token: Option<&AccessToken>) -> RequestBuilder {
        let bearer = token.map(AccessToken::as_str).unwrap_or(self.anon_key.as_str());
        debug!(%method, path, "supabase request");
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

/// Pick the human-readable message out of a Supabase error body, in the
/// order the official clients use.
pub fn error_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Turn a non-success response into `ServiceError::Remote`.
async fn remote_error(resp: Response) -> ServiceError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| error_message(&v))
        .unwrap_or(text);
    ServiceError::Remote { status, message }
}

/// Return the response when successful, otherwise the decoded error.
async fn ensure_success(resp: Response) -> Result<Response, ServiceError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(remote_error(resp).await)
    }
}

/// Percent-encode a storage object path, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_msg_then_description() {
        assert_eq!(
            error_message(&json!({"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"})),
            Some("Invalid login credentials".into())
        );
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "Email not confirmed"})),
            Some("Email not confirmed".into())
        );
        assert_eq!(error_message(&json!({"error": "bad"})), Some("bad".into()));
        assert_eq!(error_message(&json!({})), None);
    }

    #[test]
    fn encode_path_keeps_separators() {
        assert_eq!(encode_path("projects/a b.png"), "projects/a%20b.png");
        assert_eq!(encode_path("projects/x-1_2.jpg"), "projects/x-1_2.jpg");
        assert_eq!(encode_path("projects/ünï?#.png"), "projects/%C3%BCn%C3%AF%3F%23.png");
    }
}
