use std::collections::HashMap;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use configs::LocalConfig;

use crate::backend::{AccessToken, AuthError, Identity, IdentityProvider, SignedIn};
use crate::errors::ServiceError;

/// Message returned for any credential mismatch, same text as the hosted
/// provider so the login view behaves identically.
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    jti: String,
    iat: usize,
    exp: usize,
}

/// Seconds a token outlives its `exp` during decoding (jsonwebtoken's
/// default leeway); revocations are kept at least this long past expiry.
const EXPIRY_LEEWAY_SECS: usize = 60;

/// Hash a password into a PHC string (argon2id, random salt).
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Validation(format!("password hashing failed: {e}")))
}

/// Single-admin identity provider: one email, one argon2 hash, HS256 access
/// tokens. Signed-out token ids are kept in memory until their token would
/// no longer decode anyway.
pub struct LocalIdentity {
    admin_id: String,
    admin_email: String,
    password_hash: String,
    secret: String,
    ttl_secs: u64,
    revoked: RwLock<HashMap<String, usize>>,
}

impl LocalIdentity {
    pub fn new(admin_email: &str, password_hash: String, secret: &str, ttl_secs: u64) -> Result<Self, ServiceError> {
        PasswordHash::new(&password_hash)
            .map_err(|e| ServiceError::Validation(format!("admin password hash is not a PHC string: {e}")))?;
        Ok(Self {
            admin_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, admin_email.as_bytes()).to_string(),
            admin_email: admin_email.to_string(),
            password_hash,
            secret: secret.to_string(),
            ttl_secs,
            revoked: RwLock::new(HashMap::new()),
        })
    }

    /// Build from configuration, hashing a plain `admin_password` when no
    /// hash is configured.
    pub fn from_config(cfg: &LocalConfig) -> Result<Self, ServiceError> {
        let hash = match (&cfg.admin_password_hash, &cfg.admin_password) {
            (Some(hash), _) => hash.clone(),
            (None, Some(plain)) => hash_password(plain)?,
            (None, None) => return Err(ServiceError::Validation("no admin password configured".into())),
        };
        Self::new(&cfg.admin_email, hash, &cfg.jwt_secret, cfg.token_ttl_secs)
    }

    fn identity(&self) -> Identity {
        Identity { id: self.admin_id.clone(), email: Some(self.admin_email.clone()) }
    }

    fn issue_token(&self) -> Result<AccessToken, ServiceError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs as i64);
        let claims = Claims {
            sub: self.admin_id.clone(),
            email: self.admin_email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map(AccessToken::new)
            .map_err(|e| ServiceError::Validation(format!("token encoding failed: {e}")))
    }

    fn decode(&self, token: &AccessToken) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match decode::<Claims>(token.as_str(), &DecodingKey::from_secret(self.secret.as_bytes()), &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(err = %e, "token rejected");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_identity(&self, token: &AccessToken) -> Result<Option<Identity>, ServiceError> {
        let Some(claims) = self.decode(token) else {
            return Ok(None);
        };
        if claims.sub != self.admin_id || self.revoked.read().await.contains_key(&claims.jti) {
            return Ok(None);
        }
        Ok(Some(self.identity()))
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let parsed = PasswordHash::new(&self.password_hash).map_err(|e| AuthError::new(e.to_string()))?;
        let email_ok = email.eq_ignore_ascii_case(&self.admin_email);
        let password_ok = Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok();
        if !(email_ok && password_ok) {
            warn!("local sign-in rejected");
            return Err(AuthError::new(INVALID_CREDENTIALS));
        }
        let token = self.issue_token().map_err(|e| AuthError::new(e.to_string()))?;
        info!(user_id = %self.admin_id, "local sign-in succeeded");
        Ok(SignedIn { identity: self.identity(), token })
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), ServiceError> {
        if let Some(claims) = self.decode(token) {
            let now = chrono::Utc::now().timestamp() as usize;
            let mut revoked = self.revoked.write().await;
            revoked.retain(|_, exp| *exp + EXPIRY_LEEWAY_SECS > now);
            revoked.insert(claims.jti, claims.exp);
        }
        Ok(())
    }
}
