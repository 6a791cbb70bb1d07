//! # Authentication
//!
//! Account credentials and bearer tokens.
//!
//! ## Passwords
//!
//! Stored as Argon2id PHC strings (`$argon2id$v=19$...`) with a random salt.
//! Hashing is CPU-bound; handlers run it on the blocking pool.
//!
//! ## Tokens
//!
//! `hex(claims JSON) "." hex(Ed25519 signature over the claims bytes)`.
//! Claims carry `sub` (user id), `username`, `iat` and `exp` in Unix
//! seconds. The signing key is loaded from `TOKEN_SIGNING_KEY_HEX` or
//! generated per process.
//!
//! ## Middleware
//!
//! When [`AuthConfig::signer`] is set, [`auth_middleware`] requires a
//! valid `Authorization: Bearer <token>` and injects the verified
//! [`CallerIdentity`] into request extensions. When unset, requests pass
//! through without an identity.

use std::convert::Infallible;
use std::sync::Arc;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{OptionalFromRequestParts, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use llr_core::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Failures in credential handling.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("malformed token")]
    MalformedToken,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token claims could not be encoded: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("TOKEN_SIGNING_KEY_HEX is invalid: {0}")]
    InvalidKey(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedToken | AuthError::BadSignature | AuthError::Expired => {
                Self::Unauthorized(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

// ── Accounts ────────────────────────────────────────────────────────────────

/// A registered user. The password is held only as a PHC hash string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            created_at: now,
        }
    }

    /// Whether `login_id` names this account. Emails compare case-insensitively.
    pub fn matches_login(&self, login_id: &str) -> bool {
        self.email.eq_ignore_ascii_case(login_id.trim())
    }
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a password against a stored PHC hash string.
///
/// A wrong password is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::MalformedHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::MalformedHash(e.to_string())),
    }
}

// ── Tokens ──────────────────────────────────────────────────────────────────

/// Claims embedded in a login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies login tokens.
///
/// `SigningKey` is not `Clone`, so it is shared behind an `Arc`.
/// Custom `Debug` prints only the public key.
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<SigningKey>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(key: SigningKey, ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            key: Arc::new(key),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
        }
    }

    /// A signer with a fresh random key. Tokens die with the process.
    pub fn ephemeral(ttl_secs: u64) -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng), ttl_secs)
    }

    /// Load the key from a 64-character hex seed, or generate one when absent.
    pub fn from_hex_or_ephemeral(hex: Option<&str>, ttl_secs: u64) -> Result<Self, AuthError> {
        match hex.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hex) => {
                let bytes = hex_decode(hex).map_err(AuthError::InvalidKey)?;
                let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    AuthError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
                })?;
                tracing::info!("loaded token signing key from configuration");
                Ok(Self::new(SigningKey::from_bytes(&seed), ttl_secs))
            }
            None => {
                tracing::warn!(
                    "TOKEN_SIGNING_KEY_HEX not set; generated an ephemeral key. \
                     Issued tokens will not survive a restart."
                );
                Ok(Self::ephemeral(ttl_secs))
            }
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Issue a token for `user`, valid from `now` for the configured TTL.
    pub fn issue(&self, user: &UserAccount, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
        };
        let payload = serde_json::to_vec(&claims)?;
        let signature = self.key.sign(&payload);
        Ok(format!(
            "{}.{}",
            hex_encode(&payload),
            hex_encode(&signature.to_bytes())
        ))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (payload_hex, signature_hex) =
            token.trim().split_once('.').ok_or(AuthError::MalformedToken)?;
        let payload = hex_decode(payload_hex).map_err(|_| AuthError::MalformedToken)?;
        let signature_bytes: [u8; 64] = hex_decode(signature_hex)
            .map_err(|_| AuthError::MalformedToken)?
            .as_slice()
            .try_into()
            .map_err(|_| AuthError::MalformedToken)?;
        let signature = Signature::from_bytes(&signature_bytes);

        self.key
            .verifying_key()
            .verify(&payload, &signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("verifying_key", &hex_encode(self.key.verifying_key().as_bytes()))
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("hex string has odd length: {}", s.len()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex at position {i}"))
        })
        .collect()
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The verified caller, injected by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub username: String,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

/// `Option<CallerIdentity>` extractor. `None` when auth is disabled.
impl<S: Send + Sync> OptionalFromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CallerIdentity>().cloned())
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token verifier. `None` disables authentication.
    pub signer: Option<TokenSigner>,
}

/// Require and verify the bearer token when authentication is enabled.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let signer = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|config| config.signer.clone());

    let Some(signer) = signer else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header_value {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return AppError::Unauthorized(
                    "authorization header must use Bearer scheme".into(),
                )
                .into_response();
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return AppError::Unauthorized("missing authorization header".into()).into_response();
        }
    };

    match signer.verify(token, Utc::now()) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.sub, "authenticated request");
            request
                .extensions_mut()
                .insert(CallerIdentity::from(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(reason = %e, "authentication failed: invalid bearer token");
            AppError::from(e).into_response()
        }
    }
}
