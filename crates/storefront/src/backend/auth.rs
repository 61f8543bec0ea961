//! Hosted auth subsystem client.
//!
//! The storefront treats authentication as an opaque network contract:
//! OTP sign-in over SMS, email/password sign-in, sign-up, and sign-out.
//! Sessions are whatever the auth endpoints return; the storefront never
//! inspects tokens.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use vastra_core::{Email, EmailError, Phone, PhoneError, UserId};

use crate::config::BackendConfig;

use super::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid phone format.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Invalid credentials (wrong password or unknown user).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The one-time code did not verify.
    #[error("invalid or expired code")]
    InvalidCode,

    /// An account already exists for this email.
    #[error("account already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Underlying backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// An authenticated user as reported by the auth subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub phone: Option<Phone>,
    #[serde(default)]
    pub email: Option<Email>,
}

/// A session issued by the auth subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

/// The auth subsystem contract.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Any session the auth subsystem already holds for this client.
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// Request an SMS one-time code.
    async fn sign_in_with_otp(&self, phone: &Phone) -> Result<(), AuthError>;

    /// Verify an SMS one-time code and open a session.
    async fn verify_otp(&self, phone: &Phone, code: &str) -> Result<AuthSession, AuthError>;

    /// Create an account with email and password.
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, AuthError>;

    /// Open a session with email and password.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Close the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

// =============================================================================
// RestAuthApi
// =============================================================================

/// Client for the hosted auth endpoints.
#[derive(Clone)]
pub struct RestAuthApi {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    client: reqwest::Client,
    auth_base: String,
    key: String,
}

impl RestAuthApi {
    /// Create a new auth API client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let auth_base = format!("{}/auth/v1", config.url.as_str().trim_end_matches('/'));

        Self {
            inner: Arc::new(AuthInner {
                client: reqwest::Client::new(),
                auth_base,
                key: config.key.expose_secret().to_owned(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.auth_base)
    }

    /// POST to an auth endpoint, returning the raw response on success.
    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, AuthFailure> {
        let response = self
            .inner
            .client
            .post(self.endpoint(path))
            .header("apikey", &self.inner.key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthFailure::Backend(BackendError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %body.chars().take(300).collect::<String>(),
                "Auth endpoint returned non-success status"
            );
            return Err(AuthFailure::Rejected);
        }

        Ok(response)
    }

    async fn post_session(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<AuthSession, AuthFailure> {
        let response = self.post(path, body).await?;
        response
            .json()
            .await
            .map_err(|e| AuthFailure::Backend(BackendError::Http(e)))
    }
}

/// Internal split between transport failures and credential rejections, so
/// each endpoint can map rejections to its own error variant.
enum AuthFailure {
    Rejected,
    Backend(BackendError),
}

impl AuthFailure {
    fn map_rejection(self, rejected: AuthError) -> AuthError {
        match self {
            Self::Rejected => rejected,
            Self::Backend(e) => AuthError::Backend(e),
        }
    }
}

#[async_trait]
impl AuthApi for RestAuthApi {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        // Token persistence is the caller's concern; this client holds none.
        Ok(None)
    }

    #[instrument(skip(self), fields(phone = %phone))]
    async fn sign_in_with_otp(&self, phone: &Phone) -> Result<(), AuthError> {
        self.post(
            "otp",
            &serde_json::json!({ "phone": phone, "channel": "sms" }),
        )
        .await
        .map_err(|e| e.map_rejection(AuthError::InvalidCredentials))?;
        Ok(())
    }

    #[instrument(skip(self, code), fields(phone = %phone))]
    async fn verify_otp(&self, phone: &Phone, code: &str) -> Result<AuthSession, AuthError> {
        self.post_session(
            "verify",
            &serde_json::json!({ "phone": phone, "token": code, "type": "sms" }),
        )
        .await
        .map_err(|e| e.map_rejection(AuthError::InvalidCode))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, AuthError> {
        self.post_session(
            "signup",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
        .map_err(|e| e.map_rejection(AuthError::UserAlreadyExists))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        self.post_session(
            "token?grant_type=password",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
        .map_err(|e| e.map_rejection(AuthError::InvalidCredentials))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.post("logout", &serde_json::json!({}))
            .await
            .map_err(|e| e.map_rejection(AuthError::InvalidCredentials))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::InvalidCode.to_string(), "invalid or expired code");
        assert_eq!(
            AuthError::WeakPassword("too short".to_owned()).to_string(),
            "password validation failed: too short"
        );
    }

    #[test]
    fn test_session_deserializes_from_auth_payload() {
        let json = r#"{
            "access_token": "tok-123",
            "token_type": "bearer",
            "user": { "id": "u-9", "phone": "+919800000001" }
        }"#;
        let session: AuthSession = serde_json::from_str(json).expect("session should parse");
        assert_eq!(session.access_token, "tok-123");
        assert_eq!(session.user.id.as_str(), "u-9");
        assert!(session.user.email.is_none());
    }
}
