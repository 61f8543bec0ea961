//! Hosted backend clients (table API + auth API).
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local persistence, every
//!   stateful operation is a direct call
//! - Table operations go through the [`DataService`] trait with typed
//!   request/response records per operation; the REST implementation builds
//!   the query-parameter filters internally
//! - Auth operations go through the [`AuthApi`] trait; the REST
//!   implementation speaks the hosted auth endpoints
//! - In-memory implementations back the test suites and local development
//!
//! # Example
//!
//! ```rust,ignore
//! use vastra_storefront::backend::{DataService, RestDataService};
//!
//! let data = RestDataService::new(&config.backend);
//!
//! // Joined cart read
//! let items = data.list_cart(&user_id).await?;
//!
//! // Atomic clamped stock decrement
//! let adjustment = data.adjust_stock(&variant_id, 2).await?;
//! ```

mod auth;
mod memory;
mod rest;
mod service;

pub use auth::{AuthApi, AuthError, AuthSession, AuthUser, RestAuthApi};
pub use memory::{MemoryAuthApi, MemoryDataService};
pub use rest::RestDataService;
pub use service::{DataService, LowStockVariant, StockAdjustment, StoreStats};

use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("API error: {0}")]
    Api(ApiError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// An error body returned by the backend's table API.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Error message.
    pub message: String,
    /// Machine-readable error code, when provided.
    pub code: Option<String>,
    /// Extra detail, when provided.
    pub details: Option<String>,
    /// Remediation hint, when provided.
    pub hint: Option<String>,
}

impl ApiError {
    /// Build an error with only a status and message.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.message.is_empty() {
            parts.push(format!("HTTP {}", self.status));
        } else {
            parts.push(format!("HTTP {}: {}", self.status, self.message));
        }

        if let Some(code) = &self.code {
            parts.push(format!("code: {code}"));
        }

        if let Some(details) = &self.details {
            parts.push(format!("details: {details}"));
        }

        if let Some(hint) = &self.hint {
            parts.push(format!("hint: {hint}"));
        }

        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("product p-123".to_owned());
        assert_eq!(err.to_string(), "Not found: product p-123");
    }

    #[test]
    fn test_api_error_formatting() {
        let err = ApiError {
            status: 409,
            message: "duplicate key value violates unique constraint".to_owned(),
            code: Some("23505".to_owned()),
            details: None,
            hint: None,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 409: duplicate key value violates unique constraint; code: 23505"
        );
    }

    #[test]
    fn test_api_error_empty_message() {
        let err = ApiError::new(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn test_api_error_full_detail() {
        let err = ApiError {
            status: 400,
            message: "invalid input".to_owned(),
            code: Some("22P02".to_owned()),
            details: Some("column quantity".to_owned()),
            hint: Some("pass an integer".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 400: invalid input; code: 22P02; details: column quantity; hint: pass an integer"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = BackendError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
