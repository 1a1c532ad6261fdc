//! Error types for the keygate daemon.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the daemon.
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Resource provider errors.
    #[error("Resource error: {kind}")]
    Resource { kind: ResourceErrorKind },

    /// The random source could not produce a value.
    #[error("Random source error: {message}")]
    Random { message: String },

    /// HTTP server errors.
    #[error("Server error: {message}")]
    Server { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Resource provider error kinds.
#[derive(Error, Debug)]
pub enum ResourceErrorKind {
    #[error("Failed to read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// Reasons a credential string is rejected.
///
/// Every variant is recoverable by the caller obtaining a new credential.
/// The `Display` text is the message returned to HTTP clients and must stay
/// stable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("No credentials have been issued, obtain new credentials and try again.")]
    NoActiveCredential,

    #[error("No login attempts remain, obtain new credentials and try again.")]
    AttemptsExhausted,

    #[error("Token has expired, obtain new credentials and try again.")]
    Expired,

    #[error("Forbidden - verify Authorization token formatting.")]
    MalformedCredential,

    #[error(
        "Forbidden - could not authorize credentials. You have {attempts_remaining} attempts remaining."
    )]
    ChecksumMismatch { attempts_remaining: u32 },
}

impl Rejection {
    /// Stable machine-readable code, used in logs and the audit trail.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoActiveCredential => "NO_ACTIVE_CREDENTIAL",
            Self::AttemptsExhausted => "ATTEMPTS_EXHAUSTED",
            Self::Expired => "EXPIRED",
            Self::MalformedCredential => "MALFORMED_CREDENTIAL",
            Self::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
        }
    }

    /// HTTP status for this rejection.
    ///
    /// - "needs a new credential" reasons: 401 Unauthorized
    /// - malformed or mismatched credential: 403 Forbidden
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NoActiveCredential | Self::AttemptsExhausted | Self::Expired => {
                StatusCode::UNAUTHORIZED
            }
            Self::MalformedCredential | Self::ChecksumMismatch { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status_code(), format!("{}\n", self)).into_response()
    }
}

/// Result type alias for daemon operations.
pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            Rejection::NoActiveCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Rejection::AttemptsExhausted.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Rejection::Expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Rejection::MalformedCredential.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Rejection::ChecksumMismatch {
                attempts_remaining: 2
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_mismatch_message_names_remaining_attempts() {
        let msg = Rejection::ChecksumMismatch {
            attempts_remaining: 3,
        }
        .to_string();
        assert!(msg.contains("You have 3 attempts remaining."));
    }

    #[test]
    fn test_rejection_codes_are_distinct() {
        let codes = [
            Rejection::NoActiveCredential.code(),
            Rejection::AttemptsExhausted.code(),
            Rejection::Expired.code(),
            Rejection::MalformedCredential.code(),
            Rejection::ChecksumMismatch {
                attempts_remaining: 0,
            }
            .code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_rejection_into_response() {
        let response = Rejection::Expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_resource_error_display() {
        let err = GateError::Resource {
            kind: ResourceErrorKind::Unreadable {
                path: PathBuf::from("users.json"),
                message: "not found".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Resource error: Failed to read users.json: not found"
        );
    }
}
