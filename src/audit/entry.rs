//! Audit entry types.

use serde::Serialize;
use uuid::Uuid;

use crate::auth::ClientId;
use crate::error::Rejection;

/// What happened to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Issue,
    Validate,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp of the decision.
    pub timestamp: String,
    /// Unique identifier for the request.
    pub request_id: Uuid,
    pub event: AuditEvent,
    /// Identity the credential belongs to (or claims to).
    pub client_id: ClientId,
    pub result: AuditResult,
    /// Budget left after the decision, when a record exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
    /// Handling duration in microseconds.
    pub duration_us: u64,
}

impl AuditEntry {
    /// Create an entry for a successful issuance or validation.
    pub fn success(
        timestamp: String,
        request_id: Uuid,
        event: AuditEvent,
        client_id: ClientId,
        attempts_remaining: u32,
        duration_us: u64,
    ) -> Self {
        Self {
            timestamp,
            request_id,
            event,
            client_id,
            result: AuditResult::Success,
            attempts_remaining: Some(attempts_remaining),
            duration_us,
        }
    }

    /// Create an entry for a rejected validation.
    pub fn rejected(
        timestamp: String,
        request_id: Uuid,
        client_id: ClientId,
        rejection: Rejection,
        duration_us: u64,
    ) -> Self {
        let attempts_remaining = match rejection {
            Rejection::ChecksumMismatch { attempts_remaining } => Some(attempts_remaining),
            Rejection::AttemptsExhausted => Some(0),
            _ => None,
        };
        Self {
            timestamp,
            request_id,
            event: AuditEvent::Validate,
            client_id,
            result: AuditResult::Failure {
                error_code: rejection.code().to_string(),
                error_message: rejection.to_string(),
            },
            attempts_remaining,
            duration_us,
        }
    }
}

/// Outcome recorded in an audit entry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum AuditResult {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failure")]
    Failure {
        error_code: String,
        error_message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serialization() {
        let entry = AuditEntry::success(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            AuditEvent::Issue,
            ClientId::from("abc"),
            5,
            15,
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"event\":\"issue\""));
        assert!(json.contains("\"client_id\":\"abc\""));
        assert!(json.contains("\"attempts_remaining\":5"));
    }

    #[test]
    fn test_mismatch_records_remaining_attempts() {
        let entry = AuditEntry::rejected(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            ClientId::from("abc"),
            Rejection::ChecksumMismatch {
                attempts_remaining: 2,
            },
            5,
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"failure\""));
        assert!(json.contains("\"error_code\":\"CHECKSUM_MISMATCH\""));
        assert!(json.contains("\"attempts_remaining\":2"));
    }

    #[test]
    fn test_malformed_omits_attempts() {
        let entry = AuditEntry::rejected(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            ClientId::from("abc"),
            Rejection::MalformedCredential,
            5,
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"error_code\":\"MALFORMED_CREDENTIAL\""));
        assert!(!json.contains("attempts_remaining"));
    }
}
