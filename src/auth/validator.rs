//! Credential validation.
//!
//! Checks, in order:
//! 1. A record exists for the client identity
//! 2. The attempt budget is not exhausted
//! 3. The record has not expired
//! 4. The credential string has the `client_id:checksum` shape
//! 5. Identity and checksum both match
//!
//! Only a mismatch at step 5 consumes an attempt. Acceptance leaves the
//! budget and the expiry untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Rejection;

use super::checksum::constant_time_eq;
use super::{ClientId, Clock, CredentialRecord, CredentialStore};

/// Separator between the identity and checksum parts.
pub const CREDENTIAL_DELIMITER: char = ':';

/// Details of an accepted credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub client_id: ClientId,
    pub attempts_remaining: u32,
    pub expires_at: DateTime<Utc>,
}

/// Validates inbound credential strings against the store.
pub struct CredentialValidator {
    store: Arc<CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialValidator {
    pub fn new(store: Arc<CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Decide whether `credential` is valid for `client_id`.
    ///
    /// The whole check runs under the store lock, so concurrent failures
    /// against the same record decrement its budget one at a time.
    pub fn validate(&self, client_id: &ClientId, credential: &str) -> Result<Accepted, Rejection> {
        let now = self.clock.now();
        let result = self
            .store
            .with_record(client_id, |record| check(record, client_id, credential, now));

        match &result {
            Ok(accepted) => debug!(
                client_id = %client_id,
                attempts_remaining = accepted.attempts_remaining,
                "Credential accepted"
            ),
            Err(rejection) => warn!(
                client_id = %client_id,
                reason = rejection.code(),
                "Credential rejected"
            ),
        }

        result
    }

    /// Snapshot of the active record for `client_id`.
    pub fn peek(&self, client_id: &ClientId) -> Option<CredentialRecord> {
        self.store.get(client_id)
    }
}

fn check(
    record: Option<&mut CredentialRecord>,
    client_id: &ClientId,
    credential: &str,
    now: DateTime<Utc>,
) -> Result<Accepted, Rejection> {
    let record = record.ok_or(Rejection::NoActiveCredential)?;

    // Exhaustion wins over expiry when both hold.
    if record.is_exhausted() {
        return Err(Rejection::AttemptsExhausted);
    }
    if record.is_expired_at(now) {
        return Err(Rejection::Expired);
    }

    let (presented_id, presented_checksum) =
        parse_credential(credential).ok_or(Rejection::MalformedCredential)?;

    // Evaluate both comparisons so the outcome does not depend on which part
    // failed first.
    let id_ok = constant_time_eq(presented_id, client_id.as_str());
    let checksum_ok = constant_time_eq(presented_checksum, &record.secret_checksum);
    if !(id_ok & checksum_ok) {
        record.attempts_remaining = record.attempts_remaining.saturating_sub(1);
        return Err(Rejection::ChecksumMismatch {
            attempts_remaining: record.attempts_remaining,
        });
    }

    Ok(Accepted {
        client_id: record.client_id.clone(),
        attempts_remaining: record.attempts_remaining,
        expires_at: record.expires_at,
    })
}

/// Split a `client_id:checksum` string into exactly two parts.
pub fn parse_credential(credential: &str) -> Option<(&str, &str)> {
    let (id, checksum) = credential.split_once(CREDENTIAL_DELIMITER)?;
    if checksum.contains(CREDENTIAL_DELIMITER) {
        return None;
    }
    Some((id, checksum))
}

/// The identity a credential string claims, used as the lookup key when each
/// issuance carries its own identity.
pub fn claimed_identity(credential: &str) -> ClientId {
    let id = credential
        .split_once(CREDENTIAL_DELIMITER)
        .map_or(credential, |(id, _)| id);
    ClientId::from(id)
}
