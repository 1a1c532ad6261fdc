//! In-memory credential store.
//!
//! Holds at most one active [`CredentialRecord`] per [`ClientId`]. A single
//! mutex guards the whole map, so the checksum, expiry and attempt counter of
//! a record are always read and written together.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::ClientId;

/// The active credential for one client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Identity the record was issued for.
    pub client_id: ClientId,
    /// Hex checksum a valid credential string must carry.
    pub secret_checksum: String,
    /// When the record was issued.
    pub issued_at: DateTime<Utc>,
    /// The record is invalid strictly after this instant.
    pub expires_at: DateTime<Utc>,
    /// Failed validations still tolerated.
    pub attempts_remaining: u32,
}

impl CredentialRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }
}

/// Thread-safe map of client identity to its active credential.
#[derive(Debug, Default)]
pub struct CredentialStore {
    records: Mutex<HashMap<ClientId, CredentialRecord>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record`, replacing any prior record for the same identity.
    ///
    /// Returns the replaced record, if any.
    pub fn replace(&self, record: CredentialRecord) -> Option<CredentialRecord> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(record.client_id.clone(), record)
    }

    /// Store `record` only if its identity has no record yet.
    ///
    /// Expired and exhausted records still count as present. Returns `false`
    /// and leaves the store untouched when the identity is taken.
    pub fn insert_new(&self, record: CredentialRecord) -> bool {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match records.entry(record.client_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Run `f` against the record for `client_id` while holding the lock.
    ///
    /// Everything `f` reads and writes happens atomically with respect to
    /// other store operations.
    pub fn with_record<R>(
        &self,
        client_id: &ClientId,
        f: impl FnOnce(Option<&mut CredentialRecord>) -> R,
    ) -> R {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        f(records.get_mut(client_id))
    }

    /// Snapshot of the record for `client_id`.
    pub fn get(&self, client_id: &ClientId) -> Option<CredentialRecord> {
        self.with_record(client_id, |record| record.cloned())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
