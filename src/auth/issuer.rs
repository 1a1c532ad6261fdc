//! Credential issuance.
//!
//! Each issuance draws a fresh numeric secret, stores only its checksum, and
//! hands the cleartext secret back to the caller exactly once. Issuing for an
//! identity replaces its previous record, so any credential string built
//! against the old secret stops validating immediately.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::{CredentialConfig, IdentityMode};
use crate::error::GateError;

use super::{ChecksumAlgorithm, ClientId, Clock, CredentialRecord, CredentialStore, SecretSource};

/// Identities drawn per issuance before giving up on finding an unused one.
const MAX_MINT_ATTEMPTS: usize = 4;

/// Issuance policy derived from [`CredentialConfig`].
#[derive(Debug, Clone)]
pub struct IssuerPolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
    pub secret_upper_bound: u32,
    pub resource_context: String,
    pub identity_mode: IdentityMode,
}

impl IssuerPolicy {
    pub fn from_config(config: &CredentialConfig) -> Result<Self, GateError> {
        let ttl = Duration::from_std(config.ttl()).map_err(|e| GateError::Config {
            message: format!("credentials.ttl_seconds out of range: {}", e),
        })?;
        Ok(Self {
            ttl,
            max_attempts: config.max_attempts,
            secret_upper_bound: config.secret_upper_bound,
            resource_context: config.resource_context.clone(),
            identity_mode: config.identity_mode,
        })
    }
}

impl Default for IssuerPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(300),
            max_attempts: 5,
            secret_upper_bound: 99_999_999,
            resource_context: "/users".to_string(),
            identity_mode: IdentityMode::Shared,
        }
    }
}

/// Result of an issuance: the only place the cleartext secret appears.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub client_id: ClientId,
    pub secret: u32,
    pub record: CredentialRecord,
}

/// Mints client identities and credential records.
pub struct CredentialIssuer {
    store: Arc<CredentialStore>,
    source: Arc<dyn SecretSource>,
    algorithm: Arc<dyn ChecksumAlgorithm>,
    clock: Arc<dyn Clock>,
    policy: IssuerPolicy,
    /// Process-wide identity used in shared mode.
    client_id: ClientId,
}

impl CredentialIssuer {
    /// Create an issuer and mint the process-wide client identity.
    pub fn new(
        store: Arc<CredentialStore>,
        source: Arc<dyn SecretSource>,
        algorithm: Arc<dyn ChecksumAlgorithm>,
        clock: Arc<dyn Clock>,
        policy: IssuerPolicy,
    ) -> Result<Self, GateError> {
        let client_id = ClientId::mint(source.as_ref())?;
        info!(
            client_id = %client_id,
            algorithm = algorithm.name(),
            mode = ?policy.identity_mode,
            "Client identity minted"
        );
        Ok(Self {
            store,
            source,
            algorithm,
            clock,
            policy,
            client_id,
        })
    }

    /// The process-wide client identity.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn policy(&self) -> &IssuerPolicy {
        &self.policy
    }

    /// Issue according to the configured identity mode.
    pub fn issue_next(&self) -> Result<IssuedCredential, GateError> {
        match self.policy.identity_mode {
            IdentityMode::Shared => self.issue_default(),
            IdentityMode::PerIssuance => self.issue_new_identity(),
        }
    }

    /// Issue for the process-wide identity.
    pub fn issue_default(&self) -> Result<IssuedCredential, GateError> {
        let client_id = self.client_id.clone();
        self.issue(&client_id)
    }

    /// Mint a new identity and issue for it.
    ///
    /// Records of earlier identities are never touched, so an expired one
    /// keeps rejecting as expired. A minted identity that already has a
    /// record is discarded and another one is drawn.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Random` if the random source fails or every draw
    /// lands on an identity already in the store.
    pub fn issue_new_identity(&self) -> Result<IssuedCredential, GateError> {
        for _ in 0..MAX_MINT_ATTEMPTS {
            let client_id = ClientId::mint(self.source.as_ref())?;
            let issued = self.build(&client_id)?;
            if self.store.insert_new(issued.record.clone()) {
                self.log_issued(&issued);
                return Ok(issued);
            }
            warn!(client_id = %client_id, "Minted identity already in use, drawing another");
        }
        Err(GateError::Random {
            message: format!(
                "no unused client identity after {} attempts",
                MAX_MINT_ATTEMPTS
            ),
        })
    }

    /// Issue a credential for `client_id`, replacing its previous record.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Identity the credential is bound to
    ///
    /// # Errors
    ///
    /// Returns `GateError::Random` if the secret cannot be drawn. The store is
    /// left unchanged in that case.
    pub fn issue(&self, client_id: &ClientId) -> Result<IssuedCredential, GateError> {
        let issued = self.build(client_id)?;
        if self.store.replace(issued.record.clone()).is_some() {
            debug!(client_id = %client_id, "Previous credential replaced");
        }
        self.log_issued(&issued);
        Ok(issued)
    }

    fn build(&self, client_id: &ClientId) -> Result<IssuedCredential, GateError> {
        let secret = self.source.next_below(self.policy.secret_upper_bound)?;
        let secret_checksum = self
            .algorithm
            .checksum(secret, &self.policy.resource_context);
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.policy.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let record = CredentialRecord {
            client_id: client_id.clone(),
            secret_checksum,
            issued_at: now,
            expires_at,
            attempts_remaining: self.policy.max_attempts,
        };

        Ok(IssuedCredential {
            client_id: client_id.clone(),
            secret,
            record,
        })
    }

    fn log_issued(&self, issued: &IssuedCredential) {
        info!(
            client_id = %issued.client_id,
            expires_at = %issued.record.expires_at.to_rfc3339(),
            attempts = issued.record.attempts_remaining,
            "Credential issued"
        );
    }
}
