//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use keygate::auth::{
    ChecksumAlgorithm, CredentialIssuer, CredentialStore, CredentialValidator, IssuerPolicy,
    ManualClock, Md5Checksum, SequenceSecretSource,
};
use keygate::config::IdentityMode;
use keygate::resource::{User, UserDirectory};
use keygate::server::AppState;

/// Seed consumed by the process-wide client id.
pub const ID_SEED: u32 = 1234;

/// App state with deterministic secrets and a controllable clock.
pub struct TestGate {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: Arc<CredentialStore>,
}

impl TestGate {
    /// Secrets are handed out from `secrets` in order, after the id seed.
    pub fn new(secrets: &[u32], max_attempts: u32, mode: IdentityMode) -> Self {
        let mut values = vec![ID_SEED];
        values.extend_from_slice(secrets);

        let store = Arc::new(CredentialStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = CredentialIssuer::new(
            Arc::clone(&store),
            Arc::new(SequenceSecretSource::new(values)),
            Arc::new(Md5Checksum),
            clock.clone(),
            IssuerPolicy {
                max_attempts,
                identity_mode: mode,
                ..IssuerPolicy::default()
            },
        )
        .expect("issuer");
        let validator = CredentialValidator::new(Arc::clone(&store), clock.clone());
        let state = AppState::new(issuer, validator, Arc::new(sample_users()));

        Self {
            state,
            clock,
            store,
        }
    }

    pub fn shared(secrets: &[u32]) -> Self {
        Self::new(secrets, 5, IdentityMode::Shared)
    }
}

/// What a well-behaved client computes from the issued secret.
pub fn checksum_for(secret: &str) -> String {
    let secret: u32 = secret.parse().expect("numeric secret");
    Md5Checksum.checksum(secret, "/users")
}

pub fn sample_users() -> UserDirectory {
    let users: Vec<User> = serde_json::from_value(serde_json::json!([
        {"guid": "a1b2c3d4-0001", "isActive": true, "name": {"first": "Ada", "last": "Byron"}},
        {"guid": "a1b2c3d4-0002", "isActive": false},
        {"guid": "a1b2c3d4-0003"}
    ]))
    .expect("users fixture");
    UserDirectory::new(users)
}

pub const USERS_BODY: &str = "Count: 3\na1b2c3d4-0001\na1b2c3d4-0002\na1b2c3d4-0003";
