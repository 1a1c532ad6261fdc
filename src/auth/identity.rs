//! Client identities.

use std::fmt;

use serde::Serialize;

use crate::error::GateError;

use super::SecretSource;

/// Random bytes behind a minted identity.
pub const CLIENT_ID_BYTES: usize = 16;

/// Opaque identity a credential is issued for. Compared by exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap an existing identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh identity from [`CLIENT_ID_BYTES`] random bytes.
    ///
    /// The identity is the lowercase hex encoding of the bytes, 32 characters
    /// long.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Random` if `source` cannot produce bytes.
    pub fn mint(source: &dyn SecretSource) -> Result<Self, GateError> {
        let mut seed = [0u8; CLIENT_ID_BYTES];
        source.fill_bytes(&mut seed)?;
        Ok(Self(hex::encode(seed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SequenceSecretSource, SystemSecretSource};

    #[test]
    fn test_mint_hex_encodes_seed_bytes() {
        let source = SequenceSecretSource::new(vec![1234]);
        let id = ClientId::mint(&source).unwrap();
        assert_eq!(id.as_str(), "000004d2".repeat(4));
    }

    #[test]
    fn test_distinct_seeds_give_distinct_ids() {
        let source = SequenceSecretSource::new(vec![1, 2]);
        let a = ClientId::mint(&source).unwrap();
        let b = ClientId::mint(&source).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_system_ids_do_not_repeat() {
        let source = SystemSecretSource::new().unwrap();
        let ids: std::collections::HashSet<_> = (0..1000)
            .map(|_| ClientId::mint(&source).unwrap())
            .collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.as_str().len() == 2 * CLIENT_ID_BYTES));
    }
}
