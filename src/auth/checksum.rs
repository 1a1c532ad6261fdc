//! Checksum strategies binding a numeric secret to a resource context.
//!
//! A checksum is `hex(H(decimal(secret) || context))`. The default MD5
//! strategy reproduces what existing clients compute, e.g.
//! `md5("42/users")`. It is not a cryptographically strong scheme.

use std::sync::Arc;

use ring::digest;
use subtle::ConstantTimeEq;

use crate::config::ChecksumKind;

/// A digest over a secret and a context string.
pub trait ChecksumAlgorithm: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Hex-encoded lowercase digest of `secret` followed by `context`.
    fn checksum(&self, secret: u32, context: &str) -> String;
}

/// MD5 over the decimal secret and context.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Checksum;

impl ChecksumAlgorithm for Md5Checksum {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn checksum(&self, secret: u32, context: &str) -> String {
        let input = format!("{}{}", secret, context);
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}

/// SHA-256 over the decimal secret and context.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Checksum;

impl ChecksumAlgorithm for Sha256Checksum {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn checksum(&self, secret: u32, context: &str) -> String {
        let input = format!("{}{}", secret, context);
        hex::encode(digest::digest(&digest::SHA256, input.as_bytes()).as_ref())
    }
}

/// Build the configured checksum strategy.
pub fn algorithm_for(kind: ChecksumKind) -> Arc<dyn ChecksumAlgorithm> {
    match kind {
        ChecksumKind::Md5 => Arc::new(Md5Checksum),
        ChecksumKind::Sha256 => Arc::new(Sha256Checksum),
    }
}

/// Compare two credential parts without short-circuiting on content.
///
/// Length differences are still observable.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_known_vectors() {
        // md5("") and md5("a") from RFC 1321
        assert_eq!(
            format!("{:x}", md5::compute(b"")),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Md5Checksum.checksum(42, "/users"),
            format!("{:x}", md5::compute(b"42/users"))
        );
        assert_eq!(Md5Checksum.checksum(42, "/users").len(), 32);
    }

    #[test]
    fn test_sha256_known_vector() {
        // sha256("1")
        assert_eq!(
            Sha256Checksum.checksum(1, ""),
            "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
        );
    }

    #[test]
    fn test_checksum_bound_to_context() {
        assert_ne!(
            Md5Checksum.checksum(42, "/users"),
            Md5Checksum.checksum(42, "/orders")
        );
        assert_ne!(
            Md5Checksum.checksum(42, "/users"),
            Md5Checksum.checksum(43, "/users")
        );
    }

    #[test]
    fn test_algorithm_for_kind() {
        assert_eq!(algorithm_for(ChecksumKind::Md5).name(), "md5");
        assert_eq!(algorithm_for(ChecksumKind::Sha256).name(), "sha256");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
