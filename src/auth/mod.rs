//! Credential issuance and validation.
//!
//! Handles client identity minting, checksum derivation, the shared
//! credential store, and the attempt-limited, expiring validation of
//! inbound credential strings.

mod checksum;
mod clock;
mod identity;
mod issuer;
mod random;
mod store;
mod validator;

pub use checksum::{algorithm_for, ChecksumAlgorithm, Md5Checksum, Sha256Checksum};
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::ClientId;
pub use issuer::{CredentialIssuer, IssuedCredential, IssuerPolicy};
pub use random::{SecretSource, SequenceSecretSource, SystemSecretSource};
pub use store::{CredentialRecord, CredentialStore};
pub use validator::{
    claimed_identity, parse_credential, Accepted, CredentialValidator, CREDENTIAL_DELIMITER,
};
