//! Audit logging module.
//!
//! Records every credential issuance and validation decision as one JSON
//! object per line. Secrets and checksums are never written.

mod entry;
mod logger;

pub use entry::{AuditEntry, AuditEvent, AuditResult};
pub use logger::AuditLogger;
