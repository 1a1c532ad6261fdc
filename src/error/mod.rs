//! Error types for the keygate daemon.
//!
//! Provides a unified error handling system using thiserror. Credential
//! rejections live alongside process faults but are never mixed with them:
//! a [`Rejection`] is a per-request outcome, a [`GateError`] is a fault.

mod types;

pub use types::*;
