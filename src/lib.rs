//! Keygate Library
//!
//! Short-lived credential issuance and validation in front of a protected
//! user listing. Credentials expire after a fixed lifetime and after a fixed
//! number of failed checksum attempts, whichever comes first.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod resource;
pub mod server;
