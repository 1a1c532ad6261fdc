//! HTTP transport.
//!
//! Exposes the issuance endpoint, the protected users endpoint, and a static
//! info page, and renders credential decisions as HTTP responses.

mod listener;
mod metrics;
mod routes;

pub use listener::HttpServer;
pub use metrics::RequestMetrics;
pub use routes::{router, AppState, CLIENT_ID_HEADER, SECRET_HEADER};
