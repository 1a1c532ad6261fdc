//! Protected resource provider.
//!
//! The credential core never looks at the payload; it only decides whether
//! a request may reach it.

mod users;

pub use users::{Name, User, UserDirectory};

/// Supplies the payload behind the credential gate.
pub trait ResourceProvider: Send + Sync {
    /// Render the protected payload as response text.
    fn render(&self) -> String;
}
