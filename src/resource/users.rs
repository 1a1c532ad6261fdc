//! User directory loaded from a JSON file.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{GateError, ResourceErrorKind};

use super::ResourceProvider;

/// A single user record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub guid: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub age: u8,
    #[serde(default)]
    pub eye_color: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Name {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    users: Vec<User>,
}

/// All users, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Load the directory from a `{"users": [...]}` JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the users file
    ///
    /// # Errors
    ///
    /// Returns `GateError::Resource` with `Unreadable` if the file cannot be
    /// read, or `Malformed` if it is not a valid users document.
    pub fn load(path: &Path) -> Result<Self, GateError> {
        let content = std::fs::read_to_string(path).map_err(|e| GateError::Resource {
            kind: ResourceErrorKind::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        let file: UsersFile = serde_json::from_str(&content).map_err(|e| GateError::Resource {
            kind: ResourceErrorKind::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        info!(path = %path.display(), count = file.users.len(), "User directory loaded");

        Ok(Self::new(file.users))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl ResourceProvider for UserDirectory {
    /// `Count: N` followed by one GUID per line.
    fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.users.len() + 1);
        lines.push(format!("Count: {}", self.users.len()));
        lines.extend(self.users.iter().map(|u| u.guid.clone()));
        lines.join("\n")
    }
}
