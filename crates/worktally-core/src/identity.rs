//! Who owns the records being written.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::IdentityConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    Anonymous,
    User { id: String, display_name: String },
}

impl Identity {
    pub fn user(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Identity::User {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// A blank `user_id` in config means nobody is signed in.
    pub fn from_config(config: &IdentityConfig) -> Self {
        let id = config.user_id.trim();
        if id.is_empty() {
            return Identity::Anonymous;
        }
        let display_name = match config.display_name.trim() {
            "" => "User".to_string(),
            name => name.to_string(),
        };
        Identity::User {
            id: id.to_string(),
            display_name,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::User { id, .. } => Some(id),
        }
    }

    /// The owner id, or `NotAuthenticated`.
    pub fn require(&self) -> Result<&str, StorageError> {
        self.user_id().ok_or(StorageError::NotAuthenticated)
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Anonymous => "Anonymous",
            Identity::User { display_name, .. } => display_name,
        }
    }
}
