//! Mock inbox store: a fixed collection of emails loaded from a JSON file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

/// A single email record. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct Email {
    pub id: String,
    pub subject: String,
    #[serde(rename = "from")]
    pub from_addr: String,
    pub timestamp: String,
    pub body: String,
}

/// The loaded mailbox. Read-only after construction; collection order is
/// load order. Email id uniqueness is assumed, not enforced.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    emails: Vec<Email>,
}

impl Inbox {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let emails: Vec<Email> =
            serde_json::from_str(&content).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(count = emails.len(), path = %path.display(), "loaded inbox");
        Ok(Self { emails })
    }

    /// Load the inbox, degrading to an empty collection on failure.
    /// The failure is logged; the caller surfaces a visible warning.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(inbox) => inbox,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load inbox, starting empty");
                Self::default()
            }
        }
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn get(&self, id: &str) -> Option<&Email> {
        self.emails.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_emails(emails: Vec<Email>) -> Self {
        Self { emails }
    }
}
