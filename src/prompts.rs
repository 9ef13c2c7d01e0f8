//! Prompt registry: the four named templates driving every model call.
//!
//! The backing document is a flat JSON object with exactly four string
//! fields. Saves overwrite it wholesale; there are no fallback defaults,
//! so a missing or corrupt document is a startup error.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, PersistError};

/// The editable prompt templates, one per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    pub categorize_prompt: String,
    pub action_prompt: String,
    pub reply_prompt: String,
    pub agent_prompt: String,
}

/// Durable storage for the prompt set.
#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<PromptSet, LoadError> {
        let content = fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LoadError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the document with all four templates at once. On failure
    /// the caller keeps its in-memory edit and surfaces the error.
    pub fn save(&self, prompts: &PromptSet) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| PersistError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(prompts)?;
        fs::write(&self.path, content).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "saved prompts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptSet {
        PromptSet {
            categorize_prompt: "Classify this email".into(),
            action_prompt: "List the action items".into(),
            reply_prompt: "Draft a polite reply".into(),
            agent_prompt: "You are an email assistant".into(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path().join("prompts.json"));
        let prompts = sample();
        store.save(&prompts).unwrap();
        assert_eq!(store.load().unwrap(), prompts);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path().join("nested/prompts.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn missing_document_propagates() {
        let store = PromptStore::new(PathBuf::from("/nonexistent/prompts.json"));
        assert!(matches!(store.load(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn incomplete_document_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        fs::write(&path, r#"{"categorize_prompt": "only one"}"#).unwrap();
        let store = PromptStore::new(path);
        assert!(matches!(store.load(), Err(LoadError::Parse { .. })));
    }
}
