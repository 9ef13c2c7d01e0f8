//! Error types for the static data stores and the model gateway.
//!
//! Three failure domains with different policies: a failed inbox load
//! degrades to an empty collection, a failed prompt load is fatal at
//! startup, and a failed model call is rendered as inline text so the
//! session never aborts.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// A static source (inbox or prompt document) is missing or malformed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Writing the prompt document back to disk failed. The in-memory edit
/// survives; the caller surfaces the error and may retry the save.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize prompts: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The model provider could not produce a response.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport-level failure (connection, TLS, malformed response body).
    #[error("request to model API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("model API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// The API answered successfully but the response carried no text.
    #[error("model response contained no text")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display_includes_path() {
        let err = LoadError::Io {
            path: PathBuf::from("/tmp/inbox.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/inbox.json"), "got: {msg}");
        assert!(msg.contains("no such file"), "got: {msg}");
    }

    #[test]
    fn model_error_display_api() {
        let err = ModelError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "quota exceeded".into(),
        };
        assert_eq!(
            err.to_string(),
            "model API error (429 Too Many Requests): quota exceeded"
        );
    }

    #[test]
    fn model_error_display_empty() {
        assert_eq!(
            ModelError::EmptyResponse.to_string(),
            "model response contained no text"
        );
    }
}
