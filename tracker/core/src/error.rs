//! Error Types
//!
//! Errors raised by the gateways. Controllers never propagate these to
//! their callers; they turn them into a user-facing message with
//! [`GatewayError::user_message`] and publish it as state.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a gateway call (auth, data or session storage)
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level HTTP failure (connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body (or the raw body)
        message: String,
    },

    /// A response or row could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The operation needs a signed-in user and there is none
    #[error("not authenticated")]
    NotAuthenticated,

    /// The gateway rejected the request for a domain reason
    #[error("{0}")]
    Rejected(String),

    /// Reading or writing the persisted session failed
    #[error("session storage at {path}: {source}")]
    SessionStorage {
        /// Session file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Build a status error from an HTTP error body
    ///
    /// GoTrue and PostgREST put the readable text under different keys
    /// (`msg`, `message`, `error_description`, `error`); the first one present
    /// wins. Falls back to the raw body.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(String::from))
            })
            .unwrap_or_else(|| body.trim().to_string());

        Self::Status { status, message }
    }

    /// Text suitable for showing to a user, if the error carries any
    ///
    /// Returns `None` when there is nothing better than a generic fallback.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) if !message.is_empty() => {
                Some(message.clone())
            }
            Self::Status { .. } | Self::Rejected(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Result alias for gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of the local preference store
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Reading or writing the preference file failed
    #[error("preference file {path}: {source}")]
    Io {
        /// Preference file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The preference file is not valid TOML
    #[error("failed to parse preferences: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preferences could not be serialized
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}
