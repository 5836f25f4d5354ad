//! Error types shared across shellgram crates.
//!
//! [`ChannelError`] covers chat-transport failures, [`ConfigError`] covers
//! loading and validating the configuration file. Task and registry errors
//! live next to the code that produces them in `shellgram-core`.

use std::path::PathBuf;

use thiserror::Error;

/// Chat-transport error type.
///
/// Used by channel implementations to report failures in connecting,
/// authenticating, or exchanging messages with the chat backend.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChannelError {
    /// Failed to establish a connection to the chat backend.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The bot credential was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Sending a message or document failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving updates failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The consumer of inbound events has gone away.
    #[error("inbound queue closed")]
    QueueClosed,
}

/// Configuration loading / validation error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// No configuration file was found at any candidate location.
    #[error("no config file found (tried: {})", display_paths(.tried))]
    NotFound {
        /// Every path that was checked, in discovery order.
        tried: Vec<PathBuf>,
    },

    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not match the schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration parsed but is semantically unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
