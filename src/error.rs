use std::path::PathBuf;
use thiserror::Error;

use crate::types::MAX_PREFIX_LEN;

#[derive(Debug, Error)]
pub enum GuildConfigError {
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Config store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Failed to send reply: {0}")]
    Reply(#[from] ReplyError),

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Invalid default for '{key}': {reason}")]
    InvalidDefault { key: String, reason: String },

    #[error("No store path: pass --store or set up a platform data directory")]
    NoStorePath,
}

/// Rejected input. The `Display` text is shown to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("You need to specify the prefix.")]
    PrefixEmpty,

    #[error("The prefix can be up to {max} characters.", max = MAX_PREFIX_LEN)]
    PrefixTooLong { len: usize },

    #[error("You need to specify the channel")]
    ChannelMissing,

    #[error("Couldn't find the channel you're looking for.")]
    ChannelNotFound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Cannot write '{path}': an intermediate key is not a table")]
    PathConflict { path: String },

    #[error("Timed out waiting for the lock on {path} after {retries} retries")]
    LockTimeout { path: PathBuf, retries: u32 },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReplyError(pub String);
