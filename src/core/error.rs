// src/core/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Raised when a caller fails the nonce or capability check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Invalid security token")]
    InvalidNonce,
    #[error("Unauthorized request")]
    MissingCapability,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("content root {path} is not readable: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content root {0} is not a directory")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading result store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing result store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("result store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding result store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("result store lock poisoned")]
    Poisoned,
}

/// Everything a scan step or reset can fail with.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Stalled(String),
}

impl CoordinatorError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoordinatorError::Unauthorized(_))
    }
}
