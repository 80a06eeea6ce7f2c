//! Error types shared by the task store, repository, and interaction protocol.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of per-chat task operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Task text was empty after trimming.
    #[error("Task text cannot be empty")]
    EmptyText,

    /// No task with this id exists in the chat.
    #[error("Task {0} not found")]
    NotFound(u64),
}

/// Failures reading or writing the task document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read task document {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write task document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("task document {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("task document {path} must be a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("failed to encode task document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A malformed interaction descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("empty action descriptor")]
    Empty,

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("page must be at least 1")]
    ZeroPage,

    #[error("malformed action descriptor '{0}'")]
    Malformed(String),
}
