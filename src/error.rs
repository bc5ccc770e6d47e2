use std::path::PathBuf;

use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the ztk library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read input stream: {0}")]
    Stream(std::io::Error),

    #[error("file is already open: {0}")]
    AlreadyOpen(PathBuf),

    #[error("no {0} to evaluate")]
    Empty(&'static str),

    #[error("error when evaluating {field}: {source}")]
    Evaluation { field: String, source: EvalError },
}

/// Rejection raised by an evaluate callback of a [`Property`](crate::Property).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EvalError(String);

impl EvalError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<Error> for EvalError {
    /// Lets a tag callback propagate a nested key evaluation with `?`.
    fn from(error: Error) -> Self {
        Self(error.to_string())
    }
}
