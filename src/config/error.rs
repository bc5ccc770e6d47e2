use std::path::PathBuf;
use thiserror::Error;

/// Failure to assemble processor [`Options`](super::Options).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("ztk options file '{0}' is required but does not exist")]
    FileNotFound(PathBuf),

    #[error("cannot read ztk options file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("ztk options file '{path}' is not valid TOML: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid ztk option value: {0}")]
    DeserializeError(#[from] toml::de::Error),
}
