//! Processor options and their loading pipeline.

mod builder;
mod env;
mod error;

use std::path::PathBuf;

use serde::Deserialize;

pub use builder::OptionsBuilder;
pub use error::ConfigError;

/// Default suffix tried when a file named without an extension cannot be opened.
pub const DEFAULT_EXTENSION: &str = "ztk";

/// Settings that control how a [`Processor`](crate::Processor) locates files.
///
/// Options are usually assembled with [`Options::builder`], which layers TOML
/// files and environment variables in registration order:
///
/// ```toml
/// include_dirs = ["/usr/share/robots", "shared"]
/// extension = "ztk"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Directories searched for relative include paths, after the directory
    /// of the including file.
    pub include_dirs: Vec<PathBuf>,
    /// Suffix appended to extensionless paths that fail to open as given.
    /// `None` disables the retry.
    pub extension: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            extension: Some(DEFAULT_EXTENSION.to_string()),
        }
    }
}

impl Options {
    /// Creates a new options builder.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}
