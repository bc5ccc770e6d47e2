use std::path::{Path, PathBuf};

use super::env::load_env_vars;
use super::{ConfigError, Options};

/// A source in the options loading pipeline.
#[derive(Debug)]
enum OptionsSource {
    File { path: PathBuf, required: bool },
    Env { prefix: String, separator: String },
}

/// Builder for [`Options`].
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Directories added with [`include_dir`](Self::include_dir)
/// are appended after every source has been applied.
///
/// ## Example
///
/// ```no_run
/// use ztk::Options;
///
/// let options = Options::builder()
///     .with_file("ztk.toml", false)
///     .with_env("ZTK", "__")
///     .include_dir("/usr/share/robots")
///     .build()?;
/// # Ok::<(), ztk::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct OptionsBuilder {
    sources: Vec<OptionsSource>,
    include_dirs: Vec<PathBuf>,
}

impl OptionsBuilder {
    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(OptionsSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Overlays environment variables named `{prefix}{separator}{option}`.
    ///
    /// `include_dirs` is split on the platform path separator, so
    /// `ZTK__INCLUDE_DIRS=/a:/b` yields two directories on Unix.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(OptionsSource::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    /// Appends a directory to the include search path.
    pub fn include_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.include_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads and merges every source, then deserializes the result.
    pub fn build(self) -> Result<Options, ConfigError> {
        let mut merged = toml::Table::new();

        for source in self.sources {
            match source {
                OptionsSource::File { path, required } => {
                    if let Some(table) = load_options_file(&path, required)? {
                        deep_merge(&mut merged, table);
                    }
                }
                OptionsSource::Env { prefix, separator } => {
                    load_env_vars(&mut merged, &prefix, &separator);
                }
            }
        }

        let mut options: Options = toml::Value::Table(merged)
            .try_into()
            .map_err(ConfigError::DeserializeError)?;
        options.include_dirs.extend(self.include_dirs);
        tracing::debug!(?options, "options loaded");
        Ok(options)
    }
}

/// Loads and parses a TOML options file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_options_file(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
