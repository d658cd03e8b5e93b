//! Runtime version resolution from a declarative config document.
//!
//! The config is a TOML file (usually `buildpack.toml`). Exactly one key is
//! read; everything else is ignored. Resolution never fails: a missing or
//! unusable document yields the runtime's default version, because a build
//! without a declared version should still get a working runtime.

use crate::runtime::RuntimeSpec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A requested runtime version, e.g. `2.6.6`.
///
/// Opaque: compared by exact string match only, never parsed as semver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    /// Wrap a version string verbatim.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a config document did not yield a version.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document does not exist.
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    /// The document exists but could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Unreadable {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not valid TOML.
    #[error("{} is not valid TOML: {source}", .path.display())]
    Malformed {
        /// Document path.
        path: PathBuf,
        /// Parser error.
        source: toml::de::Error,
    },

    /// No entry for the version key.
    #[error("no `{key}` entry in {}", .path.display())]
    KeyAbsent {
        /// Document path.
        path: PathBuf,
        /// Key that was looked up.
        key: String,
    },

    /// The version key holds something other than a string.
    #[error("`{key}` in {} is not a string", .path.display())]
    NotAString {
        /// Document path.
        path: PathBuf,
        /// Key that was looked up.
        key: String,
    },
}

/// Where a resolved version came from.
#[derive(Debug)]
pub enum VersionSource {
    /// Declared in the config document.
    Declared,
    /// Fell back to the default because the document did not yield one.
    Default(ConfigError),
}

/// A version together with its provenance.
#[derive(Debug)]
pub struct ResolvedVersion {
    /// The version to install.
    pub version: RuntimeVersion,
    /// Whether it was declared or defaulted.
    pub source: VersionSource,
}

impl ResolvedVersion {
    /// Whether the version is the fallback default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self.source, VersionSource::Default(_))
    }
}

/// Read the Ruby version declared in `config_path`, or the default.
///
/// Never fails; see [`resolve_version_for`] to learn why a default was used.
#[must_use]
pub fn resolve_version(config_path: &Path) -> RuntimeVersion {
    resolve_version_for(config_path, &RuntimeSpec::ruby()).version
}

/// Read the version `runtime` declares in `config_path`, or its default.
#[must_use]
pub fn resolve_version_for(config_path: &Path, runtime: &RuntimeSpec) -> ResolvedVersion {
    match read_version(config_path, &runtime.version_key) {
        Ok(version) => {
            debug!(path = %config_path.display(), %version, "Using declared runtime version");
            ResolvedVersion {
                version,
                source: VersionSource::Declared,
            }
        }
        Err(reason) => {
            debug!(
                path = %config_path.display(),
                %reason,
                default = %runtime.default_version,
                "Falling back to default runtime version"
            );
            ResolvedVersion {
                version: runtime.default_version.clone(),
                source: VersionSource::Default(reason),
            }
        }
    }
}

/// Read the string under `key` from the TOML document at `path`.
///
/// The key is looked up at the top level first, then in nested tables
/// breadth-first in document order. The value is returned verbatim.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing why no version could be read.
pub fn read_version(path: &Path, key: &str) -> Result<RuntimeVersion, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::Missing(path.to_path_buf())
        } else {
            ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let document: toml::Table = toml::from_str(&contents).map_err(|source| {
        ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    })?;

    match find_key(&document, key) {
        Some(toml::Value::String(version)) => Ok(RuntimeVersion::new(version.as_str())),
        Some(_) => Err(ConfigError::NotAString {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
        None => Err(ConfigError::KeyAbsent {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
    }
}

fn find_key<'a>(document: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let mut queue = VecDeque::from([document]);
    while let Some(table) = queue.pop_front() {
        if let Some(value) = table.get(key) {
            return Some(value);
        }
        for value in table.values() {
            match value {
                toml::Value::Table(child) => queue.push_back(child),
                toml::Value::Array(items) => {
                    queue.extend(items.iter().filter_map(toml::Value::as_table));
                }
                _ => {}
            }
        }
    }
    None
}
