//! Install manifest recorded alongside each vendored runtime.
//!
//! The executable under `bin/` says *something* is installed; the manifest
//! says *which version*. Without it a stale install under the same
//! platform tag would be indistinguishable from the requested one.

use crate::fetch::FetchedArchive;
use crate::platform::PlatformTag;
use crate::version::RuntimeVersion;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File name of the manifest inside a vendor path.
pub const MANIFEST_FILE: &str = ".rubyboot-manifest.json";

/// Record of what is installed in a vendor path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    /// Runtime name.
    pub runtime: String,
    /// Installed version.
    pub version: RuntimeVersion,
    /// Platform the archive was built for.
    pub platform: PlatformTag,
    /// Archive URL, if fetched over the network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Archive SHA-256, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// When the install was staged.
    pub installed_at: DateTime<Utc>,
}

impl InstallManifest {
    /// Manifest for a freshly fetched archive.
    #[must_use]
    pub fn new(
        runtime: impl Into<String>,
        version: RuntimeVersion,
        platform: PlatformTag,
        fetched: Option<&FetchedArchive>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            version,
            platform,
            source_url: fetched.map(|f| f.url.clone()),
            sha256: fetched.map(|f| f.sha256.clone()),
            installed_at: Utc::now(),
        }
    }

    /// Load the manifest from the install at `dir`.
    ///
    /// A missing or unparseable manifest yields `None`: both mean the
    /// installed version is unknown.
    #[must_use]
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(MANIFEST_FILE);
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable install manifest");
                None
            }
        }
    }

    /// Write the manifest into `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::io(std::io::Error::other(e), &path, "serialize manifest"))?;
        std::fs::write(&path, contents).map_err(|e| Error::io(e, &path, "write manifest"))
    }
}
