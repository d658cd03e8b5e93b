//! The vendor store: a per-platform cache of installed runtimes.
//!
//! Layout:
//!
//! ```text
//! <root>/vendor/<runtime>/
//! ├── heroku-18/            # one complete install per platform tag
//! │   ├── .rubyboot-manifest.json
//! │   └── bin/ruby ...
//! ├── heroku-20/
//! └── .heroku-20.XXXX.tmp   # staging, only while an install is running
//! ```
//!
//! A platform's directory is created only by renaming a fully staged
//! install into place, so it is either complete or absent. Staging
//! directories older than [`VendorStore::stale_after`] were left by a
//! killed run and are removed by the next [`VendorStore::ensure_installed`].

use crate::config::BootstrapConfig;
use crate::fetch::ArchiveFetcher;
use crate::manifest::InstallManifest;
use crate::platform::PlatformTag;
use crate::runtime::{RuntimeSpec, is_executable};
use crate::staging;
use crate::version::RuntimeVersion;
use crate::Result;
use rubyboot_events::Reporter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// What the store holds for a platform, relative to a requested version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing installed.
    Missing,
    /// The requested version is installed.
    Current(InstallManifest),
    /// Something else is installed: another version, or an install
    /// without a readable manifest.
    Stale {
        /// Version recorded by the existing install, if any.
        found: Option<RuntimeVersion>,
    },
}

/// How [`VendorStore::ensure_installed`] satisfied a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// Already installed; nothing was fetched.
    Cached,
    /// Fetched into an empty slot.
    Fetched,
    /// Fetched and swapped in for a stale install.
    Replaced {
        /// Version of the install that was replaced, if known.
        previous: Option<RuntimeVersion>,
    },
}

/// An installed runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// The vendor path, `<root>/vendor/<runtime>/<platform>`.
    pub path: PathBuf,
    /// Installed version.
    pub version: RuntimeVersion,
    /// Platform the install belongs to.
    pub platform: PlatformTag,
    /// Whether the install was fetched by this call.
    pub status: InstallStatus,
}

impl Installation {
    /// Whether this call downloaded anything.
    #[must_use]
    pub const fn was_fetched(&self) -> bool {
        !matches!(self.status, InstallStatus::Cached)
    }
}

/// Deterministic on-disk cache of vendored runtimes.
#[derive(Debug, Clone)]
pub struct VendorStore {
    root: PathBuf,
    runtime: RuntimeSpec,
    stale_after: Duration,
}

impl VendorStore {
    /// Age after which a staging directory counts as abandoned, twice the
    /// default download budget.
    pub const DEFAULT_STALE_AFTER: Duration =
        Duration::from_secs(2 * BootstrapConfig::DEFAULT_TIMEOUT.as_secs());

    /// Store rooted at `root` for `runtime`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, runtime: RuntimeSpec) -> Self {
        Self {
            root: root.into(),
            runtime,
            stale_after: Self::DEFAULT_STALE_AFTER,
        }
    }

    /// Store for a bootstrap run; staging directories are abandoned after
    /// twice the configured download budget.
    #[must_use]
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(&config.root, config.runtime.clone())
            .with_stale_after(config.timeout.saturating_mul(2))
    }

    /// Set the age after which staging directories are removed.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Age after which a staging directory counts as abandoned.
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/vendor/<runtime>`, parent of every platform's install.
    #[must_use]
    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join("vendor").join(&self.runtime.name)
    }

    /// `<root>/vendor/<runtime>/<platform>`.
    #[must_use]
    pub fn vendor_path(&self, platform: &PlatformTag) -> PathBuf {
        self.runtime_dir().join(platform.as_str())
    }

    /// Path of the runtime executable for `platform`.
    #[must_use]
    pub fn executable_path(&self, platform: &PlatformTag) -> PathBuf {
        self.vendor_path(platform).join(self.runtime.executable())
    }

    /// Inspect what is installed for `platform`.
    #[must_use]
    pub fn lookup(&self, version: &RuntimeVersion, platform: &PlatformTag) -> CacheState {
        let path = self.vendor_path(platform);
        let occupied = std::fs::read_dir(&path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if !occupied {
            return CacheState::Missing;
        }

        let manifest = InstallManifest::load(&path);
        let has_executable = is_executable(&path.join(self.runtime.executable()));
        match manifest {
            Some(manifest) if has_executable && &manifest.version == version => {
                CacheState::Current(manifest)
            }
            other => CacheState::Stale {
                found: other.map(|m| m.version),
            },
        }
    }

    /// Make sure `version` is installed for `platform`, fetching on a miss.
    ///
    /// Repeated calls with the same arguments fetch at most once. A failed
    /// fetch leaves the vendor path exactly as it was.
    ///
    /// # Errors
    ///
    /// Propagates fetcher failures and returns [`crate::Error::Io`] if the
    /// staged install cannot be moved into place.
    pub async fn ensure_installed(
        &self,
        version: &RuntimeVersion,
        platform: &PlatformTag,
        fetcher: &dyn ArchiveFetcher,
        reporter: &dyn Reporter,
    ) -> Result<Installation> {
        let name = &self.runtime.name;
        let path = self.vendor_path(platform);

        staging::sweep_abandoned(
            &self.runtime_dir(),
            &[platform.as_str(), staging::REPLACED_LABEL],
            self.stale_after,
        );

        let previous = match self.lookup(version, platform) {
            CacheState::Current(_) => {
                debug!(path = %path.display(), %version, "Runtime already installed");
                reporter.topic(&format!("Using {name} {version} for {platform} (cached)"));
                return Ok(self.installation(version, platform, InstallStatus::Cached));
            }
            CacheState::Missing => None,
            CacheState::Stale { found } => {
                let installed = found
                    .as_ref()
                    .map_or_else(|| "an unknown version".to_string(), |v| format!("{name} {v}"));
                reporter.warn(&format!(
                    "Replacing {installed} in {} with {name} {version}",
                    path.display()
                ));
                Some(found)
            }
        };

        reporter.topic(&format!("Installing {name} {version} for {platform}"));
        info!(fetcher = fetcher.name(), %version, %platform, "Fetching runtime");

        let staging = staging::staging_dir(&self.runtime_dir(), platform.as_str())?;
        let install_dir = staging.path().join(platform.as_str());

        let fetched = fetcher.fetch(version, platform, &install_dir).await?;
        self.runtime.verify_install(&install_dir)?;
        InstallManifest::new(name.as_str(), version.clone(), platform.clone(), Some(&fetched))
            .write(&install_dir)?;

        let swapped = if previous.is_some() {
            staging::replace(&install_dir, &path)
        } else {
            staging::promote(&install_dir, &path)
        };

        if let Err(err) = swapped {
            // Another build sharing this root may have finished first.
            if let CacheState::Current(_) = self.lookup(version, platform) {
                info!(path = %path.display(), "Concurrent install finished first, using it");
                return Ok(self.installation(version, platform, InstallStatus::Cached));
            }
            return Err(err);
        }

        reporter.detail(&format!(
            "Installed {name} {version} to {} ({} bytes from {})",
            path.display(),
            fetched.size,
            fetched.url
        ));
        let status = match previous {
            Some(previous) => InstallStatus::Replaced { previous },
            None => InstallStatus::Fetched,
        };
        Ok(self.installation(version, platform, status))
    }

    fn installation(
        &self,
        version: &RuntimeVersion,
        platform: &PlatformTag,
        status: InstallStatus,
    ) -> Installation {
        Installation {
            path: self.vendor_path(platform),
            version: version.clone(),
            platform: platform.clone(),
            status,
        }
    }
}
