//! Explicit configuration for a bootstrap run.
//!
//! The process boundary reads `STACK` and `BUILDPACK_DIR` from the
//! environment; everything below it receives a [`BootstrapConfig`] value.

use crate::platform::PlatformTag;
use crate::runtime::RuntimeSpec;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the platform tag.
pub const STACK_ENV: &str = "STACK";
/// Environment variable naming the root directory.
pub const BUILDPACK_DIR_ENV: &str = "BUILDPACK_DIR";
/// Environment variable overriding the fetch timeout, in seconds.
pub const FETCH_TIMEOUT_ENV: &str = "RUBYBOOT_FETCH_TIMEOUT";
/// Environment variable overriding the archive URL template.
pub const BINARY_HOST_ENV: &str = "RUBYBOOT_BINARY_HOST";

/// Name of the config document inside the root directory.
pub const CONFIG_FILE_NAME: &str = "buildpack.toml";

/// Settings for one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Target platform.
    pub platform: PlatformTag,
    /// Root directory; installs go under `<root>/vendor/`.
    pub root: PathBuf,
    /// Upper bound for a whole archive download.
    pub timeout: Duration,
    /// Upper bound for establishing the connection.
    pub connect_timeout: Duration,
    /// Runtime being provisioned.
    pub runtime: RuntimeSpec,
}

impl BootstrapConfig {
    /// Default time budget for an archive download.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
    /// Default time budget for connecting to the binary host.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Ruby configuration for `platform` rooted at `root`.
    #[must_use]
    pub fn new(platform: PlatformTag, root: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            root: root.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            runtime: RuntimeSpec::ruby(),
        }
    }

    /// Set the download timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the runtime being provisioned.
    #[must_use]
    pub fn with_runtime(mut self, runtime: RuntimeSpec) -> Self {
        self.runtime = runtime;
        self
    }

    /// Conventional config document path, `<root>/buildpack.toml`.
    #[must_use]
    pub fn default_config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
