//! The "ensure runtime ready" entry point used by the build.

use crate::config::BootstrapConfig;
use crate::fetch::ArchiveFetcher;
use crate::store::{Installation, VendorStore};
use crate::version::{VersionSource, resolve_version_for};
use crate::Result;
use rubyboot_events::Reporter;
use std::path::Path;
use tracing::instrument;

/// Resolve the version declared in `config_path` and make sure it is
/// installed under `config.root` for `config.platform`.
///
/// A missing or unusable config document is not an error: the runtime's
/// default version is installed and a warning is reported.
///
/// # Errors
///
/// Returns the fetcher's error on a failed download or extraction, and
/// [`crate::Error::Io`] if the install cannot be written.
#[instrument(skip_all, fields(platform = %config.platform, root = %config.root.display()))]
pub async fn bootstrap(
    config_path: &Path,
    config: &BootstrapConfig,
    fetcher: &dyn ArchiveFetcher,
    reporter: &dyn Reporter,
) -> Result<Installation> {
    let resolved = resolve_version_for(config_path, &config.runtime);
    if let VersionSource::Default(reason) = &resolved.source {
        reporter.warn(&format!(
            "No {} declared ({reason}).\nUsing default {} {}.",
            config.runtime.version_key, config.runtime.name, resolved.version
        ));
    }

    let store = VendorStore::from_config(config);
    store
        .ensure_installed(&resolved.version, &config.platform, fetcher, reporter)
        .await
}
