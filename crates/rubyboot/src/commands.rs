//! Subcommand implementations.
//!
//! Each command takes already-validated configuration, reports progress
//! through a [`Reporter`] and returns its result; printing and exiting
//! happen in `main`.

use crate::cli::CliError;
use rubyboot_core::version::resolve_version_for;
use rubyboot_core::{
    ArchiveFetcher, BootstrapConfig, FetchedArchive, Installation, PlatformTag, ResolvedVersion,
    RuntimeSpec, RuntimeVersion, VendorStore,
};
use rubyboot_events::Reporter;
use std::path::Path;
use tracing::instrument;

/// Execute `bootstrap`: resolve the declared version and vendor it.
///
/// # Errors
///
/// Returns the pipeline's failure converted to a [`CliError`].
#[instrument(name = "bootstrap", skip_all)]
pub async fn execute_bootstrap(
    config: &BootstrapConfig,
    config_path: &Path,
    fetcher: &dyn ArchiveFetcher,
    reporter: &dyn Reporter,
) -> Result<Installation, CliError> {
    let install = rubyboot_core::bootstrap(config_path, config, fetcher, reporter).await?;
    reporter.detail(&format!(
        "{} {} ready at {}",
        config.runtime.name,
        install.version,
        install.path.display()
    ));
    Ok(install)
}

/// Execute `version`: the version `config_path` resolves to.
#[must_use]
pub fn execute_version(config_path: &Path, runtime: &RuntimeSpec) -> ResolvedVersion {
    resolve_version_for(config_path, runtime)
}

/// Execute `fetch`: download and unpack one archive into `dir`.
///
/// # Errors
///
/// Returns [`CliError::Config`] if `dir` is a non-empty directory or a
/// file, and the fetcher's failure otherwise.
#[instrument(name = "fetch", skip_all, fields(%version, %platform))]
pub async fn execute_fetch(
    fetcher: &dyn ArchiveFetcher,
    version: &RuntimeVersion,
    platform: &PlatformTag,
    dir: &Path,
    reporter: &dyn Reporter,
) -> Result<FetchedArchive, CliError> {
    if dir.exists() {
        let empty = std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !empty {
            return Err(CliError::config_with_help(
                format!("{} already exists and is not an empty directory", dir.display()),
                "Choose a new destination or remove the existing one",
            ));
        }
    }

    reporter.topic(&format!("Fetching ruby {version} for {platform}"));
    let fetched = fetcher.fetch(version, platform, dir).await?;
    reporter.detail(&format!(
        "Unpacked {} ({} bytes, sha256 {}) into {}",
        fetched.url,
        fetched.size,
        fetched.sha256,
        dir.display()
    ));
    Ok(fetched)
}

/// Execute `vendor`: install `version` into the vendor store.
///
/// # Errors
///
/// Returns the store's failure converted to a [`CliError`].
#[instrument(name = "vendor", skip_all, fields(%version))]
pub async fn execute_vendor(
    config: &BootstrapConfig,
    version: &RuntimeVersion,
    fetcher: &dyn ArchiveFetcher,
    reporter: &dyn Reporter,
) -> Result<Installation, CliError> {
    let store = VendorStore::from_config(config);
    Ok(store
        .ensure_installed(version, &config.platform, fetcher, reporter)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rubyboot_core::{Error, InstallStatus};
    use rubyboot_events::RecordingReporter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes an executable `bin/ruby` and nothing else.
    struct StubFetcher {
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArchiveFetcher for StubFetcher {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(
            &self,
            version: &RuntimeVersion,
            platform: &PlatformTag,
            dest: &Path,
        ) -> rubyboot_core::Result<FetchedArchive> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let bin = dest.join("bin");
            std::fs::create_dir_all(&bin)?;
            std::fs::write(bin.join("ruby"), b"#!/bin/sh\n")?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(bin.join("ruby"), std::fs::Permissions::from_mode(0o755))?;
            }
            Ok(FetchedArchive {
                url: format!("stub://{platform}/{version}"),
                sha256: "f".repeat(64),
                size: 1,
            })
        }
    }

    fn config(root: &Path) -> BootstrapConfig {
        BootstrapConfig::new(PlatformTag::new("heroku-18").unwrap(), root)
    }

    #[test]
    fn test_version_reports_default_and_declared() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("buildpack.toml");

        let resolved = execute_version(&path, &RuntimeSpec::ruby());
        assert!(resolved.is_default());

        std::fs::write(&path, "ruby_version = \"3.1.2\"\n").unwrap();
        let resolved = execute_version(&path, &RuntimeSpec::ruby());
        assert_eq!(resolved.version.as_str(), "3.1.2");
        assert!(!resolved.is_default());
    }

    #[tokio::test]
    async fn test_vendor_then_bootstrap_reuses_install() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let fetcher = StubFetcher::new();
        let reporter = RecordingReporter::new();

        let vendored = execute_vendor(&config, &RuntimeVersion::new("2.6.6"), &fetcher, &reporter)
            .await
            .unwrap();
        assert_eq!(vendored.status, InstallStatus::Fetched);

        let install = execute_bootstrap(
            &config,
            &temp.path().join("buildpack.toml"),
            &fetcher,
            &reporter,
        )
        .await
        .unwrap();
        assert_eq!(install.status, InstallStatus::Cached);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_refuses_non_empty_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("keep"), b"x").unwrap();

        let err = execute_fetch(
            &StubFetcher::new(),
            &RuntimeVersion::new("2.6.6"),
            &PlatformTag::new("heroku-18").unwrap(),
            temp.path(),
            &RecordingReporter::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Config { .. }));
    }

    #[tokio::test]
    async fn test_fetch_reports_topic() {
        let temp = TempDir::new().unwrap();
        let reporter = RecordingReporter::new();
        let dir = temp.path().join("out");

        execute_fetch(
            &StubFetcher::new(),
            &RuntimeVersion::new("2.6.6"),
            &PlatformTag::new("heroku-18").unwrap(),
            &dir,
            &reporter,
        )
        .await
        .unwrap();

        assert_eq!(reporter.topics(), vec!["Fetching ruby 2.6.6 for heroku-18"]);
        assert!(dir.join("bin/ruby").is_file());
    }

    #[test]
    fn test_pipeline_error_converts() {
        let err: CliError = Error::extraction("truncated").into();
        assert!(matches!(err, CliError::Failed { .. }));
    }
}
