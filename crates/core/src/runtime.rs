//! Description of the runtime being provisioned.

use crate::platform::PlatformTag;
use crate::version::RuntimeVersion;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Ruby version installed when the config document does not declare one.
pub const DEFAULT_RUBY_VERSION: &str = "2.6.6";

/// Config key holding the requested Ruby version.
pub const RUBY_VERSION_KEY: &str = "ruby_version";

/// Download locator for prebuilt Ruby archives.
///
/// `{platform}` and `{version}` are substituted before the request.
pub const RUBY_BINARY_HOST_TEMPLATE: &str =
    "https://heroku-buildpack-ruby.s3.us-east-1.amazonaws.com/{platform}/ruby-{version}.tgz";

/// The runtime rubyboot provisions, and where its archives come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSpec {
    /// Runtime name; also the executable name under `bin/` and the vendor
    /// sub-directory.
    pub name: String,
    /// Config key holding the requested version.
    pub version_key: String,
    /// Version used when the config does not declare one.
    pub default_version: RuntimeVersion,
    /// Archive URL template with `{platform}` and `{version}` placeholders.
    pub url_template: String,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self::ruby()
    }
}

impl RuntimeSpec {
    /// The Ruby runtime served from the buildpack binary host.
    #[must_use]
    pub fn ruby() -> Self {
        Self {
            name: "ruby".to_string(),
            version_key: RUBY_VERSION_KEY.to_string(),
            default_version: RuntimeVersion::new(DEFAULT_RUBY_VERSION),
            url_template: RUBY_BINARY_HOST_TEMPLATE.to_string(),
        }
    }

    /// Use a different archive URL template.
    #[must_use]
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Expand the URL template for a version and platform.
    #[must_use]
    pub fn download_url(&self, version: &RuntimeVersion, platform: &PlatformTag) -> String {
        self.url_template
            .replace("{platform}", platform.as_str())
            .replace("{version}", version.as_str())
    }

    /// Path of the runtime executable relative to an install root.
    #[must_use]
    pub fn executable(&self) -> PathBuf {
        Path::new("bin").join(&self.name)
    }

    /// Check that `dir` holds a usable runtime tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if `bin/<name>` is missing or not
    /// executable.
    pub fn verify_install(&self, dir: &Path) -> Result<()> {
        let executable = dir.join(self.executable());
        if !executable.is_file() {
            return Err(Error::extraction(format!(
                "archive did not contain {}",
                self.executable().display()
            )));
        }
        if !is_executable(&executable) {
            return Err(Error::extraction(format!(
                "{} is not executable",
                self.executable().display()
            )));
        }
        Ok(())
    }
}

/// Whether `path` is a file the current user may execute.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_download_url_expansion() {
        let spec = RuntimeSpec::ruby();
        let url = spec.download_url(
            &RuntimeVersion::new("2.6.6"),
            &PlatformTag::new("heroku-18").unwrap(),
        );
        assert_eq!(
            url,
            "https://heroku-buildpack-ruby.s3.us-east-1.amazonaws.com/heroku-18/ruby-2.6.6.tgz"
        );
    }

    #[test]
    fn test_custom_template() {
        let spec = RuntimeSpec::ruby().with_url_template("http://mirror.local/{version}/{platform}");
        let url = spec.download_url(
            &RuntimeVersion::new("3.1.4"),
            &PlatformTag::new("heroku-22").unwrap(),
        );
        assert_eq!(url, "http://mirror.local/3.1.4/heroku-22");
    }

    #[test]
    fn test_executable_path() {
        assert_eq!(RuntimeSpec::ruby().executable(), PathBuf::from("bin/ruby"));
    }

    #[test]
    fn test_verify_install_requires_binary() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("lib")).unwrap();

        let err = RuntimeSpec::ruby().verify_install(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(err.to_string().contains("bin/ruby"));
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_install_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("ruby"), b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(bin.join("ruby"), std::fs::Permissions::from_mode(0o644))
            .unwrap();

        let spec = RuntimeSpec::ruby();
        assert!(spec.verify_install(temp.path()).is_err());

        std::fs::set_permissions(bin.join("ruby"), std::fs::Permissions::from_mode(0o755))
            .unwrap();
        assert!(spec.verify_install(temp.path()).is_ok());
    }
}
