//! HTTP archive fetcher for rubyboot.
//!
//! Downloads prebuilt runtime archives from a binary host and unpacks them
//! with an atomic rename:
//!
//! 1. GET `<template with {platform} and {version}>`, bounded by a timeout
//! 2. Hash the body (SHA-256) for the install manifest
//! 3. Unpack into a hidden staging directory next to `dest`
//! 4. Check for an executable `bin/<runtime>` and rename into place

mod extract;

pub use extract::unpack_tar_gz;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use rubyboot_core::{
    ArchiveFetcher, BootstrapConfig, Error, FetchedArchive, PlatformTag, Result, RuntimeSpec,
    RuntimeVersion, TimeoutStage, staging,
};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches runtime archives over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpArchiveFetcher {
    client: Client,
    runtime: RuntimeSpec,
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpArchiveFetcher {
    /// Create a fetcher for `runtime`.
    ///
    /// `timeout` bounds each whole request, body included; `connect_timeout`
    /// bounds establishing the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built,
    /// which happens only when the TLS backend fails to initialize.
    pub fn new(runtime: RuntimeSpec, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rubyboot/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            runtime,
            timeout,
            connect_timeout,
        })
    }

    /// Create a fetcher from a bootstrap configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpArchiveFetcher::new`].
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        Self::new(
            config.runtime.clone(),
            config.timeout,
            config.connect_timeout,
        )
    }

    /// URL of the archive for `version` on `platform`.
    #[must_use]
    pub fn download_url(&self, version: &RuntimeVersion, platform: &PlatformTag) -> String {
        self.runtime.download_url(version, platform)
    }

    async fn download(
        &self,
        url: &str,
        version: &RuntimeVersion,
        platform: &PlatformTag,
    ) -> Result<Bytes> {
        info!(%url, "Downloading runtime archive");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let help = matches!(status, StatusCode::NOT_FOUND | StatusCode::FORBIDDEN).then(|| {
                format!(
                    "{} {version} is not available for {platform}; check the declared version",
                    self.runtime.name
                )
            });
            return Err(Error::unavailable(url, status.as_u16(), help));
        }

        response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, &e))
    }

    fn request_error(&self, url: &str, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            // A timed-out connect attempt is also flagged as a connect error.
            if err.is_connect() {
                Error::timeout(url, TimeoutStage::Connect, self.connect_timeout)
            } else {
                Error::timeout(url, TimeoutStage::Download, self.timeout)
            }
        } else {
            Error::network(url, err.to_string())
        }
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(
        &self,
        version: &RuntimeVersion,
        platform: &PlatformTag,
        dest: &Path,
    ) -> Result<FetchedArchive> {
        let url = self.download_url(version, platform);
        let data = self.download(&url, version, platform).await?;

        let sha256 = format!("{:x}", Sha256::digest(&data));
        let size = data.len() as u64;
        debug!(%url, size, %sha256, "Downloaded runtime archive");

        let parent = dest.parent().ok_or_else(|| {
            Error::configuration(format!("{} has no parent directory", dest.display()))
        })?;
        let staging = staging::staging_dir(parent, "download")?;
        let staged = staging.path().to_path_buf();

        let entries = tokio::task::spawn_blocking(move || unpack_tar_gz(&data, &staged))
            .await
            .map_err(|e| Error::extraction(format!("extraction task failed: {e}")))??;
        debug!(entries, "Unpacked runtime archive");

        self.runtime.verify_install(staging.path())?;
        staging::promote(staging.path(), dest)?;

        Ok(FetchedArchive { url, sha256, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(template: &str) -> HttpArchiveFetcher {
        HttpArchiveFetcher::new(
            RuntimeSpec::ruby().with_url_template(template),
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_name() {
        assert_eq!(fetcher("http://host/{platform}/{version}").name(), "http");
    }

    #[test]
    fn test_download_url() {
        let fetcher = fetcher("http://host/{platform}/ruby-{version}.tgz");
        assert_eq!(
            fetcher.download_url(
                &RuntimeVersion::new("2.6.6"),
                &PlatformTag::new("heroku-18").unwrap()
            ),
            "http://host/heroku-18/ruby-2.6.6.tgz"
        );
    }

    #[test]
    fn test_default_host() {
        let config = BootstrapConfig::new(PlatformTag::new("heroku-20").unwrap(), "/bp");
        let fetcher = HttpArchiveFetcher::from_config(&config).unwrap();
        assert_eq!(
            fetcher.download_url(
                &RuntimeVersion::new("3.0.0"),
                &PlatformTag::new("heroku-20").unwrap()
            ),
            "https://heroku-buildpack-ruby.s3.us-east-1.amazonaws.com/heroku-20/ruby-3.0.0.tgz"
        );
    }
}
