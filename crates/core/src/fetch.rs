//! The archive fetcher seam.
//!
//! The vendor store decides *whether* to fetch; implementations of
//! [`ArchiveFetcher`] decide *how*. The HTTP implementation lives in
//! `rubyboot-tools-http`.

use crate::Result;
use crate::platform::PlatformTag;
use crate::version::RuntimeVersion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a successful fetch produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedArchive {
    /// Where the archive came from.
    pub url: String,
    /// SHA-256 of the archive, hex encoded.
    pub sha256: String,
    /// Archive size in bytes.
    pub size: u64,
}

/// Obtains a runtime distribution and unpacks it.
///
/// Contract for [`ArchiveFetcher::fetch`]:
///
/// - `dest` must not exist, or must be an empty directory.
/// - On success `dest` holds the complete runtime tree, including an
///   executable `bin/<runtime>`.
/// - On failure `dest` is not created. Partial extraction happens only in
///   a temporary sibling that is discarded.
/// - Network operations are bounded by a timeout; exceeding it is an
///   [`Error::Timeout`](crate::Error::Timeout), never a hang.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch `version` for `platform` into `dest`.
    async fn fetch(
        &self,
        version: &RuntimeVersion,
        platform: &PlatformTag,
        dest: &Path,
    ) -> Result<FetchedArchive>;
}
