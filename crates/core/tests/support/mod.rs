//! Shared fixtures for rubyboot-core integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rubyboot_core::{
    ArchiveFetcher, Error, FetchedArchive, InstallManifest, PlatformTag, Result, RuntimeVersion,
    staging,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the fake fetcher behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Stage a complete runtime tree.
    Succeed,
    /// Write part of the tree, then fail like a truncated archive.
    FailMidExtraction,
    /// Fail before writing anything, like a refused connection.
    FailNetwork,
}

/// Fetcher that builds a runtime tree locally and counts its calls.
#[derive(Debug)]
pub struct FakeFetcher {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveFetcher for FakeFetcher {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(
        &self,
        version: &RuntimeVersion,
        platform: &PlatformTag,
        dest: &Path,
    ) -> Result<FetchedArchive> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrently polled installs a chance to interleave.
        tokio::task::yield_now().await;

        let url = format!("fake://{platform}/ruby-{version}.tgz");
        if self.behavior == Behavior::FailNetwork {
            return Err(Error::network(url, "connection refused"));
        }

        let parent = dest.parent().expect("dest has a parent");
        let staging = staging::staging_dir(parent, "fake")?;
        write_runtime_tree(staging.path(), version);

        if self.behavior == Behavior::FailMidExtraction {
            return Err(Error::extraction("unexpected end of archive"));
        }

        staging::promote(staging.path(), dest)?;
        Ok(FetchedArchive {
            url,
            sha256: "0".repeat(64),
            size: 4096,
        })
    }
}

/// Write a minimal runtime distribution into `dir`.
pub fn write_runtime_tree(dir: &Path, version: &RuntimeVersion) {
    for sub in ["bin", "include", "lib", "share"] {
        std::fs::create_dir_all(dir.join(sub)).unwrap();
    }
    let ruby = dir.join("bin").join("ruby");
    std::fs::write(&ruby, format!("#!/bin/sh\necho ruby {version}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&ruby, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    std::fs::write(dir.join("include").join("ruby.h"), b"/* ruby */").unwrap();
    std::fs::write(dir.join("lib").join("libruby.so"), b"\x7fELF").unwrap();
}

/// Simulate an install left behind by an earlier build.
pub fn install_fixture(vendor_path: &Path, version: &str, platform: &str) {
    let version = RuntimeVersion::new(version);
    write_runtime_tree(vendor_path, &version);
    InstallManifest::new("ruby", version, PlatformTag::new(platform).unwrap(), None)
        .write(vendor_path)
        .unwrap();
}

/// Sorted entry names of `dir`.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
