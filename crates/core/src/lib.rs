//! Runtime resolution and vendoring for rubyboot.
//!
//! This crate turns a project's `buildpack.toml` into an installed Ruby
//! under a deterministic, reusable vendor directory:
//!
//! ```text
//! <root>/vendor/ruby/<platform>/
//! ├── .rubyboot-manifest.json
//! ├── bin/ruby
//! ├── include/
//! ├── lib/
//! └── share/
//! ```
//!
//! The pieces, leaf first:
//!
//! - [`version`]: reads the requested version, falling back to a default
//! - [`fetch`]: the [`ArchiveFetcher`] seam implemented by download crates
//! - [`store`]: the [`VendorStore`], which only fetches on a cache miss
//! - [`bootstrap`]: composes the above into one call
//!
//! Installs are staged in temporary siblings and moved into place with a
//! rename (see [`staging`]), so concurrent builds sharing a vendor root
//! observe either a complete install or none.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod platform;
pub mod runtime;
pub mod staging;
pub mod store;
pub mod version;

pub use bootstrap::bootstrap;
pub use config::BootstrapConfig;
pub use error::{Error, Result, TimeoutStage};
pub use fetch::{ArchiveFetcher, FetchedArchive};
pub use manifest::{InstallManifest, MANIFEST_FILE};
pub use platform::PlatformTag;
pub use runtime::{DEFAULT_RUBY_VERSION, RuntimeSpec};
pub use store::{CacheState, InstallStatus, Installation, VendorStore};
pub use version::{ConfigError, ResolvedVersion, RuntimeVersion, VersionSource, resolve_version};
