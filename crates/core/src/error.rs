//! Error types for the bootstrap pipeline.
//!
//! Every variant here is fatal to the enclosing build. Config document
//! problems are not represented: the version resolver recovers from them
//! locally (see [`crate::version::ConfigError`]).

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type for rubyboot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The part of a request a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Establishing the connection.
    Connect,
    /// The whole request, body included.
    Download,
}

impl std::fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("Connection to"),
            Self::Download => f.write_str("Download of"),
        }
    }
}

/// Errors surfaced by the bootstrap pipeline.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Invalid invocation, such as a malformed platform tag.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(rubyboot::config))]
    Configuration {
        /// What is wrong.
        message: String,
        /// How to fix it.
        #[help]
        help: Option<String>,
    },

    /// The archive request failed before a response arrived.
    #[error("Failed to download {url}: {message}")]
    #[diagnostic(
        code(rubyboot::fetch::network),
        help("Check network connectivity to the binary host")
    )]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The archive request exceeded one of its time budgets.
    #[error("{stage} {url} timed out after {budget:?}")]
    #[diagnostic(
        code(rubyboot::fetch::timeout),
        help("Check connectivity to the binary host, or raise RUBYBOOT_FETCH_TIMEOUT if it is slow")
    )]
    Timeout {
        /// Requested URL.
        url: String,
        /// Which budget ran out.
        stage: TimeoutStage,
        /// The budget that was exceeded.
        budget: Duration,
    },

    /// The binary host answered with a non-success status.
    #[error("Binary host returned HTTP {status} for {url}")]
    #[diagnostic(code(rubyboot::fetch::unavailable))]
    Unavailable {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Likely cause.
        #[help]
        help: Option<String>,
    },

    /// The archive was downloaded but could not be unpacked into a valid
    /// runtime tree.
    #[error("Failed to extract runtime archive: {message}")]
    #[diagnostic(code(rubyboot::fetch::extraction))]
    Extraction {
        /// What went wrong.
        message: String,
    },

    /// Filesystem failure while staging or moving an install.
    #[error("I/O {operation} failed{}: {source}", path_suffix(.path))]
    #[diagnostic(
        code(rubyboot::io),
        help("Check permissions and free space under the vendor root")
    )]
    Io {
        /// Underlying error.
        #[source]
        source: std::io::Error,
        /// Path involved, if known.
        path: Option<PathBuf>,
        /// Operation that failed.
        operation: String,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(String::new, |p| format!(" on {}", p.display()))
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>, stage: TimeoutStage, budget: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            stage,
            budget,
        }
    }

    /// Create an unavailable error for a non-success HTTP status.
    #[must_use]
    pub fn unavailable(url: impl Into<String>, status: u16, help: Option<String>) -> Self {
        Self::Unavailable {
            url: url.into(),
            status,
            help,
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an I/O error with the failed operation and path.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.to_path_buf()),
            operation: operation.into(),
        }
    }

    /// Whether the error stems from how rubyboot was invoked rather than
    /// from the fetch or the filesystem.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "operation".to_string(),
        }
    }
}
