//! Command-line interface definition and error-to-exit-code mapping.

use crate::tracing::LogLevel;
use clap::{Parser, Subcommand};
use miette::Diagnostic;
use rubyboot_core::config::{
    BINARY_HOST_ENV, BUILDPACK_DIR_ENV, CONFIG_FILE_NAME, FETCH_TIMEOUT_ENV, STACK_ENV,
};
use rubyboot_core::{BootstrapConfig, PlatformTag, RuntimeSpec};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Pipeline failure exit code (download, extraction, filesystem)
pub const EXIT_FAILED: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(rubyboot::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The pipeline failed (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(rubyboot::cli::failed))]
    Failed {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new pipeline failure
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            help: None,
        }
    }

    /// Message and help text as one block for [`rubyboot_events::Reporter::fatal`].
    #[must_use]
    pub fn fatal_message(&self) -> String {
        let (Self::Config { message, help } | Self::Failed { message, help }) = self;
        match help {
            Some(help) => format!("{message}\n\n{help}"),
            None => message.clone(),
        }
    }
}

/// Convert `rubyboot_core::Error` to the matching `CliError` variant.
///
/// Configuration errors exit with 2; everything else is a pipeline
/// failure. The diagnostic's help text is carried over.
impl From<rubyboot_core::Error> for CliError {
    fn from(err: rubyboot_core::Error) -> Self {
        let help = err.help().map(|h| h.to_string());
        match err {
            // Avoid "Configuration error: " twice in the rendered report.
            rubyboot_core::Error::Configuration { message, .. } => Self::Config { message, help },
            other => Self::Failed {
                message: other.to_string(),
                help,
            },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Failed { .. } => EXIT_FAILED,
    }
}

/// Resolve, fetch and vendor the Ruby runtime for a build.
#[derive(Parser, Debug)]
#[command(name = "rubyboot")]
#[command(about = "Resolve, fetch and vendor the Ruby runtime for a build")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute; `bootstrap` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit build output and logs as JSON lines.
    #[arg(long, global = true, help = "Emit build output and logs as JSON lines")]
    pub json: bool,

    /// Platform tag of the build image.
    #[arg(long, global = true, env = STACK_ENV, help = "Platform tag, e.g. heroku-18")]
    pub stack: Option<String>,

    /// Root directory holding the config document and the vendor tree.
    #[arg(
        long = "buildpack-dir",
        global = true,
        env = BUILDPACK_DIR_ENV,
        value_name = "DIR",
        help = "Root directory holding buildpack.toml and vendor/"
    )]
    pub buildpack_dir: Option<PathBuf>,

    /// Download timeout in seconds.
    #[arg(
        long,
        global = true,
        env = FETCH_TIMEOUT_ENV,
        value_name = "SECONDS",
        help = "Download timeout in seconds"
    )]
    pub timeout: Option<u64>,

    /// Archive URL template with `{platform}` and `{version}` placeholders.
    #[arg(
        long = "binary-host",
        global = true,
        env = BINARY_HOST_ENV,
        value_name = "URL_TEMPLATE",
        help = "Archive URL template with {platform} and {version} placeholders"
    )]
    pub binary_host: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the declared version and make sure it is vendored.
    #[command(about = "Resolve the declared version and make sure it is vendored")]
    Bootstrap {
        /// Config document; defaults to `<buildpack-dir>/buildpack.toml`.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Print the version the config document resolves to.
    #[command(about = "Print the version the config document resolves to")]
    Version {
        /// Config document; defaults to `<buildpack-dir>/buildpack.toml`.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Download and unpack a runtime archive into a directory.
    #[command(about = "Download and unpack a runtime archive into a directory")]
    Fetch {
        /// Runtime version to download.
        version: String,
        /// Destination; must not exist or must be empty.
        dir: PathBuf,
    },
    /// Install a specific version into the vendor store.
    #[command(about = "Install a specific version into the vendor store")]
    Vendor {
        /// Runtime version to install.
        version: String,
    },
}

impl Cli {
    /// The subcommand, defaulting to `bootstrap`.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Bootstrap { config: None })
    }

    /// The platform tag from `--stack` / `STACK`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if it is unset or invalid.
    pub fn platform(&self) -> Result<PlatformTag, CliError> {
        let stack = self.stack.as_deref().ok_or_else(|| {
            CliError::config_with_help(
                format!("{STACK_ENV} is not set"),
                "Set STACK to the build image's platform tag, e.g. heroku-18",
            )
        })?;
        Ok(PlatformTag::new(stack)?)
    }

    /// The root directory from `--buildpack-dir` / `BUILDPACK_DIR`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if it is unset.
    pub fn root(&self) -> Result<PathBuf, CliError> {
        self.buildpack_dir.clone().ok_or_else(|| {
            CliError::config_with_help(
                format!("{BUILDPACK_DIR_ENV} is not set"),
                "Set BUILDPACK_DIR to the directory that should hold vendor/",
            )
        })
    }

    /// The runtime, with `--binary-host` applied.
    #[must_use]
    pub fn runtime(&self) -> RuntimeSpec {
        match &self.binary_host {
            Some(template) => RuntimeSpec::ruby().with_url_template(template.as_str()),
            None => RuntimeSpec::ruby(),
        }
    }

    /// Config document path: `explicit`, or `buildpack.toml` under the root.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if neither is available.
    pub fn config_path(&self, explicit: Option<&PathBuf>) -> Result<PathBuf, CliError> {
        match explicit {
            Some(path) => Ok(path.clone()),
            None => Ok(self.root()?.join(CONFIG_FILE_NAME)),
        }
    }

    /// Build the pipeline configuration from flags and environment.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for a missing or invalid platform tag,
    /// a missing root, or a zero timeout.
    pub fn bootstrap_config(&self) -> Result<BootstrapConfig, CliError> {
        Ok(BootstrapConfig::new(self.platform()?, self.root()?)
            .with_runtime(self.runtime())
            .with_timeout(self.fetch_timeout()?))
    }

    /// The download timeout from `--timeout` / `RUBYBOOT_FETCH_TIMEOUT`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for a zero timeout.
    pub fn fetch_timeout(&self) -> Result<Duration, CliError> {
        match self.timeout {
            Some(0) => Err(CliError::config_with_help(
                format!("{FETCH_TIMEOUT_ENV} must be greater than zero"),
                "Use a number of seconds, e.g. 120",
            )),
            Some(seconds) => Ok(Duration::from_secs(seconds)),
            None => Ok(BootstrapConfig::DEFAULT_TIMEOUT),
        }
    }
}

/// Parse command line arguments, exiting on `--help` or invalid input.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
