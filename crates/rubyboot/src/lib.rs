//! rubyboot: resolve, fetch and vendor the Ruby runtime for a build.
//!
//! The binary is a thin boundary around `rubyboot-core`: it turns the
//! environment contract (`STACK`, `BUILDPACK_DIR`) into a
//! [`rubyboot_core::BootstrapConfig`], runs one command, and is the only
//! place that reports a fatal error and exits.

pub mod cli;
pub mod commands;
pub mod tracing;

pub use cli::{CliError, EXIT_CLI, EXIT_FAILED, EXIT_OK, exit_code_for};
