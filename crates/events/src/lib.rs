//! Progress and error reporting hooks for rubyboot.
//!
//! The bootstrap pipeline narrates its work through the [`Reporter`] trait
//! and never renders anything itself. Three signals matter to a build log:
//!
//! - `topic`: a headline for each major step
//! - `warn`: a warning the renderer may defer until the end of the run
//! - `fatal`: the final, multi-line diagnostic before the process exits
//!
//! Renderers live in [`renderers`]. The console renderer reproduces the
//! classic buildpack output format:
//!
//! ```text
//! -----> Installing ruby 2.6.6 for heroku-18
//!        Downloaded 24.1 MiB
//! ```
//!
//! # Usage
//!
//! ```rust
//! use rubyboot_events::{RecordingReporter, Reporter};
//!
//! let reporter = RecordingReporter::new();
//! reporter.topic("Installing ruby 2.6.6 for heroku-18");
//! reporter.warn("No ruby_version declared, using default");
//!
//! assert_eq!(reporter.topics(), vec!["Installing ruby 2.6.6 for heroku-18"]);
//! ```

pub mod event;
pub mod renderers;
pub mod reporter;

pub use event::{EventKind, ReportEvent};
pub use renderers::{ConsoleRenderer, ConsoleRendererConfig, JsonRenderer};
pub use reporter::{NullReporter, RecordingReporter, Reporter};
