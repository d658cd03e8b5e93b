//! Console renderer in the buildpack log format.
//!
//! ```text
//! -----> Installing ruby 2.6.6 for heroku-18
//!        Downloaded 24.1 MiB from https://...
//! ## Warning
//!
//! No ruby_version found in buildpack.toml
//! ```
//!
//! Warnings are collected and written when the run finishes (or right
//! before a fatal error), so they are the last thing a user reads.

use crate::reporter::Reporter;
use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

const TOPIC_PREFIX: &str = "-----> ";
const DETAIL_INDENT: &str = "       ";
const ERROR_PREFIX: &str = " !";
const BOLD_RED: &str = "\x1b[1m\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Console renderer configuration.
#[derive(Debug, Clone)]
pub struct ConsoleRendererConfig {
    /// Whether to use ANSI colors for the fatal block.
    pub colors: bool,
}

impl Default for ConsoleRendererConfig {
    fn default() -> Self {
        Self {
            colors: io::stdout().is_terminal(),
        }
    }
}

/// Renders reporter events as buildpack-style lines to a writer.
#[derive(Debug)]
pub struct ConsoleRenderer<W: Write + Send> {
    out: Mutex<W>,
    deferred: Mutex<Vec<String>>,
    config: ConsoleRendererConfig,
}

impl ConsoleRenderer<io::Stdout> {
    /// Renderer writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_config(io::stdout(), ConsoleRendererConfig::default())
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Create a renderer over `out` without colors.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self::with_config(out, ConsoleRendererConfig { colors: false })
    }

    /// Create a renderer over `out` with the given configuration.
    #[must_use]
    pub fn with_config(out: W, config: ConsoleRendererConfig) -> Self {
        Self {
            out: Mutex::new(out),
            deferred: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Consume the renderer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a warning immediately instead of deferring it.
    pub fn warn_now(&self, message: &str) {
        self.write_with(|out| {
            writeln!(out, "## Warning")?;
            writeln!(out)?;
            writeln!(out, "{message}")
        });
    }

    fn flush_deferred(&self) {
        let warnings = std::mem::take(
            &mut *self
                .deferred
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for warning in warnings {
            self.warn_now(&warning);
        }
    }

    fn write_with(&self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Output failures must never abort the build step being narrated.
        let _ = f(&mut *out).and_then(|()| out.flush());
    }
}

impl<W: Write + Send> Reporter for ConsoleRenderer<W> {
    fn topic(&self, message: &str) {
        self.write_with(|out| writeln!(out, "{TOPIC_PREFIX}{message}"));
    }

    fn detail(&self, message: &str) {
        self.write_with(|out| {
            for line in message.lines() {
                writeln!(out, "{DETAIL_INDENT}{line}")?;
            }
            Ok(())
        });
    }

    fn warn(&self, message: &str) {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn fatal(&self, message: &str) {
        self.flush_deferred();
        let colors = self.config.colors;
        self.write_with(|out| {
            if colors {
                writeln!(out, "{BOLD_RED}")?;
            } else {
                writeln!(out)?;
            }
            writeln!(out, "{ERROR_PREFIX}")?;
            for line in message.lines() {
                writeln!(out, "{ERROR_PREFIX}     {}", line.trim())?;
            }
            if colors {
                writeln!(out, "{ERROR_PREFIX}{RESET}")
            } else {
                writeln!(out, "{ERROR_PREFIX}")
            }
        });
    }

    fn finish(&self) {
        self.flush_deferred();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(renderer: ConsoleRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_topic_has_arrow_prefix() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.topic("hello there");
        assert_eq!(rendered(renderer), "-----> hello there\n");
    }

    #[test]
    fn test_detail_indents_every_line() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.detail("first\nsecond\n");
        assert_eq!(rendered(renderer), "       first\n       second\n");
    }

    #[test]
    fn test_warnings_are_deferred_until_finish() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.warn("watch out");
        renderer.topic("next step");
        renderer.finish();

        assert_eq!(
            rendered(renderer),
            "-----> next step\n## Warning\n\nwatch out\n"
        );
    }

    #[test]
    fn test_finish_twice_does_not_repeat_warnings() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.warn("once");
        renderer.finish();
        renderer.finish();

        assert_eq!(rendered(renderer).matches("## Warning").count(), 1);
    }

    #[test]
    fn test_fatal_block_without_colors() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.fatal("  download failed  \nstatus 404");

        assert_eq!(
            rendered(renderer),
            "\n !\n !     download failed\n !     status 404\n !\n"
        );
    }

    #[test]
    fn test_fatal_block_with_colors() {
        let renderer =
            ConsoleRenderer::with_config(Vec::new(), ConsoleRendererConfig { colors: true });
        renderer.fatal("nope");

        let output = rendered(renderer);
        assert!(output.starts_with("\x1b[1m\x1b[31m\n !\n"));
        assert!(output.ends_with(" !\x1b[0m\n"));
        assert!(output.contains(" !     nope\n"));
    }

    #[test]
    fn test_fatal_flushes_pending_warnings_first() {
        let renderer = ConsoleRenderer::new(Vec::new());
        renderer.warn("deferred");
        renderer.fatal("broken");

        let output = rendered(renderer);
        let warning_at = output.find("deferred").unwrap();
        let error_at = output.find("broken").unwrap();
        assert!(warning_at < error_at);
    }
}
