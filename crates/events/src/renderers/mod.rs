//! Renderers for reporter events.

pub mod console;
pub mod json;

pub use console::{ConsoleRenderer, ConsoleRendererConfig};
pub use json::JsonRenderer;
