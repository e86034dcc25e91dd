#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Clickloop — pixel-gated desktop click macros.
//!
//! The user maintains an ordered list of screen actions (probe a pixel color
//! at given coordinates, optionally gate on a color match, optionally click,
//! optionally delay) and replays the list once, N times, or forever. The
//! crate is organized into cohesive modules:
//! - `config`: Data models (actions, run configuration, settings) and the JSON store.
//! - `list`: The ordered action list and its structural operations.
//! - `screen`: The screen capability (pixel probe, pointer move/click).
//! - `executor`: The execution engine and the run controller.
//!
//! Use `clickloop::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models and the JSON store).
pub mod config;
/// Public module: execution engine and run controller.
pub mod executor;
/// Public module: ordered action list and its operations.
pub mod list;
/// Public module: screen capability (probe, move, click).
pub mod screen;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    use tracing::Level;
    use tracing_subscriber::fmt;

    // Parse RUST_LOG as a simple level (trace|debug|info|warn|error)
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        })
        .unwrap_or(Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt().with_max_level(level).try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use clickloop::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    // External crates (namespaced) if callers want direct access
    pub use crate as clickloop;
    pub use enigo;
    pub use tokio_util::sync::CancellationToken;

    // Frequently used internal items
    pub use crate::config::{Action, Rgb, RunConfig, Settings, Store};
    pub use crate::executor::{ControlError, Engine, RunController, RunEvent, RunOutcome};
    pub use crate::list::{ActionList, ListError};
    pub use crate::screen::{DesktopScreen, Screen};
    pub use crate::{config, executor, list, screen};
}
