use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::path::PathBuf;

/// An RGB color triple, one byte per channel.
///
/// Serializes as a 3-element JSON array (`[r, g, b]`), which is the on-disk
/// shape of the `color` key in the items file. The `u8` channels make the
/// [0, 255] range unrepresentable to violate.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// One row of the action list.
///
/// Each action can probe the pixel at `coordinates`, gate its click on an
/// exact match against `color`, perform the click, and pause afterwards.
/// Keys missing from an items file on load fall back to the defaults below,
/// so older files stay loadable.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
pub struct Action {
    /// Absolute screen coordinates as `[x, y]`.
    pub coordinates: (i32, i32),

    /// Expected pixel color; `None` means "do not require a specific color".
    #[serde(default)]
    pub color: Option<Rgb>,

    /// When true and `color` is present, the click is gated on a live match.
    #[serde(default = "default_true")]
    pub judge_color: bool,

    /// Whether this action moves the pointer and clicks.
    #[serde(default)]
    pub click: bool,

    /// Whether this action pauses after its click step.
    #[serde(default)]
    pub delay: bool,

    /// Pause length in seconds; meaningful only when `delay` is true.
    #[serde(default)]
    #[validate(minimum = 0.0)]
    pub delay_time: f64,

    /// Free-form descriptive text.
    #[serde(default)]
    pub remarks: String,
}

impl Action {
    /// Build the action the "capture my coordinates" helper appends: a live
    /// probe result with color gating on and everything else off.
    #[must_use]
    pub fn captured(x: i32, y: i32, color: Rgb) -> Self {
        Self {
            coordinates: (x, y),
            color: Some(color),
            judge_color: true,
            click: false,
            delay: false,
            delay_time: 0.0,
            remarks: String::new(),
        }
    }
}

/// Parameters for a single run of the action list.
///
/// `loop` and `count` are mutually exclusive the way the original run dialog
/// was: when `loop` is set the run is unbounded and `count` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RunConfig {
    /// Run until stopped; `count` is ignored when set.
    #[serde(default, rename = "loop")]
    pub loop_forever: bool,

    /// Number of full passes over the list when not looping.
    #[serde(default = "default_count")]
    #[validate(minimum = 1)]
    pub count: u32,

    /// Seconds to wait after each full pass before the next one.
    #[serde(default = "default_interval")]
    #[validate(minimum = 0.0)]
    pub interval: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            loop_forever: false,
            count: default_count(),
            interval: default_interval(),
        }
    }
}

/// Persisted application settings: a single JSON object under the
/// user-config root.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Directory holding the items file.
    pub config_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_count() -> u32 {
    1
}

fn default_interval() -> f64 {
    1.0
}
