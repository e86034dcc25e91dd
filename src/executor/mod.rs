#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for Clickloop.

This module wires together:
- `engine`: the pass loop interpreting an action-list snapshot against a screen capability
- `controller`: run exclusivity, cancellation, and background-task lifecycle

Typical usage:
- Create a `RunController` over a `tokio` mpsc sender of `RunEvent`s.
- Call `RunController::start` with a screen, a list snapshot, and a `RunConfig`.
- Listen on the receiver for progress, non-fatal failures, and the terminal outcome.

Public re-exports:
- `Engine`, `RunEvent`, `RunOutcome`: the execution engine and its observer boundary.
- `RunController`, `ControlError`: single-run ownership and its rejection conditions.
*/

pub mod controller;
pub mod engine;

// Re-exports for convenient access from `clickloop::executor::*`
pub use controller::{ControlError, RunController};
pub use engine::{Engine, RunEvent, RunOutcome};
