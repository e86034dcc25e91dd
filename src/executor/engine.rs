//! The action-list execution engine.
//!
//! A run interprets an immutable snapshot of the action list under a
//! [`RunConfig`], driving the injected [`Screen`] capability. Per action the
//! sequence is: probe (when color-gated), click, delay. Passes repeat until
//! the configured count elapses or forever when looping.
//!
//! Failure policy:
//! - Probe and click failures are per-action, non-fatal: they are reported
//!   through the event channel, the rest of that action is skipped, and the
//!   run continues with the next one.
//! - A color mismatch skips only the click; the action's delay still runs.
//! - Only a malformed config is a hard failure, and the controller rejects
//!   that before the run ever starts.
//!
//! Cancellation is cooperative: the token is sampled before every action and
//! both sleeps (per-action delay and inter-pass interval) race against it,
//! so a stop request is observed within roughly 100ms plus any in-flight
//! capability call, never after a full multi-second delay.
//!
//! Events are delivered best-effort: when the observer's channel is full the
//! notification is dropped rather than awaited, so a slow or absent listener
//! can never stall the run or delay a stop request. The authoritative
//! terminal outcome is the `run` return value, which the controller exposes
//! through `wait` and its finished signal.

use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{Action, Rgb, RunConfig};
use crate::screen::Screen;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The configured number of passes elapsed without cancellation.
    Completed { passes: u64 },
    /// The run stopped in response to a cancellation request.
    Stopped,
}

/// Progress and failure notifications produced while a run is active.
///
/// `ActionFailed` events are non-fatal by design; listeners surface them and
/// the run keeps going.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A new pass over the snapshot is starting (0-based).
    PassStarted { pass: u64 },
    /// A color-gated action saw a pixel that did not match; its click was
    /// skipped.
    ColorMismatch {
        index: usize,
        expected: Rgb,
        actual: Rgb,
    },
    /// A probe or click failed; the rest of the action was skipped.
    ActionFailed { index: usize, error: String },
    /// The run reached a terminal outcome.
    Finished(RunOutcome),
}

/// Interprets an action-list snapshot against a screen capability.
pub struct Engine<S> {
    screen: S,
    events: Sender<RunEvent>,
}

impl<S: Screen> Engine<S> {
    pub fn new(screen: S, events: Sender<RunEvent>) -> Self {
        Self { screen, events }
    }

    /// Execute the run to its terminal outcome.
    ///
    /// The caller validates `config` beforehand; the snapshot's per-action
    /// invariants (channel ranges, non-negative delays) hold by construction.
    pub async fn run(
        mut self,
        snapshot: Vec<Action>,
        config: RunConfig,
        cancel: CancellationToken,
    ) -> RunOutcome {
        info!(
            target: "clickloop::engine",
            actions = snapshot.len(),
            loop_forever = config.loop_forever,
            count = config.count,
            interval = config.interval,
            "Run starting"
        );

        let mut passes: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return self.stopped(passes);
            }
            self.emit(RunEvent::PassStarted { pass: passes });

            for (index, action) in snapshot.iter().enumerate() {
                if cancel.is_cancelled() {
                    return self.stopped(passes);
                }
                if !self.execute_action(index, action, &cancel).await {
                    return self.stopped(passes);
                }
            }

            passes += 1;
            if !config.loop_forever && passes >= u64::from(config.count) {
                info!(target: "clickloop::engine", passes, "Run completed");
                let outcome = RunOutcome::Completed { passes };
                self.emit(RunEvent::Finished(outcome));
                return outcome;
            }

            // Another pass will occur; the inter-pass wait is cancellable.
            if !cancellable_sleep(&cancel, Duration::from_secs_f64(config.interval)).await {
                return self.stopped(passes);
            }
        }
    }

    /// Run one action. Returns false only when cancellation was observed
    /// during the delay step.
    async fn execute_action(
        &mut self,
        index: usize,
        action: &Action,
        cancel: &CancellationToken,
    ) -> bool {
        let (x, y) = action.coordinates;

        if action.click {
            let mut perform_click = true;

            if action.judge_color {
                if let Some(expected) = action.color {
                    match self.screen.probe_color(x, y) {
                        Ok(actual) if actual != expected => {
                            trace!(
                                target: "clickloop::engine",
                                index, %expected, %actual,
                                "Color mismatch; skipping click"
                            );
                            self.emit(RunEvent::ColorMismatch {
                                index,
                                expected,
                                actual,
                            });
                            perform_click = false;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(
                                target: "clickloop::engine",
                                index, error = %err,
                                "Pixel probe failed; skipping this action"
                            );
                            self.emit(RunEvent::ActionFailed {
                                index,
                                error: format!("pixel probe failed: {err:#}"),
                            });
                            return true;
                        }
                    }
                }
            }

            if perform_click {
                if let Err(err) = self.screen.click_at(x, y) {
                    warn!(
                        target: "clickloop::engine",
                        index, error = %err,
                        "Click failed; skipping this action"
                    );
                    self.emit(RunEvent::ActionFailed {
                        index,
                        error: format!("click failed: {err:#}"),
                    });
                    return true;
                }
            }
        }

        if action.delay && action.delay_time > 0.0 {
            trace!(
                target: "clickloop::engine",
                index, seconds = action.delay_time,
                "Delay step"
            );
            if !cancellable_sleep(cancel, Duration::from_secs_f64(action.delay_time)).await {
                return false;
            }
        }

        true
    }

    fn stopped(&self, passes: u64) -> RunOutcome {
        debug!(target: "clickloop::engine", passes, "Run stopped by request");
        self.emit(RunEvent::Finished(RunOutcome::Stopped));
        RunOutcome::Stopped
    }

    /// Best-effort event delivery. A full channel or a dropped listener
    /// drops the notification; it must never stall the run.
    fn emit(&self, event: RunEvent) {
        if let Err(err) = self.events.try_send(event) {
            trace!(target: "clickloop::engine", error = %err, "Dropping run event");
        }
    }
}

/// Sleep that races against cancellation. Returns true when the full
/// duration elapsed, false when the token fired first.
async fn cancellable_sleep(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = sleep(duration) => true,
    }
}
