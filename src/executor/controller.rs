//! The run controller: at most one concurrent run.
//!
//! The controller owns the cancellation token and the engine's task handle.
//! It is the single writer of that state: `start` installs a fresh token and
//! handle, `stop` only signals the token, and "is a run active" is derived
//! from the task handle (which only the engine task finishes). That keeps
//! the start-accepted-twice race structurally impossible without extra
//! locking.
//!
//! No `Stopping` state is exposed. Cancellation is a request: `stop` returns
//! immediately and the terminal outcome arrives through `wait` (with the
//! finished signal as a select-friendly edge) once the engine actually
//! exits.

use serde_valid::Validate;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Action, RunConfig};
use crate::screen::Screen;

use super::engine::{Engine, RunEvent, RunOutcome};

/// Synchronous rejections from the controller. None of these change any
/// state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// `start` was called while a run is active.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// `stop` was called with no active run.
    #[error("no run is active")]
    NotRunning,

    /// The run configuration failed validation; nothing was launched.
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),
}

/// Starts and stops the single allowed background run.
pub struct RunController {
    events: Sender<RunEvent>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<RunOutcome>>,
    done: CancellationToken,
}

impl RunController {
    /// Create a controller that reports run events on the given channel.
    #[must_use]
    pub fn new(events: Sender<RunEvent>) -> Self {
        // Starts idle, so the finished signal begins in the fired state.
        let done = CancellationToken::new();
        done.cancel();
        Self {
            events,
            cancel: None,
            handle: None,
            done,
        }
    }

    /// Whether a run is currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Token that fires when the current run reaches its terminal outcome.
    ///
    /// Unlike the event channel, which is best-effort, this signal is
    /// guaranteed. While no run is active it is already fired. The outcome
    /// itself comes from [`RunController::wait`].
    #[must_use]
    pub fn finished_signal(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Launch the engine on a background task over the given snapshot.
    ///
    /// Rejects when a run is active or when `config` fails validation; both
    /// rejections happen before any side effect. On success a fresh
    /// cancellation token replaces the previous run's token and the call
    /// returns immediately.
    pub fn start<S>(
        &mut self,
        screen: S,
        snapshot: Vec<Action>,
        config: RunConfig,
    ) -> Result<(), ControlError>
    where
        S: Screen + 'static,
    {
        if self.is_running() {
            return Err(ControlError::AlreadyRunning);
        }
        config
            .validate()
            .map_err(|err| ControlError::InvalidConfig(err.to_string()))?;

        let cancel = CancellationToken::new();
        let engine = Engine::new(screen, self.events.clone());
        let token = cancel.clone();
        self.done = CancellationToken::new();
        let done = self.done.clone();
        let handle = tokio::spawn(async move {
            let outcome = engine.run(snapshot, config, token).await;
            done.cancel();
            outcome
        });

        self.cancel = Some(cancel);
        self.handle = Some(handle);
        info!(target: "clickloop::controller", "Run started");
        Ok(())
    }

    /// Request cooperative cancellation of the active run.
    ///
    /// Returns immediately; it does not wait for the engine to exit.
    /// Signaling twice is harmless. With no active run this is the
    /// informational `NotRunning` condition.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        if !self.is_running() {
            return Err(ControlError::NotRunning);
        }
        if let Some(cancel) = &self.cancel {
            debug!(target: "clickloop::controller", "Stop requested");
            cancel.cancel();
        }
        Ok(())
    }

    /// Wait for the current run to finish and return its outcome, putting
    /// the controller back to idle. Returns `None` when no run was launched.
    pub async fn wait(&mut self) -> Option<RunOutcome> {
        let handle = self.handle.take()?;
        self.cancel = None;
        let outcome = handle.await.ok()?;
        info!(target: "clickloop::controller", ?outcome, "Run finished");
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rgb;
    use anyhow::Result;
    use tokio::sync::mpsc;

    /// Screen double that pretends every probe matches and every click works.
    struct NullScreen;

    impl Screen for NullScreen {
        fn probe_color(&mut self, _x: i32, _y: i32) -> Result<Rgb> {
            Ok(Rgb(0, 0, 0))
        }

        fn click_at(&mut self, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }
    }

    fn long_snapshot() -> Vec<Action> {
        vec![Action {
            coordinates: (0, 0),
            color: None,
            judge_color: false,
            click: false,
            delay: true,
            delay_time: 10.0,
            remarks: String::new(),
        }]
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        controller
            .start(NullScreen, long_snapshot(), RunConfig::default())
            .unwrap();
        let err = controller
            .start(NullScreen, long_snapshot(), RunConfig::default())
            .unwrap_err();
        assert_eq!(err, ControlError::AlreadyRunning);

        controller.stop().unwrap();
        assert_eq!(controller.wait().await, Some(RunOutcome::Stopped));
    }

    #[tokio::test]
    async fn test_start_is_accepted_again_after_completion() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        controller
            .start(NullScreen, Vec::new(), RunConfig::default())
            .unwrap();
        assert_eq!(controller.wait().await, Some(RunOutcome::Completed { passes: 1 }));

        // Idle again: a second run may start.
        controller
            .start(NullScreen, Vec::new(), RunConfig::default())
            .unwrap();
        assert_eq!(controller.wait().await, Some(RunOutcome::Completed { passes: 1 }));
    }

    #[tokio::test]
    async fn test_stop_with_no_run_is_the_informational_condition() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);
        assert_eq!(controller.stop().unwrap_err(), ControlError::NotRunning);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_while_running() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        controller
            .start(NullScreen, long_snapshot(), RunConfig::default())
            .unwrap();
        controller.stop().unwrap();
        // A second signal while the engine is still winding down is fine.
        let _ = controller.stop();
        assert_eq!(controller.wait().await, Some(RunOutcome::Stopped));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_launch() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        let bad = RunConfig {
            loop_forever: false,
            count: 0,
            interval: 1.0,
        };
        let err = controller
            .start(NullScreen, long_snapshot(), bad)
            .unwrap_err();
        assert!(matches!(err, ControlError::InvalidConfig(_)));
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_start_accepts_send_only_screens() {
        // Screen implementations need only be Send; the enigo-backed one is
        // not Sync, so the spawned run must not demand it.
        struct CellScreen {
            clicks: std::cell::Cell<u32>,
        }

        impl Screen for CellScreen {
            fn probe_color(&mut self, _x: i32, _y: i32) -> Result<Rgb> {
                Ok(Rgb(0, 0, 0))
            }

            fn click_at(&mut self, _x: i32, _y: i32) -> Result<()> {
                self.clicks.set(self.clicks.get() + 1);
                Ok(())
            }
        }

        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);
        let screen = CellScreen {
            clicks: std::cell::Cell::new(0),
        };

        let snapshot = vec![Action {
            coordinates: (1, 2),
            color: None,
            judge_color: false,
            click: true,
            delay: false,
            delay_time: 0.0,
            remarks: String::new(),
        }];
        controller
            .start(screen, snapshot, RunConfig::default())
            .unwrap();
        assert_eq!(controller.wait().await, Some(RunOutcome::Completed { passes: 1 }));
    }

    #[tokio::test]
    async fn test_finished_signal_fires_on_completion() {
        let (tx, _rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        // Idle controllers report an already-fired signal.
        assert!(controller.finished_signal().is_cancelled());

        controller
            .start(NullScreen, Vec::new(), RunConfig::default())
            .unwrap();
        let done = controller.finished_signal();
        tokio::time::timeout(std::time::Duration::from_secs(1), done.cancelled())
            .await
            .unwrap();
        assert_eq!(controller.wait().await, Some(RunOutcome::Completed { passes: 1 }));
    }

    #[tokio::test]
    async fn test_finished_event_reaches_the_observer() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut controller = RunController::new(tx);

        controller
            .start(NullScreen, Vec::new(), RunConfig::default())
            .unwrap();
        controller.wait().await.unwrap();

        let mut finished = None;
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::Finished(outcome) = event {
                finished = Some(outcome);
            }
        }
        assert_eq!(finished, Some(RunOutcome::Completed { passes: 1 }));
    }
}
