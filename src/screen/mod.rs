//! Screen capability: pixel probing and pointer move/click.
//!
//! The engine talks to the screen through the [`Screen`] trait so runs can be
//! tested against scripted doubles. The real implementation,
//! [`DesktopScreen`], reads pixels through `xcap` monitor captures and
//! injects pointer input through `enigo`.
//!
//! Behavior notes:
//! - Probing captures the monitor containing the requested point and reads
//!   one pixel; coordinates outside every monitor are an error.
//! - Clicking glides the pointer to the target over a short fixed duration
//!   before issuing a single left click. The glide is intentionally not
//!   interruptible; cancellation is observed between capability calls.
//! - In dry-run mode clicks are logged instead of injected. Probing stays
//!   real, since reading a pixel has no side effects.

use anyhow::{Context, Result, bail};
use enigo::Mouse as _;
use enigo::{Button, Coordinate, Direction, Enigo, Settings};
use std::thread;
use std::time::Duration;
use tracing::{info, trace};
use xcap::Monitor;

use crate::config::Rgb;

/// Total time of the pointer glide before a click.
const MOVE_DURATION: Duration = Duration::from_millis(500);
/// Number of interpolation steps in the glide.
const MOVE_STEPS: u32 = 25;

/// Synchronous screen capability consumed by the execution engine.
pub trait Screen: Send {
    /// Read the on-screen pixel color at the given absolute coordinates.
    fn probe_color(&mut self, x: i32, y: i32) -> Result<Rgb>;

    /// Move the pointer to the coordinates and perform a single click.
    fn click_at(&mut self, x: i32, y: i32) -> Result<()>;
}

/// Real screen backed by `xcap` (capture) and `enigo` (input).
pub struct DesktopScreen {
    dry_run: bool,
    enigo: Option<Enigo>,
}

impl DesktopScreen {
    /// Create a new screen.
    /// - dry_run: when true, clicks are only logged and no input is injected.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            enigo: None,
        }
    }

    /// Returns whether the screen is currently in dry-run mode.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Current pointer position, used by the capture helper.
    pub fn cursor_position(&mut self) -> Result<(i32, i32)> {
        let enigo = self.ensure_enigo()?;
        let pos = enigo
            .location()
            .context("Failed to read the pointer position")?;
        Ok(pos)
    }

    fn ensure_enigo(&mut self) -> Result<&mut Enigo> {
        if self.enigo.is_none() {
            trace!(target: "clickloop::screen", "Initializing Enigo");
            self.enigo =
                Some(Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?);
        }
        Ok(self.enigo.as_mut().expect("Enigo must be initialized"))
    }

    fn glide_to(enigo: &mut Enigo, x: i32, y: i32) -> Result<()> {
        let (sx, sy) = enigo
            .location()
            .context("Failed to read the pointer position")?;
        let step_pause = MOVE_DURATION / MOVE_STEPS;
        for step in 1..=MOVE_STEPS {
            let t = f64::from(step) / f64::from(MOVE_STEPS);
            let ix = sx + ((f64::from(x - sx)) * t).round() as i32;
            let iy = sy + ((f64::from(y - sy)) * t).round() as i32;
            enigo
                .move_mouse(ix, iy, Coordinate::Abs)
                .context("Failed to move the pointer")?;
            thread::sleep(step_pause);
        }
        Ok(())
    }
}

impl Screen for DesktopScreen {
    fn probe_color(&mut self, x: i32, y: i32) -> Result<Rgb> {
        trace!(target: "clickloop::screen", x, y, "probe_color");
        let monitors = Monitor::all().context("Failed to enumerate monitors")?;
        let monitor = monitors
            .iter()
            .find(|m| {
                let (mx, my) = (m.x(), m.y());
                x >= mx
                    && y >= my
                    && x < mx + m.width() as i32
                    && y < my + m.height() as i32
            })
            .ok_or_else(|| anyhow::anyhow!("Coordinates ({x}, {y}) are outside every monitor"))?;

        let image = monitor
            .capture_image()
            .context("Failed to capture the monitor")?;
        if monitor.width() == 0 || monitor.height() == 0 {
            bail!("Monitor reports a zero-sized surface");
        }

        // Map monitor coordinates to capture pixels; the factors differ on
        // scaled (HiDPI) displays.
        let rx = ((x - monitor.x()) as u32)
            .saturating_mul(image.width())
            .checked_div(monitor.width())
            .unwrap_or(0)
            .min(image.width().saturating_sub(1));
        let ry = ((y - monitor.y()) as u32)
            .saturating_mul(image.height())
            .checked_div(monitor.height())
            .unwrap_or(0)
            .min(image.height().saturating_sub(1));

        let pixel = image.get_pixel(rx, ry);
        Ok(Rgb(pixel.0[0], pixel.0[1], pixel.0[2]))
    }

    fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
        if self.dry_run {
            info!(target: "clickloop::screen", x, y, "DRY-RUN click_at");
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        trace!(target: "clickloop::screen", x, y, "click_at");
        Self::glide_to(enigo, x, y)?;
        enigo
            .button(Button::Left, Direction::Click)
            .context("Failed to click")?;
        Ok(())
    }
}
