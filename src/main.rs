use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use clickloop::config::{Action, Rgb, RunConfig, Store};
use clickloop::executor::{RunController, RunEvent};
use clickloop::list::{ActionList, ListError};
use clickloop::screen::{DesktopScreen, Screen};

/// Clickloop CLI
#[derive(Debug, Parser)]
#[command(
    name = clickloop::PKG_NAME,
    version = clickloop::PKG_VERSION,
    about = "Pixel-gated desktop click macros: build an action list and replay it"
)]
struct Args {
    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay the action list once, N times, or forever (Ctrl+C stops).
    Run {
        /// Loop until stopped; --count is ignored.
        #[arg(long = "loop")]
        loop_forever: bool,

        /// Number of full passes over the list.
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Seconds to wait between passes.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,

        /// Log clicks instead of injecting input (probing stays real).
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Wait a few seconds, then append the cursor position and pixel color
    /// as a new row.
    Capture {
        /// Seconds to wait before sampling the cursor.
        #[arg(long, default_value_t = 5)]
        wait: u64,
    },

    /// Print the action list.
    Show,

    /// Append a row to the action list.
    Add {
        #[arg(short, allow_hyphen_values = true)]
        x: i32,
        #[arg(short, allow_hyphen_values = true)]
        y: i32,

        /// Expected pixel color as r,g,b (omit to not require a color).
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb>,

        /// Do not gate the click on a color match.
        #[arg(long = "no-judge")]
        no_judge: bool,

        /// Perform a pointer move and click on this row.
        #[arg(long)]
        click: bool,

        /// Pause this many seconds after the click step.
        #[arg(long)]
        delay: Option<f64>,

        /// Free-form note for this row.
        #[arg(long, default_value = "")]
        remarks: String,
    },

    /// Edit one row in place; only the given fields change.
    Edit {
        /// Row index (0-based, as printed by `show`).
        row: usize,

        #[arg(short, allow_hyphen_values = true)]
        x: Option<i32>,
        #[arg(short, allow_hyphen_values = true)]
        y: Option<i32>,

        /// New expected pixel color as r,g,b.
        #[arg(long, value_parser = parse_rgb, conflicts_with = "clear_color")]
        color: Option<Rgb>,

        /// Remove the expected color from the row.
        #[arg(long = "clear-color")]
        clear_color: bool,

        /// Whether the click is gated on a color match.
        #[arg(long)]
        judge: Option<bool>,

        /// Whether this row performs a pointer move and click.
        #[arg(long)]
        click: Option<bool>,

        /// New post-click pause in seconds.
        #[arg(long, conflicts_with = "no_delay")]
        delay: Option<f64>,

        /// Remove the pause from the row.
        #[arg(long = "no-delay")]
        no_delay: bool,

        /// New free-form note for this row.
        #[arg(long)]
        remarks: Option<String>,
    },

    /// Delete the selected rows (0-based, as printed by `show`).
    Delete {
        #[arg(long, value_delimiter = ',', required = true)]
        rows: Vec<usize>,
    },

    /// Append copies of the selected rows at the end of the list.
    Duplicate {
        #[arg(long, value_delimiter = ',', required = true)]
        rows: Vec<usize>,
    },

    /// Move the selected rows up by one.
    MoveUp {
        #[arg(long, value_delimiter = ',', required = true)]
        rows: Vec<usize>,
    },

    /// Move the selected rows down by one.
    MoveDown {
        #[arg(long, value_delimiter = ',', required = true)]
        rows: Vec<usize>,
    },

    /// Set the directory holding the items file.
    SetDir { dir: PathBuf },

    /// Print the JSON Schema for the items file and exit.
    Schema,
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err("expected three comma-separated channels, e.g. 10,20,30".into());
    }
    let channel = |p: &str| {
        p.parse::<u8>()
            .map_err(|_| format!("channel '{p}' is not an integer in 0..=255"))
    };
    Ok(Rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Honor --log-level by initializing tracing directly at that level.
    if let Some(level) = &args.log_level {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        };
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    } else {
        clickloop::init_tracing();
    }

    if let Command::Schema = args.command {
        let schema = schemars::schema_for!(ActionList);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let mut store = Store::open()?;
    let mut list = store.load_actions().unwrap_or_else(|err| {
        warn!(error = %err, "Failed to load the action list; starting empty");
        ActionList::new()
    });

    match args.command {
        Command::Run {
            loop_forever,
            count,
            interval,
            dry_run,
        } => {
            let config = RunConfig {
                loop_forever,
                count,
                interval,
            };
            run(&list, config, dry_run).await?;
        }

        Command::Capture { wait } => {
            info!(wait, "Move the cursor to the target position...");
            tokio::time::sleep(Duration::from_secs(wait)).await;

            let mut screen = DesktopScreen::new(false);
            let (x, y) = screen.cursor_position()?;
            let color = screen.probe_color(x, y)?;

            list.append(Action::captured(x, y, color));
            store.save_actions(&list)?;
            info!(x, y, %color, "Captured coordinates and color as a new row");
        }

        Command::Show => {
            if list.is_empty() {
                println!("(empty action list at {})", store.items_path().display());
            }
            for (index, action) in list.actions().iter().enumerate() {
                let color = action
                    .color
                    .map_or_else(String::new, |c| c.to_string());
                println!(
                    "#{index} ({}, {})  color={color}  judge={}  click={}  delay={}  remarks={}",
                    action.coordinates.0,
                    action.coordinates.1,
                    action.judge_color,
                    action.click,
                    if action.delay {
                        format!("{}s", action.delay_time)
                    } else {
                        "-".into()
                    },
                    action.remarks,
                );
            }
        }

        Command::Add {
            x,
            y,
            color,
            no_judge,
            click,
            delay,
            remarks,
        } => {
            list.append(Action {
                coordinates: (x, y),
                color,
                judge_color: !no_judge,
                click,
                delay: delay.is_some(),
                delay_time: delay.unwrap_or(0.0).max(0.0),
                remarks,
            });
            store.save_actions(&list)?;
            info!(rows = list.len(), "Row added");
        }

        Command::Edit {
            row,
            x,
            y,
            color,
            clear_color,
            judge,
            click,
            delay,
            no_delay,
            remarks,
        } => {
            let mut action = list.get(row).cloned().ok_or(ListError::OutOfRange {
                index: row,
                len: list.len(),
            })?;

            if let Some(x) = x {
                action.coordinates.0 = x;
            }
            if let Some(y) = y {
                action.coordinates.1 = y;
            }
            if clear_color {
                action.color = None;
            } else if let Some(color) = color {
                action.color = Some(color);
            }
            if let Some(judge) = judge {
                action.judge_color = judge;
            }
            if let Some(click) = click {
                action.click = click;
            }
            if no_delay {
                action.delay = false;
                action.delay_time = 0.0;
            } else if let Some(delay) = delay {
                action.delay = true;
                action.delay_time = delay.max(0.0);
            }
            if let Some(remarks) = remarks {
                action.remarks = remarks;
            }

            list.replace(row, action)?;
            store.save_actions(&list)?;
            info!(row, "Row edited");
        }

        Command::Delete { rows } => {
            list.delete(&rows)?;
            store.save_actions(&list)?;
            info!(rows = list.len(), "Rows deleted");
        }

        Command::Duplicate { rows } => {
            list.duplicate(&rows)?;
            store.save_actions(&list)?;
            info!(rows = list.len(), "Rows duplicated to the end of the list");
        }

        Command::MoveUp { rows } => {
            list.move_up(&rows)?;
            store.save_actions(&list)?;
            info!("Rows moved up");
        }

        Command::MoveDown { rows } => {
            list.move_down(&rows)?;
            store.save_actions(&list)?;
            info!("Rows moved down");
        }

        Command::SetDir { dir } => {
            store.set_config_dir(dir)?;
            list = store.load_actions().unwrap_or_else(|err| {
                warn!(error = %err, "Failed to load the action list from the new directory");
                ActionList::new()
            });
            info!(
                config_dir = %store.config_dir().display(),
                rows = list.len(),
                "Config directory updated"
            );
        }

        Command::Schema => unreachable!("handled before the store is opened"),
    }

    Ok(())
}

/// Drive a run to completion: start the engine, relay its events to the log,
/// and translate Ctrl+C into a stop request.
async fn run(list: &ActionList, config: RunConfig, dry_run: bool) -> anyhow::Result<()> {
    if list.is_empty() {
        warn!("The action list is empty; the run will finish immediately");
    }

    let (tx, mut rx) = mpsc::channel::<RunEvent>(64);
    let mut controller = RunController::new(tx);
    controller.start(DesktopScreen::new(dry_run), list.snapshot(), config)?;
    let done = controller.finished_signal();

    // Events are advisory progress reporting; the run's end is observed
    // through the finished signal, not the channel.
    let relay = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::PassStarted { pass } => info!(pass, "Pass started"),
                RunEvent::ColorMismatch {
                    index,
                    expected,
                    actual,
                } => {
                    info!(index, %expected, %actual, "Color mismatch; click skipped");
                }
                RunEvent::ActionFailed { index, error } => {
                    error!(index, %error, "Action failed; continuing with the next one");
                }
                RunEvent::Finished(outcome) => {
                    tracing::debug!(?outcome, "Run reported its outcome");
                }
            }
        }
    });

    tokio::select! {
        () = done.cancelled() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping the run");
            if let Err(err) = controller.stop() {
                warn!(error = %err, "Stop request had no run to act on");
            }
        }
    }

    if let Some(outcome) = controller.wait().await {
        info!(?outcome, "Run finished");
    }
    drop(controller);
    let _ = relay.await;
    Ok(())
}
