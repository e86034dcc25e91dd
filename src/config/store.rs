//! JSON persistence for settings and the action list.
//!
//! Layout mirrors the classic two-file scheme:
//! - `settings.json` lives at a fixed path under the user-config root and
//!   holds the single `config_dir` setting.
//! - `items.json` lives under `config_dir` (which defaults to the root) and
//!   holds the action list as a pretty-printed JSON array.
//!
//! All failures here are recoverable: callers log them and keep working with
//! the in-memory list. A failed save leaves the file unchanged; a failed load
//! leaves the caller with the prior (or empty) list.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::list::ActionList;

use super::models::Settings;

/// Fixed file name of the settings record under the store root.
pub const SETTINGS_FILE: &str = "settings.json";
/// File name of the items record under the configured directory.
pub const ITEMS_FILE: &str = "items.json";

/// File-backed store for settings and the action list.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    config_dir: PathBuf,
}

impl Store {
    /// Open the store under the platform user-config root
    /// (e.g., `~/.config/clickloop` on Linux).
    pub fn open() -> Result<Self> {
        let root = dirs::config_dir()
            .context("No user config directory available on this platform")?
            .join(crate::PKG_NAME);
        Self::with_root(root)
    }

    /// Open the store under an explicit root. Loads `settings.json` if
    /// present; otherwise writes default settings pointing `config_dir` at
    /// the root itself.
    pub fn with_root(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store root {}", root.display()))?;

        let settings_path = root.join(SETTINGS_FILE);
        let config_dir = if settings_path.exists() {
            match Self::read_settings(&settings_path) {
                Ok(settings) => settings.config_dir,
                Err(err) => {
                    warn!(
                        target: "clickloop::store",
                        error = %err, path = %settings_path.display(),
                        "Failed to load settings; falling back to the store root"
                    );
                    root.clone()
                }
            }
        } else {
            root.clone()
        };

        let store = Self { root, config_dir };
        store.ensure_config_dir()?;
        if !settings_path.exists() {
            store.save_settings()?;
        }
        debug!(
            target: "clickloop::store",
            root = %store.root.display(), config_dir = %store.config_dir.display(),
            "Store opened"
        );
        Ok(store)
    }

    /// Root directory holding `settings.json`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `items.json`.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the items file.
    #[must_use]
    pub fn items_path(&self) -> PathBuf {
        self.config_dir.join(ITEMS_FILE)
    }

    /// Point the store at a new items directory and persist the choice.
    pub fn set_config_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.config_dir = dir;
        self.ensure_config_dir()?;
        self.save_settings()?;
        debug!(
            target: "clickloop::store",
            config_dir = %self.config_dir.display(),
            "Config directory updated"
        );
        Ok(())
    }

    /// Write the settings record to its fixed path under the root.
    pub fn save_settings(&self) -> Result<()> {
        let settings = Settings {
            config_dir: self.config_dir.clone(),
        };
        let json =
            serde_json::to_string_pretty(&settings).context("Failed to serialize settings")?;
        let path = self.root.join(SETTINGS_FILE);
        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Load the action list from `items.json`.
    ///
    /// A missing file yields an empty list (first start). Read or parse
    /// failures are errors the caller reports and survives.
    pub fn load_actions(&self) -> Result<ActionList> {
        let path = self.items_path();
        if !path.exists() {
            debug!(
                target: "clickloop::store",
                path = %path.display(),
                "No items file yet; starting with an empty list"
            );
            return Ok(ActionList::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read items file {}", path.display()))?;
        let list: ActionList = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse items file {}", path.display()))?;
        debug!(
            target: "clickloop::store",
            path = %path.display(), rows = list.len(),
            "Loaded action list"
        );
        Ok(list)
    }

    /// Save the action list to `items.json` (pretty-printed).
    pub fn save_actions(&self, list: &ActionList) -> Result<()> {
        self.ensure_config_dir()?;
        let json = serde_json::to_string_pretty(list).context("Failed to serialize action list")?;
        let path = self.items_path();
        fs::write(&path, json)
            .with_context(|| format!("Failed to write items file {}", path.display()))?;
        debug!(
            target: "clickloop::store",
            path = %path.display(), rows = list.len(),
            "Saved action list"
        );
        Ok(())
    }

    fn ensure_config_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "Failed to create config directory {}",
                self.config_dir.display()
            )
        })
    }

    fn read_settings(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}
