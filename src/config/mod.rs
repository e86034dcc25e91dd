//! Configuration module for Clickloop.
//!
//! This module wires together the data models and the file-backed store used
//! throughout the crate. Import from here for a convenient, stable API.
//!
//! Example:
//! use clickloop::config::Store;
//!
//! let store = Store::open()?;
//! let list = store.load_actions()?;

pub mod models;
pub mod store;

// Re-export core data models
pub use models::{Action, Rgb, RunConfig, Settings};

// Re-export the store
pub use store::{ITEMS_FILE, SETTINGS_FILE, Store};
