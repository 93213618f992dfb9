//! Repair toolbox core: catalog, list view state, system probe, runner
//!
//! Everything here is independent of the window toolkit; `main.rs` draws the
//! `AppState` and feeds user input back into it.

pub mod catalog;
pub mod codepage;
pub mod controller;
pub mod error;
pub mod host;
pub mod list_view;
pub mod log;
pub mod probe;
pub mod runner;
pub mod settings;

use std::sync::Arc;

pub use catalog::CATALOG;
pub use controller::AppState;
pub use settings::{RepairSettings, ThemeMode};

/// Wakes the UI thread after a worker posted a message
pub type Repaint = Arc<dyn Fn() + Send + Sync>;
