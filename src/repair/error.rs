//! Error type shared by the repair modules

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepairError>;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("{} was not found.\nPlace the file in the same directory as WinRep.", script_name(.0))]
    ScriptMissing(PathBuf),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog defines action `{0}` more than once")]
    DuplicateAction(&'static str),

    #[error("display order names unknown action `{0}`")]
    UnknownOrderKey(&'static str),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("restart could not be started: {0}")]
    Restart(#[source] std::io::Error),

    #[error("could not open {url}: {source}")]
    OpenUrl {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl RepairError {
    /// Short label for the status line
    pub fn short_label(&self) -> &'static str {
        match self {
            RepairError::ScriptMissing(_) => "script missing",
            RepairError::Spawn { .. } => "interpreter failed to start",
            _ => "error",
        }
    }
}

fn script_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
