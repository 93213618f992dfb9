//! User settings with serialization support

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{RepairError, Result};

/// Preset UI scales
pub const SCALE_PRESETS: &[(f32, &str)] = &[
    (0.8, "80%"),
    (1.0, "100%"),
    (1.25, "125%"),
    (1.5, "150%"),
];

const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 2.0;

/// Light or dark UI
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairSettings {
    pub ui_scale: f32,

    /// `None` follows the Windows app theme
    pub theme: Option<ThemeMode>,

    /// Overrides the script next to the executable
    pub script_path: Option<PathBuf>,

    /// Plain interpreter used instead of PowerShell, e.g. `pwsh`
    pub interpreter: Option<String>,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            theme: None,
            script_path: None,
            interpreter: None,
        }
    }
}

impl RepairSettings {
    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("winrep").join("settings.json"))
    }

    /// Load settings from the default location or return defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from a file; a missing or broken file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Self>(&contents) {
            Ok(mut settings) => {
                settings.ui_scale = settings.ui_scale.clamp(MIN_SCALE, MAX_SCALE);
                settings
            }
            Err(e) => {
                tracing::warn!("ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().ok_or(RepairError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        Ok(())
    }

    pub fn adjust_scale(&mut self, delta: f32) {
        self.ui_scale = (self.ui_scale + delta).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn current_scale_index(&self) -> Option<usize> {
        SCALE_PRESETS
            .iter()
            .position(|(scale, _)| (scale - self.ui_scale).abs() < 0.01)
    }

    pub fn set_scale_preset(&mut self, index: usize) {
        if let Some((scale, _)) = SCALE_PRESETS.get(index) {
            self.ui_scale = *scale;
        }
    }

    pub fn format_scale(&self) -> String {
        format!("{}%", (self.ui_scale * 100.0).round() as u32)
    }
}
