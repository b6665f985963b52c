use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::detection::ThresholdTable;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    #[serde(default)]
    pub thresholds: ThresholdTable,
}

/// JSON-backed settings. A missing file yields defaults; an unreadable or
/// invalid one falls back to defaults with a warning.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PipelineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<PipelineSettings>(&contents) {
                Ok(settings) if settings.thresholds.validate().is_ok() => settings,
                Ok(_) => {
                    warn!(
                        "Threshold table in {} is inconsistent; using defaults",
                        path.display()
                    );
                    PipelineSettings::default()
                }
                Err(err) => {
                    warn!("Ignoring malformed settings in {}: {err}", path.display());
                    PipelineSettings::default()
                }
            }
        } else {
            PipelineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn thresholds(&self) -> ThresholdTable {
        match self.data.read() {
            Ok(guard) => guard.thresholds,
            Err(poisoned) => poisoned.into_inner().thresholds,
        }
    }

    /// Validate, store and persist a new threshold table.
    pub fn update_thresholds(&self, thresholds: ThresholdTable) -> Result<()> {
        thresholds.validate()?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.thresholds = thresholds;
        self.persist(&guard)
    }

    fn persist(&self, data: &PipelineSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
