use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::history::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preferences file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup configuration. Loaded once and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Seconds between two samples; one of 1, 2, 5.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Points kept per rolling chart.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Maximum number of rows rendered by the process table.
    #[serde(default = "default_process_row_limit")]
    pub process_row_limit: usize,
    /// CPU usage (%) above which the dashboard reports "Moderate".
    #[serde(default = "default_cpu_moderate_threshold")]
    pub cpu_moderate_threshold: f32,
    /// CPU usage (%) above which the dashboard reports "High".
    #[serde(default = "default_cpu_high_threshold")]
    pub cpu_high_threshold: f32,
}

fn default_refresh_interval() -> u64 { 2 }
fn default_history_capacity() -> usize { DEFAULT_HISTORY_CAPACITY }
fn default_process_row_limit() -> usize { 500 }
fn default_cpu_moderate_threshold() -> f32 { 50.0 }
fn default_cpu_high_threshold() -> f32 { 80.0 }

pub const REFRESH_OPTIONS: &[u64] = &[1, 2, 5];
const MAX_PROCESS_ROW_LIMIT: usize = 5000;

impl Default for Preferences {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            history_capacity: default_history_capacity(),
            process_row_limit: default_process_row_limit(),
            cpu_moderate_threshold: default_cpu_moderate_threshold(),
            cpu_high_threshold: default_cpu_high_threshold(),
        }
    }
}

impl Preferences {
    /// Windows → AppData/Local/nexmon/preferences.json
    /// Linux → ~/.config/nexmon/preferences.json
    pub fn config_path() -> PathBuf {
        dirs::config_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nexmon")
            .join("preferences.json")
    }

    /// Load from the default location. A missing file gives the defaults
    /// silently; any other problem is logged and also gives the defaults.
    pub fn load() -> Self {
        match Self::load_from(&Self::config_path()) {
            Ok(prefs) => prefs,
            Err(PreferencesError::Io { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "using default preferences");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, PreferencesError> {
        let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut prefs: Self =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        prefs.sanitize();
        Ok(prefs)
    }

    /// Clamp all numeric fields to valid ranges.
    fn sanitize(&mut self) {
        if !REFRESH_OPTIONS.contains(&self.refresh_interval_secs) {
            self.refresh_interval_secs = default_refresh_interval();
        }
        self.history_capacity = self.history_capacity.clamp(10, 600);
        self.process_row_limit = self.process_row_limit.clamp(10, MAX_PROCESS_ROW_LIMIT);

        let clamp_pct = |v: f32, fallback: f32| {
            if v.is_finite() {
                v.clamp(1.0, 100.0)
            } else {
                fallback
            }
        };
        self.cpu_moderate_threshold =
            clamp_pct(self.cpu_moderate_threshold, default_cpu_moderate_threshold());
        self.cpu_high_threshold = clamp_pct(self.cpu_high_threshold, default_cpu_high_threshold());
        if self.cpu_moderate_threshold >= self.cpu_high_threshold {
            self.cpu_moderate_threshold = default_cpu_moderate_threshold();
            self.cpu_high_threshold = default_cpu_high_threshold();
        }
    }
}
