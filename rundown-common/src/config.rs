//! Engine configuration loading
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `RUNDOWN_CONFIG` environment variable
//! 3. `<config dir>/rundown/config.toml`
//! 4. Built-in defaults (fallback)
//!
//! A missing configuration file is not fatal: a warning is logged and the
//! built-in defaults are used.

use crate::events::OffsetMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RUNDOWN_CONFIG";

/// What happens when the active entry's countdown reaches zero while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndAction {
    /// Stop playback
    #[default]
    Stop,
    /// Keep running into overtime
    None,
    /// Start the next playable entry
    PlayNext,
}

/// Countdown thresholds for the timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    /// Remaining time at or below which the phase becomes `warning`
    pub warning_ms: i64,
    /// Remaining time at or below which the phase becomes `danger`
    pub danger_ms: i64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            warning_ms: 120_000,
            danger_ms: 60_000,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clock task period
    pub tick_interval_ms: u64,
    /// How long a tick waits for an in-flight mutation before skipping
    pub tick_lock_wait_ms: u64,
    /// EventBus channel capacity
    pub event_capacity: usize,
    pub thresholds: PhaseThresholds,
    pub end_action: EndAction,
    /// Largest magnitude accepted by a single added-time adjustment
    pub max_added_time_ms: i64,
    /// Initial offset reference; switchable at runtime
    pub offset_mode: OffsetMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            tick_lock_wait_ms: 20,
            event_capacity: 100,
            thresholds: PhaseThresholds::default(),
            end_action: EndAction::default(),
            max_added_time_ms: 3_600_000,
            offset_mode: OffsetMode::default(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration, falling back to defaults
    ///
    /// An explicitly requested file (CLI or environment) that fails to parse is
    /// an error. A missing default-location file is not.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_config_path(cli_arg) {
            info!("Loading configuration from {}", path.display());
            return Self::load_from_file(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)
            }
            _ => {
                warn!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Bring values that cannot run into range
    ///
    /// Configurations built in code skip `validate`, so the engine clamps a
    /// zero tick period or channel capacity instead of panicking on them.
    pub fn sanitised(mut self) -> Self {
        if self.tick_interval_ms == 0 || self.tick_interval_ms >= 1_000 {
            let clamped = self.tick_interval_ms.clamp(1, 999);
            warn!(
                "tick_interval_ms {} out of range, using {}",
                self.tick_interval_ms, clamped
            );
            self.tick_interval_ms = clamped;
        }
        if self.event_capacity == 0 {
            warn!("event_capacity 0 out of range, using 1");
            self.event_capacity = 1;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms >= 1_000 {
            return Err(Error::Config(format!(
                "tick_interval_ms must be between 1 and 999, got {}",
                self.tick_interval_ms
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be positive".to_string()));
        }
        if self.thresholds.danger_ms > self.thresholds.warning_ms {
            return Err(Error::Config(format!(
                "danger threshold ({}ms) exceeds warning threshold ({}ms)",
                self.thresholds.danger_ms, self.thresholds.warning_ms
            )));
        }
        if self.max_added_time_ms < 0 {
            return Err(Error::Config(
                "max_added_time_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// CLI argument, then environment variable
fn explicit_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Platform config directory location (`~/.config/rundown/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rundown").join("config.toml"))
}
