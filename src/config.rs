//! Configuration: optional TOML file with defaults matching the stock timings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cleaner::Locations;
use crate::errors::{PanelError, Result};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub estimates: EstimateConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

/// Delays and timeouts, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Bounded wait for any external command.
    pub command_timeout_ms: u64,
    /// Cadence of the device status poll.
    pub poll_interval_ms: u64,
    /// Hold between a scan request and the probe pass.
    pub scan_delay_ms: u64,
    /// Pause between two cleanup steps.
    pub step_delay_ms: u64,
    /// Pause before the single retry of a failed step.
    pub retry_delay_ms: u64,
    /// How long the pipeline stays Completed before returning to Idle.
    pub completion_hold_ms: u64,
    /// Settle window after toggling an adapter or radio.
    pub settle_ms: u64,
    /// Ethernet takes longer to renegotiate.
    pub ethernet_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 5_000,
            poll_interval_ms: 3_000,
            scan_delay_ms: 2_000,
            step_delay_ms: 1_000,
            retry_delay_ms: 250,
            completion_hold_ms: 500,
            settle_ms: 2_000,
            ethernet_settle_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn completion_hold(&self) -> Duration {
        Duration::from_millis(self.completion_hold_ms)
    }
}

/// Fixed sizes reported for targets that cannot be enumerated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EstimateConfig {
    pub recycle_bin_bytes: u64,
    pub browser_cache_bytes: u64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            recycle_bin_bytes: 500 * MIB,
            browser_cache_bytes: 300 * MIB,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub windows_dir: PathBuf,
    /// Defaults to the OS temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Defaults to the local application cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            windows_dir: PathBuf::from("C:\\Windows"),
            temp_dir: None,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "winpanel=info,warn".to_string(),
        }
    }
}

impl Config {
    /// `<config_dir>/winpanel/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("winpanel").join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(PanelError::io(path, e)),
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timing.command_timeout_ms == 0 {
            return Err(PanelError::InvalidConfig {
                details: "timing.command_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(PanelError::InvalidConfig {
                details: "timing.poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.paths.windows_dir.as_os_str().is_empty() {
            return Err(PanelError::InvalidConfig {
                details: "paths.windows_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the directories every cleanup target works on.
    pub fn locations(&self) -> Locations {
        Locations {
            temp_dir: self
                .paths
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            windows_dir: self.paths.windows_dir.clone(),
            cache_dir: self.paths.cache_dir.clone().or_else(dirs::cache_dir),
        }
    }
}
