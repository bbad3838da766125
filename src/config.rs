use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::temperature::{
    DEFAULT_COMMAND_TIMEOUT, THERMAL_ZONE_PATH, VENDOR_ARGS, VENDOR_COMMAND,
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cpu: CpuConfig,
    pub memory: MemoryConfig,
    pub temperature: TemperatureConfig,
    pub disk: DiskConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub sample_interval_ms: u64,
}

impl Default for CpuConfig {
    fn default() -> Self {
        CpuConfig {
            sample_interval_ms: 200,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// "available" or "free"
    pub basis: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            basis: "available".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Empty disables the vendor command.
    pub command: String,
    pub args: Vec<String>,
    pub thermal_zone: PathBuf,
    pub timeout_ms: u64,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        TemperatureConfig {
            command: VENDOR_COMMAND.to_string(),
            args: VENDOR_ARGS.iter().map(|a| a.to_string()).collect(),
            thermal_zone: PathBuf::from(THERMAL_ZONE_PATH),
            timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// "plain" or "legacy"
    pub markup: String,
    pub legacy_disk_fallback: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            markup: "plain".to_string(),
            legacy_disk_fallback: false,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vitals").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Config::default()
        }),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "config not readable, using defaults");
            Config::default()
        }
    }
}
