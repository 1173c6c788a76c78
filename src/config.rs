use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{bail, eyre};
use serde::Deserialize;

use crate::render::Page;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub display: DisplayConfig,
    pub firmware: FirmwareConfig,
    pub sampler: SamplerConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_interval_ms: u64,
    pub power_report_interval_ms: u64,
    /// Display ticks spent on each page before rotating.
    pub page_ticks: u32,
    /// Take a fresh sample every N display ticks, reusing the last snapshot in between.
    pub resample_every: u32,
    pub pages: Vec<String>,
    pub print_power_report: bool,
    pub splash_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_interval_ms: 1000,
            power_report_interval_ms: 5000,
            page_ticks: 5,
            resample_every: 1,
            pages: vec![
                "overview".to_string(),
                "network".to_string(),
                "power".to_string(),
            ],
            print_power_report: true,
            splash_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub i2c_bus: PathBuf,
    pub address: u8,
    pub contrast: u8,
    pub rotate_180: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            i2c_bus: PathBuf::from("/dev/i2c-1"),
            address: 0x3C,
            contrast: 1,
            rotate_180: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FirmwareConfig {
    pub vcgencmd: PathBuf,
    pub timeout_ms: u64,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        FirmwareConfig {
            vcgencmd: PathBuf::from("vcgencmd"),
            timeout_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub disk_mount: PathBuf,
    pub thermal_zone: PathBuf,
    pub probe_primary_route: bool,
    /// Numeric `ip:port` only, so the per-tick probe never resolves a name.
    pub route_probe: SocketAddr,
    pub heat_limit_c: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            disk_mount: PathBuf::from("/"),
            thermal_zone: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            probe_primary_route: true,
            route_probe: SocketAddr::from(([8, 8, 8, 8], 80)),
            heat_limit_c: 85.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub icon_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        AssetsConfig {
            icon_dir: PathBuf::from("assets/icons"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.general.refresh_interval_ms)
    }

    pub fn power_report_interval(&self) -> Duration {
        Duration::from_millis(self.general.power_report_interval_ms)
    }

    pub fn firmware_timeout(&self) -> Duration {
        Duration::from_millis(self.firmware.timeout_ms)
    }

    /// Resolve the configured page names, rejecting unknown ones.
    pub fn pages(&self) -> Result<Vec<Page>> {
        self.general
            .pages
            .iter()
            .map(|name| Page::from_config_str(name).ok_or_else(|| eyre!("unknown page `{name}`")))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.refresh_interval_ms == 0 {
            bail!("general.refresh_interval_ms must be greater than 0");
        }
        if self.general.power_report_interval_ms == 0 {
            bail!("general.power_report_interval_ms must be greater than 0");
        }
        if self.general.page_ticks == 0 {
            bail!("general.page_ticks must be greater than 0");
        }
        if self.general.resample_every == 0 {
            bail!("general.resample_every must be greater than 0");
        }
        if self.firmware.timeout_ms == 0 {
            bail!("firmware.timeout_ms must be greater than 0");
        }
        if self.pages()?.is_empty() {
            bail!("general.pages must name at least one page");
        }
        Ok(())
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("oledmon").join("config.toml"))
}

/// A config file that was ignored in favour of the defaults.
#[derive(Debug)]
pub enum ConfigIssue {
    Unreadable { path: PathBuf, err: std::io::Error },
    Invalid { path: PathBuf, err: toml::de::Error },
}

impl ConfigIssue {
    pub fn path(&self) -> &Path {
        match self {
            ConfigIssue::Unreadable { path, .. } | ConfigIssue::Invalid { path, .. } => path,
        }
    }

    /// Report the fallback. Callers hold on to the issue until a subscriber
    /// is installed.
    pub fn log(&self) {
        let path = self.path().display();
        match self {
            ConfigIssue::Unreadable { err, .. } => {
                tracing::warn!(%path, %err, "config not readable, using defaults")
            }
            ConfigIssue::Invalid { err, .. } => {
                tracing::warn!(%path, err = %err.message(), "invalid config, using defaults")
            }
        }
    }
}

pub fn load_config() -> (Config, Option<ConfigIssue>) {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => (Config::default(), None),
    }
}

pub fn load_config_from_path(path: &Path) -> (Config, Option<ConfigIssue>) {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            let issue = ConfigIssue::Unreadable {
                path: path.to_path_buf(),
                err,
            };
            return (Config::default(), Some(issue));
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => (config, None),
        Err(err) => {
            let issue = ConfigIssue::Invalid {
                path: path.to_path_buf(),
                err,
            };
            (Config::default(), Some(issue))
        }
    }
}
