use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "checkin-kiosk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// How long the printing overlay stays up after a scan
    pub print_dwell_ms: u64,
    /// Pause between two scanned frames
    pub scan_interval_ms: u64,
    /// Where the session history is kept across restarts; in memory only when unset
    pub history_file: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            print_dwell_ms: 4000,
            scan_interval_ms: 66,
            history_file: None,
            log_file: PathBuf::from("checkin-kiosk.log"),
        }
    }
}

impl KioskConfig {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join(APP_DIR)
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(format!(".{}", APP_DIR))
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`
    ///
    /// A missing file at the default location means defaults; a missing file
    /// that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::get_config_path()?;
                if !default_path.exists() {
                    info!("No config file at {:?}, using defaults", default_path);
                    return Ok(Self::default());
                }
                default_path
            }
        };
        debug!("Loading config from: {:?}", config_path);

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: KioskConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.validate()?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
                info!("Created config directory: {:?}", dir);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.scan_interval_ms == 0 {
            anyhow::bail!("scan_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn print_dwell(&self) -> Duration {
        Duration::from_millis(self.print_dwell_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "print_dwell_ms = 1500\nhistory_file = \"/var/lib/kiosk/history.json\"\n").unwrap();

        let config = KioskConfig::load(Some(&path)).unwrap();

        assert_eq!(config.print_dwell(), Duration::from_millis(1500));
        assert_eq!(config.scan_interval_ms, 66);
        assert_eq!(
            config.history_file,
            Some(PathBuf::from("/var/lib/kiosk/history.json"))
        );
        assert_eq!(config.log_file, PathBuf::from("checkin-kiosk.log"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(KioskConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_zero_scan_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "scan_interval_ms = 0\n").unwrap();

        let err = KioskConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("scan_interval_ms"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = KioskConfig {
            history_file: Some(dir.path().join("history.json")),
            ..KioskConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(KioskConfig::load(Some(&path)).unwrap(), config);
    }
}
