use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::workflows::AutogenConfig;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Measurement data directory (used when the CLI gives none).
    pub data_dir: Option<PathBuf>,
    /// Spectral parameter selected at startup.
    pub default_parameter: String,
    /// Hour at which daytime begins for auto-generated regions.
    pub day_start_hour: u32,
    /// Hour at which nighttime begins for auto-generated regions.
    pub night_start_hour: u32,
    /// Share of timestamps trimmed at each end of the data span.
    pub trim_fraction: f64,
    /// Keyboard resize step in milliseconds.
    pub keyboard_step_ms: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_parameter: "LZeq".to_string(),
            day_start_hour: 7,
            night_start_hour: 23,
            trim_fraction: 0.002,
            keyboard_step_ms: 1000.0,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/levelmark/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Auto-generation settings, with out-of-range hours falling back to the
    /// defaults rather than producing inverted days.
    pub fn autogen(&self) -> AutogenConfig {
        let defaults = AutogenConfig::default();
        let hours_ok = self.day_start_hour < self.night_start_hour && self.night_start_hour <= 23;
        if !hours_ok {
            log::warn!(
                "invalid day bounds {}..{} in config, using {}..{}",
                self.day_start_hour,
                self.night_start_hour,
                defaults.day_start_hour,
                defaults.night_start_hour
            );
            return AutogenConfig {
                trim_fraction: self.trim_fraction.clamp(0.0, 0.5),
                ..defaults
            };
        }
        AutogenConfig {
            day_start_hour: self.day_start_hour,
            night_start_hour: self.night_start_hour,
            trim_fraction: self.trim_fraction.clamp(0.0, 0.5),
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autogen_falls_back_on_inverted_hours() {
        let config = AppConfig {
            day_start_hour: 23,
            night_start_hour: 7,
            ..Default::default()
        };
        let autogen = config.autogen();
        assert_eq!(autogen.day_start_hour, 7);
        assert_eq!(autogen.night_start_hour, 23);
    }

    #[test]
    fn test_autogen_clamps_trim_fraction() {
        let config = AppConfig {
            trim_fraction: 0.9,
            ..Default::default()
        };
        assert_eq!(config.autogen().trim_fraction, 0.5);
    }
}
