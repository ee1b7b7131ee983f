use crate::infrastructure::bluetooth::protocol;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_logging_enabled: default_true(),
            file_logging_enabled: default_false(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "drone_controller".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Wireless link configuration. Snapshotted into `LinkOptions` when the
/// link worker starts; edits made afterwards apply on the next launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Acceptable advertised name prefixes for the vehicle.
    #[serde(default = "default_name_prefixes")]
    pub device_name_prefixes: Vec<String>,
    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,
    /// Telemetry characteristic. Declared by the firmware but never
    /// written from this side.
    #[serde(default = "default_telemetry_uuid")]
    pub telemetry_char_uuid: String,
    /// All control frames are written here.
    #[serde(default = "default_control_uuid")]
    pub control_char_uuid: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            device_name_prefixes: default_name_prefixes(),
            service_uuid: default_service_uuid(),
            telemetry_char_uuid: default_telemetry_uuid(),
            control_char_uuid: default_control_uuid(),
        }
    }
}

fn default_name_prefixes() -> Vec<String> {
    protocol::DEVICE_NAME_PREFIXES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_service_uuid() -> String {
    protocol::SERVICE_UUID.to_string()
}
fn default_telemetry_uuid() -> String {
    protocol::TELEMETRY_CHAR_UUID.to_string()
}
fn default_control_uuid() -> String {
    protocol::CONTROL_CHAR_UUID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub log_settings: LogSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("DroneController");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_both_characteristics_in_order() {
        let link = LinkSettings::default();
        assert_eq!(link.device_name_prefixes, vec!["ESP32MPU"]);
        // Telemetry first, control second; sends use only the second.
        assert!(link.telemetry_char_uuid.starts_with("beb5483e"));
        assert!(link.control_char_uuid.starts_with("beb5483f"));
    }

    #[test]
    fn empty_settings_file_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.link.service_uuid, default_service_uuid());
        assert_eq!(settings.log_settings.level, "info");
    }
}
