//! YAML configuration for the save manager and match settings presets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::save::{GameSettings, SaveError, SaveResult};

/// Where and how save slots are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory holding slot files and the auto-save
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Number of numbered slots; valid slots are `0..slot_count`
    #[serde(default = "default_slot_count")]
    pub slot_count: u8,

    /// File name of the auto-save inside `save_dir`
    #[serde(default = "default_auto_save_name")]
    pub auto_save_name: String,
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_slot_count() -> u8 {
    3
}

fn default_auto_save_name() -> String {
    "auto_save.sav".to_string()
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            slot_count: default_slot_count(),
            auto_save_name: default_auto_save_name(),
        }
    }
}

impl SaveConfig {
    pub fn with_dir(save_dir: impl Into<PathBuf>) -> Self {
        Self { save_dir: save_dir.into(), ..Self::default() }
    }

    pub fn from_yaml_str(yaml: &str) -> SaveResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| SaveError::Config(e.to_string()))?;
        if config.slot_count == 0 {
            return Err(SaveError::Config("slot_count must be at least 1".to_string()));
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SaveResult<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| SaveError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml_str(&yaml)?;

        log::debug!("Loaded save config from {}", path.display());
        Ok(config)
    }
}

/// Parses a match settings preset. Missing fields take their default values.
pub fn settings_from_yaml_str(yaml: &str) -> SaveResult<GameSettings> {
    serde_yaml::from_str(yaml).map_err(|e| SaveError::Config(e.to_string()))
}

pub fn load_settings_preset(path: impl AsRef<Path>) -> SaveResult<GameSettings> {
    let path = path.as_ref();
    let yaml =
        fs::read_to_string(path).map_err(|e| SaveError::Config(format!("{}: {}", path.display(), e)))?;
    settings_from_yaml_str(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SaveConfig::from_yaml_str("save_dir: /tmp/games\n").unwrap();
        assert_eq!(config.save_dir, PathBuf::from("/tmp/games"));
        assert_eq!(config.slot_count, 3);
        assert_eq!(config.auto_save_name, "auto_save.sav");
    }

    #[test]
    fn test_zero_slots_rejected() {
        let err = SaveConfig::from_yaml_str("slot_count: 0\n").unwrap_err();
        assert!(matches!(err, SaveError::Config(_)));
        assert!(matches!(SaveConfig::from_yaml_str("slot_count: [1"), Err(SaveError::Config(_))));
    }

    #[test]
    fn test_settings_preset_from_file() {
        let yaml = r#"
game_speed: 4
objective: 1
locked_teams: true
team_view: false
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let settings = load_settings_preset(file.path()).unwrap();
        assert_eq!(settings.game_speed, 4);
        assert_eq!(settings.objective, 1);
        assert!(settings.locked_teams);
        assert!(!settings.team_view);
        assert_eq!(settings.start_wealth, GameSettings::default().start_wealth);
    }

    #[test]
    fn test_missing_config_file() {
        let err = SaveConfig::load("/nonexistent/sg_config.yaml").unwrap_err();
        assert!(matches!(err, SaveError::Config(msg) if msg.contains("sg_config.yaml")));
    }
}
