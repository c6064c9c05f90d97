use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::template::TemplateKind;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "CANN_ASSISTANT_CONFIG";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub template: TemplateKind,
    pub reply_delay_ms: u64,
    pub generate_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            theme: Theme::Light,
            template: TemplateKind::AclOperator,
            reply_delay_ms: 1500,
            generate_delay_ms: 2000,
            output_dir: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Update one field in the stored file. An unreadable file is an error
    /// rather than being replaced with defaults.
    pub fn save_theme(theme: Theme) -> Result<()> {
        let mut config = Self::load()?;
        config.theme = theme;
        config.save()
    }

    pub fn save_template(template: TemplateKind) -> Result<()> {
        let mut config = Self::load()?;
        config.template = template;
        config.save()
    }

    /// Directory used for downloads and exports.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir().ok_or(CoreError::NoDirectory("config"))?;

        Ok(config_dir.join("cann-assistant").join("config.json"))
    }
}
