//! Titlebar configuration
//!
//! Loads configuration from TOML file at `~/.config/area/bars.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Titlebar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsConfig {
    /// Bar height in pixels; below 1 disables the bar
    pub bar_height: i32,
    /// Background color (ARGB)
    pub bar_color: u32,
    /// Title text color (ARGB)
    pub text_color: u32,
    /// Title size in pixels at scale 1
    pub text_size: u32,
    /// Font family looked up in the system font directories
    pub text_font: String,
    /// Explicit font file, takes precedence over `text_font`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Corner rounding in pixels
    pub rounding: i32,
    /// Border width used when the window has no override
    pub border_size: i32,
    /// Gap between buttons and around the button row
    pub button_padding: i32,
    /// Gap between the border and the title text
    pub text_padding: i32,
    /// Buttons, laid out right-to-left
    pub buttons: Vec<ButtonConfig>,
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            bar_height: 30,
            bar_color: 0xff3b4252,
            text_color: 0xffeceff4,
            text_size: 10,
            text_font: "sans".to_string(),
            font_path: None,
            rounding: 0,
            border_size: 2,
            button_padding: 5,
            text_padding: 10,
            buttons: vec![
                ButtonConfig {
                    size: 12,
                    color: 0xffbf616a,
                    icon: "×".to_string(),
                    command: "wmctrl -c :ACTIVE:".to_string(),
                },
                ButtonConfig {
                    size: 12,
                    color: 0xffa3be8c,
                    icon: "+".to_string(),
                    command: "wmctrl -r :ACTIVE: -b toggle,maximized_vert,maximized_horz".to_string(),
                },
            ],
        }
    }
}

impl BarsConfig {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Parse an explicit config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: BarsConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("area");

        Ok(config_dir.join("bars.toml"))
    }

    /// Save default configuration to file
    pub fn save_default(path: &Path) -> Result<()> {
        Self::default().save_to(path)?;
        info!("Created default config file at {:?}", path);
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file {:?}", path))?;

        Ok(())
    }
}

/// One titlebar button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Diameter in pixels
    pub size: u32,
    /// Fill color (ARGB)
    pub color: u32,
    /// Icon glyph; empty for none
    #[serde(default)]
    pub icon: String,
    /// Shell command run on click
    pub command: String,
}
