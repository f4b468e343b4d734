use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};

use crate::colors;
use crate::{
    CONFIG_FILE_NAME, DEFAULT_AI_TIMEOUT_SECS, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_MAX_FOLDER_NAME_LEN, DEFAULT_PREVIEW_CHARS,
};

/// Run configuration, read once at startup and treated as immutable for the
/// duration of a run. Services take it by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Limits
    pub max_file_size_mb: u64,
    pub max_files: usize,
    pub preview_chars: usize,
    pub max_folder_name_len: usize,
    pub max_depth: usize,

    // AI classifier endpoint
    pub ai_endpoint: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_timeout_secs: u64,

    // Classification behavior
    pub interactive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            max_files: DEFAULT_MAX_FILES,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            max_folder_name_len: DEFAULT_MAX_FOLDER_NAME_LEN,
            max_depth: 1,
            ai_endpoint: None,
            ai_api_key: None,
            ai_timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            interactive: false,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(CONFIG_FILE_NAME))
    }

    /// Get the path to the settings backup file
    pub fn backup_path() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        Ok(config_path.with_extension("json.backup"))
    }

    /// Load settings from disk, falling back to defaults when no file
    /// exists. Environment overrides are applied afterwards.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut settings = if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(settings) => settings,
                Err(e) => {
                    // Settings corrupted, try backup
                    eprintln!("{} Settings corrupted, trying backup...", "⚠️".yellow());
                    let backup_path = Self::backup_path()?;
                    if backup_path.exists() {
                        let restored = Self::load_from(&backup_path)?;
                        eprintln!("{} Restored from backup", "✅".green());
                        restored
                    } else {
                        return Err(e);
                    }
                }
            }
        } else {
            Self::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Save settings to disk with backup, writing through a temp file so a
    /// crash never leaves a half-written settings file behind.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let backup_path = Self::backup_path()?;

        if config_path.exists() {
            fs::copy(&config_path, &backup_path).context("Failed to create settings backup")?;
        }

        self.save_to(&config_path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&temp_path, &data).context("Failed to write temp settings file")?;
        fs::rename(&temp_path, path).context("Failed to finalize settings file")?;
        Ok(())
    }

    /// Environment variables override the settings file so credentials can
    /// stay out of it.
    fn apply_env(&mut self) {
        if let Ok(endpoint) = env::var("SHELFSORT_AI_ENDPOINT") {
            if !endpoint.is_empty() {
                self.ai_endpoint = Some(endpoint);
            }
        }
        if let Ok(key) = env::var("SHELFSORT_AI_API_KEY") {
            if !key.is_empty() {
                self.ai_api_key = Some(key);
            }
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Display current settings
    pub fn display(&self) {
        println!("{}", "🔧 CURRENT SETTINGS".bold().color(colors::HEADER));
        println!();

        println!("{} Max file size: {} MB", "•".cyan(), self.max_file_size_mb);
        println!("{} Max files per analysis: {}", "•".cyan(), self.max_files);
        println!("{} Preview length: {} chars", "•".cyan(), self.preview_chars);
        println!("{} Max folder name length: {}", "•".cyan(), self.max_folder_name_len);
        println!("{} Scan depth: {}", "•".cyan(), self.max_depth);
        println!();
        println!("{} AI endpoint: {}", "•".cyan(), match &self.ai_endpoint {
            Some(url) => url.as_str(),
            None => "not configured",
        });
        println!("{} AI credentials: {}", "•".cyan(),
            if self.ai_api_key.is_some() { "set" } else { "not set" });
        println!("{} AI timeout: {} seconds", "•".cyan(), self.ai_timeout_secs);
        println!("{} Interactive classification: {}", "•".cyan(),
            if self.interactive { "enabled" } else { "disabled" });
    }
}
