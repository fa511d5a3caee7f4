//! Application configuration management.
//!
//! Handles loading, saving, and managing application-wide settings,
//! including the local storage directory for playlists and the import
//! copy-mode toggle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, Result};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory where the playlist index and playlist-scoped storage live.
    pub playlists_directory: PathBuf,
    /// Whether imports copy media into app storage instead of referencing
    /// the originals.
    #[serde(default)]
    pub copy_imported_media: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playlists_directory: default_playlists_directory(),
            copy_imported_media: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, or create default if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        if !config_path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save() {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: config_path.clone(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", config_path.display());
        debug!(
            "Playlists directory: {}",
            config.playlists_directory.display()
        );

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        let config_path = config_file_path();

        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: format!("Failed to create config directory: {e}"),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: config_path.clone(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Update the playlists directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist or isn't writable.
    pub fn set_playlists_directory(&mut self, path: PathBuf) -> Result<()> {
        validate_storage_directory(&path)?;

        self.playlists_directory = path;
        info!(
            "Updated playlists directory to: {}",
            self.playlists_directory.display()
        );
        Ok(())
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default playlists directory.
#[must_use]
pub fn default_playlists_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playdeck")
        .join("playlists")
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("playdeck")
        .join("config.json")
}

/// Validate that a directory is suitable for storing playlists.
fn validate_storage_directory(path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(Error::Configuration(
            "Storage directory must be an absolute path".to_string(),
        ));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Configuration(format!(
                "Path exists but is not a directory: {}",
                path.display()
            )));
        }

        let test_file = path.join(".playdeck_write_test");
        match fs::write(&test_file, "test") {
            Ok(()) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "Directory is not writable: {} ({})",
                    path.display(),
                    e
                )));
            }
        }
    } else {
        fs::create_dir_all(path).map_err(|e| {
            Error::Configuration(format!("Cannot create directory {}: {}", path.display(), e))
        })?;
    }

    Ok(())
}

/// Configuration manager that handles loading and caching config.
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// Create a new config manager, loading config from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn new() -> Result<Self> {
        let config = AppConfig::load()?;
        Ok(Self { config })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the playlists directory.
    #[must_use]
    pub fn playlists_directory(&self) -> &Path {
        &self.config.playlists_directory
    }

    /// Update the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be saved.
    pub fn update(&mut self, config: AppConfig) -> Result<()> {
        validate_storage_directory(&config.playlists_directory)?;

        self.config = config;
        self.config.save()?;
        Ok(())
    }

    /// Update just the playlists directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is invalid or config cannot be saved.
    pub fn set_playlists_directory(&mut self, path: PathBuf) -> Result<()> {
        self.config.set_playlists_directory(path)?;
        self.config.save()?;
        Ok(())
    }

    /// Reset to default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be saved.
    pub fn reset(&mut self) -> Result<()> {
        self.config = AppConfig::default();
        self.config.save()?;
        Ok(())
    }
}
