use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/hist-sync or ~/.config/hist-sync
    /// - macOS: ~/Library/Application Support/hist-sync
    /// - Windows: %APPDATA%\hist-sync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("hist-sync"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("hist-sync"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join("hist-sync"))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join("hist-sync"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".hist-sync"))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn settings_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("hist-sync.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }

    /// The built-in local history default, `~/.bash_history`
    pub fn default_local_history() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".bash_history"))
    }
}

/// Persisted defaults for the sync subcommand, so the usual invocation needs
/// no flags. Flags override settings; settings override built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Default local history file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_history: Option<PathBuf>,

    /// Default companion history file (e.g. on a shared mount)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_history: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the platform config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&ConfigManager::settings_file_path()?)
    }

    /// Save settings to the platform config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&ConfigManager::settings_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;

        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    /// Resolve the local history path: flag, then settings, then
    /// `~/.bash_history`
    pub fn resolve_local(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path);
        }
        if let Some(path) = &self.local_history {
            return Ok(path.clone());
        }
        ConfigManager::default_local_history()
    }

    /// Resolve the companion history path: flag, then settings. There is no
    /// sensible built-in default for the companion side.
    pub fn resolve_companion(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.companion_history.clone()).context(
            "no companion history configured; pass --companion or set it with `hist-sync config`",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("hist-sync"));

        let settings = ConfigManager::settings_file_path().unwrap();
        assert!(settings.to_string_lossy().contains("config.toml"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().contains("hist-sync.log"));
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let settings = Settings {
            local_history: Some(PathBuf::from("/home/user/.bash_history")),
            companion_history: Some(PathBuf::from("/mnt/h/.bash_history")),
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.local_history, settings.local_history);
        assert_eq!(loaded.companion_history, settings.companion_history);
    }

    #[test]
    fn test_settings_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.local_history.is_none());
        assert!(loaded.companion_history.is_none());
    }

    #[test]
    fn test_resolution_precedence() {
        let settings = Settings {
            local_history: Some(PathBuf::from("/from/settings")),
            companion_history: Some(PathBuf::from("/settings/companion")),
        };

        let local = settings
            .resolve_local(Some(PathBuf::from("/from/flag")))
            .unwrap();
        assert_eq!(local, PathBuf::from("/from/flag"));

        let local = settings.resolve_local(None).unwrap();
        assert_eq!(local, PathBuf::from("/from/settings"));

        let companion = settings.resolve_companion(None).unwrap();
        assert_eq!(companion, PathBuf::from("/settings/companion"));
    }

    #[test]
    fn test_companion_unset_is_an_error() {
        let settings = Settings::default();
        let err = settings.resolve_companion(None).unwrap_err();
        assert!(err.to_string().contains("companion"));
    }
}
