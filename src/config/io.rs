//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.lootbook/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lootbook")
    }

    /// Get the global config file path (~/.lootbook/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the global config is used
    /// when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            return Self::from_file(&global_path);
        }

        tracing::debug!("No config at {}, using defaults", global_path.display());
        Ok(Self::default())
    }

    /// Validate and write the config to `path`.
    ///
    /// Writers serialize on a `<path>.lock` sidecar; the content goes to a
    /// sibling temp file that replaces `path` only once it is synced.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }

        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.with_extension("toml.lock"))
            .context("Failed to open config lock file")?;
        lock.lock_exclusive()
            .context("Failed to lock config")?;

        let staged = path.with_extension("toml.tmp");
        write_synced(&staged, content.as_bytes())?;
        std::fs::rename(&staged, path)
            .with_context(|| format!("Failed to replace config: {}", path.display()))?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.toml");

        let mut config = Config::default();
        config.export.page_size = 64;
        config.database.progress_path = Some(dir.path().join("progress.db"));
        config.save_to_file(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.export.page_size = 0;
        assert!(config.save_to_file(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
