//! Config commands (edit `~/.lootbook/config.toml`)

use anyhow::Result;
use std::path::{Path, PathBuf};

use lootbook::Config;

/// The explicit config path, or the global one
fn resolve_config_path(config_override: Option<&Path>) -> PathBuf {
    config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path)
}

/// Load the file to edit; a missing file starts from defaults
fn load_for_edit(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}

pub fn config_show(config_override: Option<&Path>) -> Result<()> {
    let config = Config::load(config_override)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn config_set(config_override: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = resolve_config_path(config_override);
    let mut config = load_for_edit(&path)?;
    config.set(key, value)?;
    config.save_to_file(&path)?;

    println!("Set {} = {} in {}", key, value, path.display());
    Ok(())
}
