//! Export command implementation

use anyhow::{Context, Result};
use std::path::Path;

use lootbook::Config;

use super::open_progress;

/// Export every player level (and its prizes) to a CSV file
pub fn export(config: &Config, path: &Path, page_size: Option<usize>) -> Result<()> {
    let manager = open_progress(config)?;
    let exporter = manager
        .exporter()
        .with_page_size(page_size.unwrap_or(config.export.page_size));

    let written = exporter
        .write_csv_file(path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    println!("Exported: {}", written.display());
    Ok(())
}
