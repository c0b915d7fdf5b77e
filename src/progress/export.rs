//! Flattened progress export
//!
//! One row per (player level × award), ordered by player. Rows are read in
//! keyset-paginated pages so the full table is never held in memory, and the
//! connection lock is released between pages.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::params;
use serde::Serialize;
use tracing::info;

use super::db::ProgressDb;
use crate::error::Result;

/// Prize title used for player levels without any award
pub const NO_PRIZE: &str = "No Prize";

/// Rows fetched per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// CSV header row
pub const CSV_HEADER: [&str; 4] = ["player_id", "level_title", "is_completed", "prize_title"];

/// One flattened export row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub player_id: String,
    pub level_title: String,
    pub is_completed: bool,
    pub prize_title: String,
}

/// Position after the last row of a page: (player id, player level id, award id).
/// Rows without an award use award id 0.
#[derive(Debug, Clone)]
struct Cursor {
    player_id: String,
    player_level_id: i64,
    award_id: i64,
}

impl Cursor {
    fn start() -> Self {
        // Every real row compares greater than this
        Self {
            player_id: String::new(),
            player_level_id: -1,
            award_id: -1,
        }
    }
}

/// Iterator over export pages
pub struct ExportPages {
    db: ProgressDb,
    page_size: usize,
    cursor: Cursor,
    done: bool,
}

impl ExportPages {
    fn fetch_page(&mut self) -> Result<Vec<ExportRow>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT p.id, l.title, pl.is_completed, pr.title, pl.id, COALESCE(lp.id, 0) AS award_id
            FROM player p
            JOIN player_level pl ON pl.player_id = p.id
            JOIN level l ON l.id = pl.level_id
            LEFT JOIN level_prize lp ON lp.player_level_id = pl.id
            LEFT JOIN prize pr ON pr.id = lp.prize_id
            WHERE (p.id, pl.id, COALESCE(lp.id, 0)) > (?1, ?2, ?3)
            ORDER BY p.id, pl.id, award_id
            LIMIT ?4
            "#,
        )?;

        let mut rows = stmt.query(params![
            self.cursor.player_id,
            self.cursor.player_level_id,
            self.cursor.award_id,
            self.page_size as i64,
        ])?;

        let mut page = Vec::with_capacity(self.page_size);
        let mut last = None;
        while let Some(row) = rows.next()? {
            let prize_title: Option<String> = row.get(3)?;
            page.push(ExportRow {
                player_id: row.get(0)?,
                level_title: row.get(1)?,
                is_completed: row.get(2)?,
                prize_title: prize_title.unwrap_or_else(|| NO_PRIZE.to_string()),
            });
            last = Some((row.get::<_, i64>(4)?, row.get::<_, i64>(5)?));
        }

        if let (Some((player_level_id, award_id)), Some(row)) = (last, page.last()) {
            self.cursor = Cursor {
                player_id: row.player_id.clone(),
                player_level_id,
                award_id,
            };
        }
        Ok(page)
    }
}

impl Iterator for ExportPages {
    type Item = Result<Vec<ExportRow>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fetch_page() {
            Ok(page) => {
                if page.len() < self.page_size {
                    self.done = true;
                }
                if page.is_empty() { None } else { Some(Ok(page)) }
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read-only exporter of player progress
#[derive(Clone)]
pub struct ProgressExporter {
    db: ProgressDb,
    page_size: usize,
}

impl ProgressExporter {
    pub fn new(db: ProgressDb) -> Self {
        Self {
            db,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size (at least 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Iterate over the export in pages
    pub fn pages(&self) -> ExportPages {
        ExportPages {
            db: self.db.clone(),
            page_size: self.page_size,
            cursor: Cursor::start(),
            done: false,
        }
    }

    /// Iterate over the export row by row (still fetched page-wise)
    pub fn rows(&self) -> impl Iterator<Item = Result<ExportRow>> + use<> {
        self.pages().flat_map(|page| match page {
            Ok(rows) => rows.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    }

    /// Write the export as CSV with `\r\n` line endings (RFC 4180).
    /// Returns the number of data rows written.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<u64> {
        let mut csv = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);
        csv.write_record(CSV_HEADER)?;

        let mut written = 0u64;
        for page in self.pages() {
            for row in page? {
                csv.write_record([
                    row.player_id.as_str(),
                    row.level_title.as_str(),
                    completed_label(row.is_completed),
                    row.prize_title.as_str(),
                ])?;
                written += 1;
            }
        }
        csv.flush()?;
        Ok(written)
    }

    /// Write the export to a CSV file, creating parent directories.
    /// Returns the path written.
    pub fn write_csv_file(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let written = self.write_csv(file)?;
        info!("Exported {} row(s) to {}", written, path.display());
        Ok(path.to_path_buf())
    }
}

fn completed_label(is_completed: bool) -> &'static str {
    if is_completed { "True" } else { "False" }
}
