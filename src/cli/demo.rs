//! Demo command: the sample player journey, end to end

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use lootbook::Config;
use lootbook::progress::{Level, Player, Prize, ProgressManager};

use super::open_progress;

const DEMO_PLAYER: &str = "super_unique_id";
const DEMO_LEVEL: i64 = 1;
const DEMO_PRIZES: [(i64, &str); 2] = [(1, "Prize 1"), (2, "Prize 2")];

/// Run the demo against the configured database and export the result.
///
/// Safe to run repeatedly: records left by an earlier run are reused.
pub fn demo(config: &Config, output: &Path) -> Result<()> {
    let manager = open_progress(config)?;
    run_scenario(&manager)?;

    let written = manager
        .exporter()
        .with_page_size(config.export.page_size)
        .write_csv_file(output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!("Exported: {}", written.display());
    Ok(())
}

fn run_scenario(manager: &ProgressManager) -> Result<()> {
    // There is a level
    if manager.levels().get(DEMO_LEVEL)?.is_none() {
        manager.levels().create(&Level::new(DEMO_LEVEL, "Level 1"))?;
    }

    // A player shows up and starts it
    if manager.players().get(DEMO_PLAYER)?.is_none() {
        manager.players().create(&Player::new(DEMO_PLAYER))?;
    }
    let progress = match manager.player_levels().find(DEMO_PLAYER, DEMO_LEVEL)? {
        Some(progress) => progress,
        None => manager.player_levels().start(DEMO_PLAYER, DEMO_LEVEL)?,
    };

    if !progress.is_completed() {
        manager.complete_level(DEMO_PLAYER, DEMO_LEVEL)?;
        println!("{} completed level {}", DEMO_PLAYER, DEMO_LEVEL);
    }

    // Prizes are generated for the level and awarded once
    for (id, title) in DEMO_PRIZES {
        if manager.prizes().get(id)?.is_none() {
            manager.prizes().create(&Prize::new(id, title))?;
        }
    }
    if manager.level_prizes().count_for_player_level(progress.id)? == 0 {
        let prize_ids: Vec<i64> = DEMO_PRIZES.iter().map(|(id, _)| *id).collect();
        let awards = manager.award_prizes(DEMO_PLAYER, DEMO_LEVEL, &prize_ids)?;
        println!("Awarded {} prize(s)", awards.len());
    }

    // The player picks them up
    let claimed = manager.claim_all(DEMO_PLAYER, DEMO_LEVEL)?;
    println!("Claimed {} prize(s)", claimed.len());

    info!("Demo scenario finished for {}", DEMO_PLAYER);
    Ok(())
}
