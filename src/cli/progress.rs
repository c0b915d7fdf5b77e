//! CLI commands for level progress and prize awards

use anyhow::{Result, bail};
use serde::Serialize;

use lootbook::Config;
use lootbook::progress::{AwardedPrize, PlayerLevel};

use super::open_progress;

pub fn start(config: &Config, player: &str, level: i64) -> Result<()> {
    let manager = open_progress(config)?;
    let record = manager.player_levels().start(player, level)?;
    println!("{} started level {} (#{})", player, level, record.id);
    Ok(())
}

pub fn complete(config: &Config, player: &str, level: i64, score: Option<i64>) -> Result<()> {
    let manager = open_progress(config)?;
    let record = match score {
        Some(score) => manager.complete_level_with_score(player, level, score)?,
        None => manager.complete_level(player, level)?,
    };

    if let Some(at) = record.completed_at() {
        println!(
            "{} completed level {} at {} (score {})",
            player,
            level,
            at.format("%Y-%m-%d %H:%M:%S"),
            record.score
        );
    }
    Ok(())
}

pub fn award(config: &Config, player: &str, level: i64, prizes: &[i64]) -> Result<()> {
    let manager = open_progress(config)?;
    let awards = manager.award_prizes(player, level, prizes)?;

    if awards.is_empty() {
        println!("No prizes given; nothing awarded.");
        return Ok(());
    }

    println!("Awarded {} prize(s) to {} for level {}:", awards.len(), player, level);
    for award in awards {
        println!("  award #{} -> prize #{}", award.id, award.prize_id);
    }
    Ok(())
}

pub fn claim(config: &Config, award_id: i64) -> Result<()> {
    let manager = open_progress(config)?;
    let award = manager.claim_prize(award_id)?;
    println!("Claimed award #{} (prize #{})", award.id, award.prize_id);
    Ok(())
}

pub fn claim_all(config: &Config, player: &str, level: i64) -> Result<()> {
    let manager = open_progress(config)?;
    let claimed = manager.claim_all(player, level)?;

    if claimed.is_empty() {
        println!("Nothing left to claim.");
    } else {
        println!("Claimed {} award(s).", claimed.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct LevelStatus {
    #[serde(flatten)]
    progress: PlayerLevel,
    level_title: String,
    awards: Vec<AwardedPrize>,
}

/// Show a player's levels and awards
pub fn status(config: &Config, player: &str, json: bool) -> Result<()> {
    let manager = open_progress(config)?;
    if manager.players().get(player)?.is_none() {
        bail!("Player not found: {}", player);
    }

    let levels = manager.levels();
    let level_prizes = manager.level_prizes();
    let mut items = Vec::new();
    for progress in manager.player_levels().list_for_player(player)? {
        let level_title = levels
            .get(progress.level_id)?
            .map(|level| level.title)
            .unwrap_or_default();
        let awards = level_prizes.list_for_player_level(progress.id)?;
        items.push(LevelStatus {
            progress,
            level_title,
            awards,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{} has not started any level.", player);
        return Ok(());
    }

    println!("Levels of {} ({}):\n", player, items.len());
    for item in items {
        let state = match item.progress.completed_at() {
            Some(at) => format!("completed {}", at.format("%Y-%m-%d %H:%M")),
            None => "in progress".to_string(),
        };
        println!(
            "  #{} {} [{}] score {}",
            item.progress.level_id, item.level_title, state, item.progress.score
        );

        for awarded in item.awards {
            let claim = if awarded.award.is_received() {
                "claimed"
            } else {
                "unclaimed"
            };
            println!(
                "    award #{} {} ({})",
                awarded.award.id, awarded.prize_title, claim
            );
        }
    }
    Ok(())
}
