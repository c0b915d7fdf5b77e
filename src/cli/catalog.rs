//! CLI commands for players, levels and prizes

use anyhow::Result;

use lootbook::Config;
use lootbook::progress::{Level, Player, Prize};

use super::open_progress;

pub fn player_add(config: &Config, id: &str) -> Result<()> {
    let manager = open_progress(config)?;
    manager.players().create(&Player::new(id))?;
    println!("Created player: {}", id);
    Ok(())
}

pub fn player_list(config: &Config) -> Result<()> {
    let manager = open_progress(config)?;
    let players = manager.players().list()?;

    if players.is_empty() {
        println!("No players found.");
        println!("Create one with: lootbook player add <id>");
        return Ok(());
    }

    for player in players {
        println!("  {}", player.id);
    }
    Ok(())
}

pub fn level_add(config: &Config, id: i64, title: &str, order: i64) -> Result<()> {
    let manager = open_progress(config)?;
    manager
        .levels()
        .create(&Level::new(id, title).with_order(order))?;
    println!("Created level #{}: {}", id, title);
    Ok(())
}

pub fn level_list(config: &Config) -> Result<()> {
    let manager = open_progress(config)?;
    let levels = manager.levels().list()?;

    if levels.is_empty() {
        println!("No levels found.");
        return Ok(());
    }

    println!("{:<8} {:<8} {}", "ID", "ORDER", "TITLE");
    println!("{}", "-".repeat(40));
    for level in levels {
        println!("{:<8} {:<8} {}", level.id, level.order, level.title);
    }
    Ok(())
}

pub fn prize_add(config: &Config, id: i64, title: &str) -> Result<()> {
    let manager = open_progress(config)?;
    manager.prizes().create(&Prize::new(id, title))?;
    println!("Created prize #{}: {}", id, title);
    Ok(())
}

pub fn prize_list(config: &Config) -> Result<()> {
    let manager = open_progress(config)?;
    let prizes = manager.prizes().list()?;

    if prizes.is_empty() {
        println!("No prizes found.");
        return Ok(());
    }

    for prize in prizes {
        println!("  #{:<6} {}", prize.id, prize.title);
    }
    Ok(())
}
