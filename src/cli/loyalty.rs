//! CLI commands for the loyalty program

use anyhow::{Result, bail};
use serde::Serialize;

use lootbook::Config;
use lootbook::loyalty::{LoyaltyPlayer, PlayerBoost};
use lootbook::time_bucket;

use super::open_loyalty;

/// Record a login, registering the player on first sight
pub fn login(config: &Config, username: &str) -> Result<()> {
    let loyalty = open_loyalty(config)?;
    loyalty.get_or_register(username)?;

    let outcome = loyalty.record_login(username, time_bucket::now())?;
    println!(
        "Welcome back, {}! Streak: {} day(s) (best {})",
        username, outcome.streak.current, outcome.streak.best
    );
    if outcome.points_accrued > 0 {
        println!(
            "  +{} points ({} total)",
            outcome.points_accrued, outcome.daily_points
        );
    } else {
        println!("  {} points (next accrual after midnight UTC)", outcome.daily_points);
    }
    for boost in outcome.boosts_granted {
        println!("  Earned boost: {} ({})", boost.boost_name, boost.value);
    }
    Ok(())
}

#[derive(Serialize)]
struct LoyaltyStatus {
    #[serde(flatten)]
    player: LoyaltyPlayer,
    live_streak: u32,
    boosts: Vec<PlayerBoost>,
}

/// Show points, the streak as of today and received boosts
pub fn status(config: &Config, username: &str, json: bool) -> Result<()> {
    let loyalty = open_loyalty(config)?;
    let Some(player) = loyalty.get_player(username)? else {
        bail!("Loyalty player not found: {}", username);
    };

    let today = time_bucket::now().date_naive();
    let status = LoyaltyStatus {
        live_streak: player.live_streak(today),
        boosts: loyalty.boosts_for(username)?,
        player,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}: {} point(s)", username, status.player.daily_points);
    println!(
        "  Streak: {} day(s) (best {})",
        status.live_streak, status.player.streak.best
    );
    if status.live_streak == 0 && status.player.streak.current > 0 {
        println!("  Streak lapsed; log in today to start a new one");
    }
    if let Some(first) = status.player.first_login {
        println!("  Member since {}", first.format("%Y-%m-%d"));
    }
    println!("  Boosts: {}", status.boosts.len());
    Ok(())
}

pub fn boost_define(
    config: &Config,
    name: &str,
    description: Option<&str>,
    kind: &str,
) -> Result<()> {
    let loyalty = open_loyalty(config)?;
    let boost = loyalty.define_boost(name, description, kind)?;
    println!("Defined boost #{}: {} [{}]", boost.id, boost.name, boost.kind);
    Ok(())
}

pub fn boost_grant(config: &Config, username: &str, boost: &str, value: f64) -> Result<()> {
    let loyalty = open_loyalty(config)?;
    let granted = loyalty.grant_boost(username, boost, value, time_bucket::now())?;
    println!("Granted {} ({}) to {}", granted.boost_name, granted.value, username);
    Ok(())
}

/// List defined boosts, or the boosts one player received
pub fn boost_list(config: &Config, username: Option<&str>) -> Result<()> {
    let loyalty = open_loyalty(config)?;

    let Some(username) = username else {
        let boosts = loyalty.list_boosts()?;
        if boosts.is_empty() {
            println!("No boosts defined.");
        }
        for boost in boosts {
            println!(
                "  {:<20} {:<12} {}",
                boost.name,
                boost.kind,
                boost.description.unwrap_or_default()
            );
        }
        return Ok(());
    };

    let boosts = loyalty.boosts_for(username)?;
    if boosts.is_empty() {
        println!("{} has no boosts.", username);
    }
    for boost in boosts {
        println!(
            "  {:<20} {:<8} {}",
            boost.boost_name,
            boost.value,
            boost.received_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
