use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lootbook::Config;

mod cli;

#[derive(Parser)]
#[command(name = "lootbook")]
#[command(about = "Level progress, prize awards and loyalty rewards")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.lootbook/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the progress database (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ~/.lootbook/config.toml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage players
    Player {
        #[command(subcommand)]
        command: PlayerCommands,
    },

    /// Manage levels
    Level {
        #[command(subcommand)]
        command: LevelCommands,
    },

    /// Manage prizes
    Prize {
        #[command(subcommand)]
        command: PrizeCommands,
    },

    /// Start a level for a player
    Start { player: String, level: i64 },

    /// Mark a started level as completed
    Complete {
        player: String,
        level: i64,

        /// Final score for the level
        #[arg(long)]
        score: Option<i64>,
    },

    /// Award prizes for a completed level
    Award {
        player: String,
        level: i64,

        /// Prize ids, one award per id
        #[arg(num_args = 0..)]
        prizes: Vec<i64>,
    },

    /// Claim one award
    Claim { award_id: i64 },

    /// Claim every unclaimed award of a player's level
    ClaimAll { player: String, level: i64 },

    /// Show a player's levels and awards
    Status {
        player: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all progress rows to a CSV file
    Export {
        path: PathBuf,

        /// Rows read per page (defaults to export.page_size)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Run the sample scenario and export it
    Demo {
        /// CSV file to write
        #[arg(long, default_value = "player_levels.csv")]
        output: PathBuf,
    },

    /// Show or change settings in the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Record a loyalty login
    Login { username: String },

    /// Show a player's points, live streak and boosts
    Loyalty {
        username: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage loyalty boosts
    Boost {
        #[command(subcommand)]
        command: BoostCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Set a scalar setting, e.g. `export.page_size 500`
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum PlayerCommands {
    /// Create a player
    Add { id: String },
    /// List players
    List,
}

#[derive(Subcommand)]
enum LevelCommands {
    /// Create a level
    Add {
        id: i64,
        title: String,

        /// Ordering hint
        #[arg(long, default_value_t = 0)]
        order: i64,
    },
    /// List levels
    List,
}

#[derive(Subcommand)]
enum PrizeCommands {
    /// Create a prize
    Add { id: i64, title: String },
    /// List prizes
    List,
}

#[derive(Subcommand)]
enum BoostCommands {
    /// Create or update a boost
    Define {
        name: String,

        /// Boost type, e.g. multiplier or shield
        #[arg(long, default_value = "multiplier")]
        kind: String,

        #[arg(long)]
        description: Option<String>,
    },
    /// Grant a boost to a player
    Grant {
        username: String,
        boost: String,
        #[arg(long, default_value_t = 1.0)]
        value: f64,
    },
    /// List defined boosts, or the boosts of one player
    List { username: Option<String> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // These work on the config file itself, not on the loaded config
    match &cli.command {
        Commands::Init { force } => return cli::init::init_command(cli.config, *force),
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Show => cli::config::config_show(cli.config.as_deref()),
                ConfigCommands::Set { key, value } => {
                    cli::config::config_set(cli.config.as_deref(), key, value)
                }
            };
        }
        _ => {}
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database.progress_path = Some(db);
    }

    match cli.command {
        // Handled before the config is loaded
        Commands::Init { .. } | Commands::Config { .. } => {}
        Commands::Player { command } => match command {
            PlayerCommands::Add { id } => cli::catalog::player_add(&config, &id)?,
            PlayerCommands::List => cli::catalog::player_list(&config)?,
        },
        Commands::Level { command } => match command {
            LevelCommands::Add { id, title, order } => {
                cli::catalog::level_add(&config, id, &title, order)?
            }
            LevelCommands::List => cli::catalog::level_list(&config)?,
        },
        Commands::Prize { command } => match command {
            PrizeCommands::Add { id, title } => cli::catalog::prize_add(&config, id, &title)?,
            PrizeCommands::List => cli::catalog::prize_list(&config)?,
        },
        Commands::Start { player, level } => cli::progress::start(&config, &player, level)?,
        Commands::Complete {
            player,
            level,
            score,
        } => cli::progress::complete(&config, &player, level, score)?,
        Commands::Award {
            player,
            level,
            prizes,
        } => cli::progress::award(&config, &player, level, &prizes)?,
        Commands::Claim { award_id } => cli::progress::claim(&config, award_id)?,
        Commands::ClaimAll { player, level } => cli::progress::claim_all(&config, &player, level)?,
        Commands::Status { player, json } => cli::progress::status(&config, &player, json)?,
        Commands::Export { path, page_size } => cli::export::export(&config, &path, page_size)?,
        Commands::Demo { output } => cli::demo::demo(&config, &output)?,
        Commands::Login { username } => cli::loyalty::login(&config, &username)?,
        Commands::Loyalty { username, json } => cli::loyalty::status(&config, &username, json)?,
        Commands::Boost { command } => match command {
            BoostCommands::Define {
                name,
                kind,
                description,
            } => cli::loyalty::boost_define(&config, &name, description.as_deref(), &kind)?,
            BoostCommands::Grant {
                username,
                boost,
                value,
            } => cli::loyalty::boost_grant(&config, &username, &boost, value)?,
            BoostCommands::List { username } => {
                cli::loyalty::boost_list(&config, username.as_deref())?
            }
        },
    }

    Ok(())
}
