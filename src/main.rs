//! # Instruction Finder CLI (`instr`)
//!
//! The `instr` binary runs the Telegram bot and offers a few commands for
//! checking configuration and the document repository from a shell.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `instr run` | Start the bot (long polling) |
//! | `instr categories` | List configured categories and their folders |
//! | `instr check-config` | Validate the configuration file |
//! | `instr fetch <category>` | Read a category's listing and report the item count |
//! | `instr search <category> <term>` | Read a category and print matching links |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use instruction_finder::{commands, config, logging, telegram};

/// Instruction Finder — a chat bot for finding instruction documents by
/// train series and number.
#[derive(Parser)]
#[command(
    name = "instr",
    about = "Instruction Finder — find instruction documents by train series and number",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/instr.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot.
    ///
    /// The token is read from `INSTR_BOT_TOKEN` or `[bot].token`.
    Run,

    /// List configured categories and their folder ids.
    Categories,

    /// Load and validate the configuration file.
    CheckConfig,

    /// Read every page of a category's folders and report the item count.
    Fetch {
        /// Category label, exactly as configured.
        category: String,
    },

    /// Read a category and print links whose names contain the term.
    Search {
        /// Category label, exactly as configured.
        category: String,

        /// Instruction number or part of its name (case-insensitive).
        term: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run => {
            telegram::run_bot(cfg).await?;
        }
        Commands::Categories => {
            commands::list_categories(&cfg)?;
        }
        Commands::CheckConfig => {
            commands::check_config(&cfg)?;
        }
        Commands::Fetch { category } => {
            commands::run_fetch(&cfg, &category).await?;
        }
        Commands::Search { category, term } => {
            commands::run_search(&cfg, &category, &term).await?;
        }
    }

    Ok(())
}
