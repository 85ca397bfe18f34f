//! Stats command - inspect and edit usage statistics.

use clap::{Args, Subcommand};
use console::style;

use doctype_core::StatsStore;

use super::load_config;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    command: StatsCommand,
}

#[derive(Subcommand)]
enum StatsCommand {
    /// Show statistics with the average confidence
    Show,

    /// Remove a document from the history and recount
    Delete {
        /// File name as recorded in the history
        filename: String,
    },

    /// Show the stats file path
    Path,
}

pub async fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = StatsStore::from_config(&config.stats);

    match args.command {
        StatsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&store.summary())?);
        }
        StatsCommand::Delete { filename } => {
            let stats = store.delete(&filename)?;
            println!(
                "{} Removed {} ({} documents remain)",
                style("✓").green(),
                filename,
                stats.total_uploads
            );
        }
        StatsCommand::Path => {
            println!("Stats file: {}", store.path().display());
            if store.path().exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
            }
        }
    }

    Ok(())
}
