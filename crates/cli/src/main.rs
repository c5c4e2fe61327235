use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use file_index_common::SystemConfig;
use std::path::PathBuf;

mod commands;
mod completions;

#[derive(Parser)]
#[command(name = "file-index")]
#[command(about = "Index file system metadata and catalog exports into OpenSearch", long_about = None)]
pub struct Cli {
    /// Path to configuration file (optional, defaults apply when missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Walk a directory tree and index one document per entry
    Directory {
        /// Root of the tree; paths are stored relative to it
        root: PathBuf,
        /// Drop and recreate the index if it exists
        #[arg(long)]
        clear: bool,
        /// Write JSON batch files instead of pushing to the index
        #[arg(long)]
        to_file: bool,
        /// Index name, defaults to the lowercased directory name
        #[arg(long)]
        index: Option<String>,
        /// Store a SHA-256 hash of every file's content
        #[arg(long)]
        hash: bool,
    },

    /// Parse the catalog export files of a directory
    Catalog {
        /// Directory containing the export files
        dir: PathBuf,
        #[arg(long)]
        clear: bool,
        #[arg(long)]
        to_file: bool,
        #[arg(long)]
        index: Option<String>,
    },

    /// Push JSON batch files written by an earlier --to-file run
    Import {
        /// Run directory with the batch files
        dir: PathBuf,
        #[arg(long)]
        clear: bool,
        /// Index name, defaults to the run directory name without its timestamp
        #[arg(long)]
        index: Option<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            completions::generate(shell);
            Ok(())
        }
        command => {
            let config = SystemConfig::load(&cli.config)
                .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
            commands::run(command, config).await
        }
    }
}
