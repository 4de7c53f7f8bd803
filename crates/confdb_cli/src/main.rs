//! ConfDB CLI
//!
//! Command-line tools for ConfDB database files.
//!
//! # Commands
//!
//! - `inspect` - Display bucket statistics
//! - `verify` - Check the alias index and child references
//! - `alias` - Look an alias up in the global index
//! - `compact` - Rewrite the journal down to the committed state

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ConfDB command-line database tools.
#[derive(Parser)]
#[command(name = "confdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display bucket statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that every alias has exactly one index entry and that every
    /// matcher and extract value has a parent
    Verify,

    /// Look an alias up in the global index
    Alias {
        /// The alias string
        name: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the journal down to the committed state
    Compact,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Database path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Alias { name, format } => {
            let path = cli.path.ok_or("Database path required for alias")?;
            commands::alias::run(&path, &name, &format)?;
        }
        Commands::Compact => {
            let path = cli.path.ok_or("Database path required for compact")?;
            commands::compact::run(&path)?;
        }
        Commands::Version => {
            println!("ConfDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ConfDB Core v{}", confdb_core::VERSION);
        }
    }

    Ok(())
}
