//! NestDB CLI
//!
//! Command-line access to NestDB stores.
//!
//! # Commands
//!
//! - `get`, `has`, `all` - Read values by dot-path key
//! - `set`, `delete`, `clear` - Write or remove values
//! - `add`, `subtract` - Adjust numeric counters
//! - `push`, `unpush` - Append to or remove from arrays
//! - `migrate` - Copy every record into another store
//!
//! Values are read as JSON; anything that is not valid JSON is stored as
//! plain text.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{migrate, records, Target};
use nestdb_core::{Language, DEFAULT_TABLE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// NestDB command-line store access.
#[derive(Parser)]
#[command(name = "nestdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder of a file store, or database file of a relational store
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Store backend
    #[arg(global = true, short, long, value_enum, default_value_t = StoreKind::File)]
    backend: StoreKind,

    /// Table name (also the file name of a file store)
    #[arg(global = true, short, long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Pretty-print the file store on disk
    #[arg(global = true, long)]
    readable: bool,

    /// Message language (en, tr)
    #[arg(global = true, short, long, default_value = "en")]
    language: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Backends reachable from the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file store
    File,
    /// SQLite table
    Relational,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a key
    Get {
        /// Dot-path key
        key: String,
    },

    /// Store a value at a key
    Set {
        /// Dot-path key
        key: String,
        /// Value (JSON, or plain text)
        value: String,
    },

    /// Delete the value at a key
    Delete {
        /// Dot-path key
        key: String,
    },

    /// Print whether a truthy value exists at a key
    Has {
        /// Dot-path key
        key: String,
    },

    /// Add to the number at a key
    Add {
        /// Dot-path key
        key: String,
        /// Amount to add
        amount: f64,
    },

    /// Subtract from the number at a key
    Subtract {
        /// Dot-path key
        key: String,
        /// Amount to subtract
        amount: f64,
    },

    /// Append a value to the array at a key
    Push {
        /// Dot-path key
        key: String,
        /// Value (JSON, or plain text)
        value: String,
    },

    /// Remove the first equal value from the array at a key
    Unpush {
        /// Dot-path key
        key: String,
        /// Value (JSON, or plain text)
        value: String,
    },

    /// Print every record
    All {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Delete every record
    Clear,

    /// Copy every record into another store
    Migrate {
        /// Backend of the destination store
        #[arg(long, value_enum)]
        to: StoreKind,

        /// Folder or database file of the destination store
        #[arg(long)]
        target: Option<PathBuf>,

        /// Table of the destination store (defaults to the source table)
        #[arg(long)]
        target_table: Option<String>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let language = Language::from_code(&cli.language);
    match run(cli, language).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.localized(language));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, language: Language) -> commands::CliResult<()> {
    let target = Target {
        kind: cli.backend,
        path: cli.path,
        table: cli.table,
        readable: cli.readable,
        language,
    };

    let output = match cli.command {
        Commands::Version => {
            println!("NestDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("NestDB Core v{}", nestdb_core::CURRENT_VERSION);
            return Ok(());
        }
        Commands::Migrate {
            to,
            target: destination_path,
            target_table,
        } => {
            let destination = Target {
                kind: to,
                path: destination_path,
                table: target_table.unwrap_or_else(|| target.table.clone()),
                readable: target.readable,
                language,
            };
            migrate::run(&target, &destination).await?
        }
        command => {
            let store = target.open().await?;
            let result = match command {
                Commands::Get { key } => records::get(&store, &key).await,
                Commands::Set { key, value } => records::set(&store, &key, &value).await,
                Commands::Delete { key } => records::delete(&store, &key).await,
                Commands::Has { key } => records::has(&store, &key).await,
                Commands::Add { key, amount } => records::add(&store, &key, amount).await,
                Commands::Subtract { key, amount } => {
                    records::subtract(&store, &key, amount).await
                }
                Commands::Push { key, value } => records::push(&store, &key, &value).await,
                Commands::Unpush { key, value } => records::unpush(&store, &key, &value).await,
                Commands::All { pretty } => records::all(&store, pretty).await,
                Commands::Clear => records::clear(&store).await,
                Commands::Version | Commands::Migrate { .. } => Ok(String::new()),
            };
            store.close().await?;
            result?
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
