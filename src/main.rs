//! `sharaf-shift` - administrative command line for the mapping and shift engine.
//!
//! Every subcommand connects to the configured database, makes sure the schema exists and
//! prints its result as pretty JSON.

#![allow(clippy::result_large_err)]

use clap::{Parser, Subcommand};
use serde::Serialize;
use sharaf_shift::{
    config::{
        database,
        settings::{self, Settings},
    },
    core::{completeness, mapping, sharaf, shift},
    errors::Result,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sharaf-shift",
    about = "Map sharaf definitions across miqaats and shift allocations between them",
    version
)]
struct Cli {
    /// Settings file; defaults to ./sharaf.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables and indexes
    Init,
    /// List definition mappings
    Mappings {
        /// Only mappings touching this definition
        #[arg(long)]
        definition: Option<i64>,
    },
    /// Check that a mapping covers every position and payment definition in use
    Validate {
        /// Mapping id
        mapping: i64,
        /// Validate the target-to-source direction
        #[arg(long)]
        reverse: bool,
        /// Restrict to these sharafs (repeatable)
        #[arg(long = "sharaf")]
        sharafs: Vec<i64>,
    },
    /// Move sharafs across a mapping
    Shift {
        /// Mapping id
        mapping: i64,
        /// Shift from the mapping's target definition to its source
        #[arg(long)]
        reverse: bool,
        /// Restrict to these sharafs (repeatable)
        #[arg(long = "sharaf")]
        sharafs: Vec<i64>,
        /// Actor recorded on the audit row
        #[arg(long)]
        actor: Option<String>,
    },
    /// List shift audits, newest first
    Audits {
        /// Only audits of this mapping
        #[arg(long)]
        mapping: Option<i64>,
        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Re-evaluate whether a sharaf is cleared and fully paid
    Confirm {
        /// Sharaf id
        sharaf: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env first so DATABASE_URL and RUST_LOG can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => settings::load_settings(path),
        None => settings::load_default_settings(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let default_filter = settings.log_filter.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if let Err(e) = run(cli.command, &settings).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, settings: &Settings) -> Result<()> {
    let database_url = database::get_database_url(settings.database_url.as_deref());
    let db = database::create_connection(&database_url).await?;
    database::create_tables(&db).await?;

    match command {
        Commands::Init => {
            info!(url = %database_url, "Database initialised");
            Ok(())
        }
        Commands::Mappings { definition } => {
            print_json(&mapping::list_mappings(&db, definition).await?)
        }
        Commands::Validate {
            mapping,
            reverse,
            sharafs,
        } => print_json(
            &completeness::validate_mapping(&db, mapping, sharaf_filter(&sharafs), reverse)
                .await?,
        ),
        Commands::Shift {
            mapping,
            reverse,
            sharafs,
            actor,
        } => {
            let actor = actor.or_else(|| settings.default_actor.clone());
            let result =
                shift::shift_sharafs(&db, mapping, actor, sharaf_filter(&sharafs), reverse)
                    .await?;
            print_json(&result)
        }
        Commands::Audits { mapping, limit } => {
            print_json(&shift::list_shift_audits(&db, mapping, limit).await?)
        }
        Commands::Confirm { sharaf } => {
            print_json(&sharaf::evaluate_confirmation(&db, sharaf).await?)
        }
    }
}

fn sharaf_filter(ids: &[i64]) -> Option<&[i64]> {
    (!ids.is_empty()).then_some(ids)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
