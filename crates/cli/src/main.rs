//! `acme-seed` CLI entry-point.
//!
//! Available sub-commands:
//! - `seed`: create the dashboard tables and insert the seed data (default).
//! - `drop`: drop the dashboard tables.
//! - `check`: connect and report how many tables the `public` schema holds.
//!
//! Connection settings come from `POSTGRES_URL` and `APP_ENV`, optionally
//! via a `.env` file in the working directory.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use db::{DbConfig, PgExecutor};
use seed::{Argon2Hasher, SeedData, Seeder};

#[derive(Parser)]
#[command(
    name = "acme-seed",
    about = "Create and seed the Acme dashboard database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Create the tables and insert the placeholder data.
    Seed,
    /// Drop every dashboard table.
    Drop,
    /// Count the tables in the public schema.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Seed);
    let config = DbConfig::from_env();

    match run(command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{command:?} failed: {e:#}");
            eprintln!("An error occurred while attempting to {}: {e:#}", describe(command));
            eprintln!("Active configuration: {config}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &DbConfig) -> anyhow::Result<()> {
    // Validate before any work so a bad URL fails with a configuration error.
    db::get_connection(config).context("invalid database configuration")?;
    let executor = PgExecutor::new(config.clone());

    match command {
        Command::Seed => {
            let data = SeedData::placeholder().context("failed to load seed data")?;
            check_references(&data)?;
            let seeder = Seeder::new(Arc::new(executor), Arc::new(Argon2Hasher::default()));
            let report = seeder.run(&data).await?;
            for table in &report.tables {
                info!(
                    "{}: {} record(s), {} inserted",
                    table.table, table.attempted, table.inserted
                );
            }
        }
        Command::Drop => {
            db::repository::schema::drop_all(&executor)
                .await
                .context("failed to drop tables")?;
            info!("Drop tables complete");
        }
        Command::Check => {
            let tables = db::repository::schema::count_public_tables(&executor)
                .await
                .context("query failed")?;
            println!("Number of tables: {tables}");
        }
    }

    Ok(())
}

/// Refuse seed data whose invoices point at customers it does not contain.
fn check_references(data: &SeedData) -> anyhow::Result<()> {
    let orphans = data.orphan_invoices();
    if orphans.is_empty() {
        return Ok(());
    }
    let ids: Vec<String> = orphans.iter().map(|i| i.id.to_string()).collect();
    anyhow::bail!(
        "{} invoice(s) reference unknown customers: {}",
        ids.len(),
        ids.join(", ")
    )
}

fn describe(command: Command) -> &'static str {
    match command {
        Command::Seed => "seed the database",
        Command::Drop => "drop the tables",
        Command::Check => "query the database",
    }
}
