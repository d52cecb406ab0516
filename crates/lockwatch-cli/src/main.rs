// Lockwatch CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Read the event store directly; reporting needs no running API.

mod commands;
mod output;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lockwatch_core::Reporter;
use lockwatch_storage::{Database, DatabaseConfig, DbEventStore};

#[derive(Parser)]
#[command(name = "lockwatch")]
#[command(about = "Lockwatch CLI - Campaign and user engagement reports")]
#[command(version)]
pub struct Cli {
    /// PostgreSQL connection URL (falls back to POSTGRES_URI)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// All campaigns, per-campaign detail and overall performance
    Dashboard,

    /// Statistics for one campaign
    Campaign {
        /// Campaign name
        name: String,
    },

    /// Notification history for one user
    User {
        /// User ID
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let output_format = output::OutputFormat::from_str(&cli.output);

    let db_config = match cli.database_url.clone() {
        Some(url) => DatabaseConfig::new(url),
        None => DatabaseConfig::from_env().context("Database configuration missing")?,
    };
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;
    let reporter = Reporter::new(Arc::new(DbEventStore::new(db.clone())));

    let result = match cli.command {
        Commands::Dashboard => commands::dashboard::run(&reporter, output_format).await,
        Commands::Campaign { name } => {
            commands::campaign::run(&reporter, output_format, &name).await
        }
        Commands::User { user_id } => commands::user::run(&reporter, output_format, &user_id).await,
    };

    db.close().await;
    result
}
