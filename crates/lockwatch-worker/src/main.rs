// Lockwatch dispatch job
//
// Scan the device registry for locks whose battery has not been checked
// recently, push a reminder to every subscriber, record each send, exit.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lockwatch_core::{CancellationToken, DispatchConfig, Dispatcher, StaleScanner};
use lockwatch_dynamo::DynamoDeviceRegistry;
use lockwatch_fcm::FcmGateway;
use lockwatch_storage::{Database, DatabaseConfig, DbEventStore, DbSubscriptionDirectory};
use lockwatch_worker::{DispatchReport, DispatchRunner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lockwatch-dispatch")]
#[command(about = "Notify users whose locks have not had a battery check recently")]
#[command(version)]
struct Args {
    /// Locks not checked within this many days are stale
    #[arg(long)]
    threshold_days: Option<i64>,

    /// Campaign name recorded with every send
    #[arg(long)]
    campaign: Option<String>,

    /// Maximum concurrent push requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Scan and list targets without sending anything
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn apply(&self, mut config: DispatchConfig) -> lockwatch_core::Result<DispatchConfig> {
        if let Some(days) = self.threshold_days {
            config = config.with_threshold_days(days);
        }
        if let Some(campaign) = &self.campaign {
            config = config.with_campaign(campaign.clone());
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        config.validate()?;
        Ok(config)
    }
}

async fn build_runner(config: DispatchConfig, db: Database) -> Result<DispatchRunner> {
    let registry = DynamoDeviceRegistry::from_env().context("Device registry configuration missing")?;
    let gateway = FcmGateway::from_env().context("Push gateway configuration missing")?;

    let scanner = StaleScanner::new(
        Arc::new(registry),
        Arc::new(DbSubscriptionDirectory::new(db.clone())),
    );
    let dispatcher = Dispatcher::new(Arc::new(gateway), Arc::new(DbEventStore::new(db)));
    Ok(DispatchRunner::new(scanner, dispatcher, config))
}

fn log_report(report: &DispatchReport) {
    tracing::info!(
        campaign = %report.campaign_name,
        cutoff = %report.cutoff,
        stale = report.stale_count,
        targets = report.target_count,
        sent = report.summary.success_count,
        failed = report.summary.failure_count,
        unrecorded = report.summary.unrecorded_count,
        skipped = report.summary.skipped_count,
        dry_run = report.dry_run,
        "Dispatch run complete"
    );
    if report.summary.cancelled {
        tracing::warn!(skipped = report.summary.skipped_count, "Run was cancelled before all targets were notified");
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args
        .apply(DispatchConfig::from_env().context("Invalid dispatch configuration")?)
        .context("Invalid dispatch arguments")?;
    tracing::info!(
        campaign = %config.campaign_name,
        threshold_days = config.stale_threshold_days,
        concurrency = config.concurrency,
        dry_run = args.dry_run,
        "lockwatch-dispatch starting..."
    );

    let db_config = DatabaseConfig::from_env().context("Database configuration missing")?;
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;

    let runner = build_runner(config, db.clone()).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling dispatch");
            on_signal.cancel();
        }
    });

    let result = runner.run(args.dry_run, &cancel).await;
    db.close().await;

    match result {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            tracing::warn!("Dispatch cancelled during scan; nothing was sent");
            Ok(())
        }
        Err(e) => Err(e).context("Scan failed"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockwatch_worker=info,lockwatch_core=info,lockwatch_dispatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
