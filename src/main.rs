//! League budget reconciliation entry point.
//!
//! Loads configuration, initialises structured logging, logs in to the
//! league service, reconciles every manager's budget once, prints the
//! table and saves a JSON snapshot.

use anyhow::{Context, Result};
use tracing::{info, warn};

use league_budget::config;
use league_budget::engine::run::{BudgetRun, RunParams, RunReport};
use league_budget::league::kickbase::KickbaseClient;
use league_budget::storage::{self, BudgetSnapshot};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("LEAGUE_BUDGET_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        league_id = %cfg.league.id,
        start_date = %cfg.league.start_date,
        starting_budget = %cfg.league.starting_budget,
        "league-budget starting up"
    );

    let (email, password) = cfg.credentials()?;
    let client = KickbaseClient::login(&cfg.api.base_url, &email, &password, cfg.api.timeout_secs)
        .await?
        .with_activity_limit(cfg.api.activity_limit);

    let params = RunParams {
        league_id: cfg.league.id.clone(),
        since: cfg.league.since(),
        starting_budget: cfg.league.starting_budget,
    };

    let report = BudgetRun::new(&client, params)
        .execute()
        .await
        .context("Budget reconciliation failed")?;

    log_run_report(&report);
    println!("{}", report.table);

    if !cfg.output.snapshot_path.is_empty() {
        let snapshot = BudgetSnapshot::new(&cfg.league.id, report.table);
        storage::save_snapshot(&snapshot, Some(&cfg.output.snapshot_path))?;
        info!(path = %cfg.output.snapshot_path, run_id = %snapshot.run_id, "Snapshot written");
    }

    Ok(())
}

/// Log a summary of the run, including every skipped item.
fn log_run_report(report: &RunReport) {
    for failure in &report.failures {
        warn!(
            operation = %failure.operation,
            item = %failure.item,
            error = %failure.message,
            "Skipped during run"
        );
    }
    info!(
        managers = report.table.len(),
        self_participant = ?report.self_participant,
        self_budget_synced = report.self_budget_synced,
        skipped = report.failures.len(),
        "Run complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("league_budget=info"));

    let json_logging = std::env::var("LEAGUE_BUDGET_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
