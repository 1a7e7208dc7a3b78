//! One reconciliation run against the league service.
//!
//! Performs the collaborator calls in a fixed order, degrades per-item
//! failures to skips, and hands the gathered inputs to the reconciler.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::engine::bonus::collect_achievement_pool;
use crate::engine::performance::PerformanceAggregator;
use crate::engine::reconciler::{LedgerReconciler, ReconcileInput};
use crate::error::{BudgetError, FetchFailure, FetchOutcome};
use crate::league::LeagueApi;
use crate::types::BudgetTable;

/// Parameters of a run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub league_id: String,
    /// Only activities on or after this instant are reconciled.
    pub since: DateTime<Utc>,
    pub starting_budget: Decimal,
}

/// Output of a run: the table plus every item that had to be skipped.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: BudgetTable,
    pub self_participant: Option<String>,
    pub self_budget_synced: bool,
    pub failures: Vec<FetchFailure>,
}

pub struct BudgetRun<'a> {
    api: &'a dyn LeagueApi,
    params: RunParams,
}

impl<'a> BudgetRun<'a> {
    pub fn new(api: &'a dyn LeagueApi, params: RunParams) -> Self {
        Self { api, params }
    }

    /// Fetch all inputs and reconcile.
    ///
    /// Fails only if the activity feed or participant list cannot be
    /// fetched, or the ledger schema cannot be resolved.
    pub async fn execute(&self) -> Result<RunReport, BudgetError> {
        let league_id = self.params.league_id.as_str();
        info!(league_id, since = %self.params.since, "Starting budget reconciliation");

        let activities = self
            .api
            .fetch_league_activities(league_id, self.params.since)
            .await
            .map_err(|e| BudgetError::Activities(format!("{e:#}")))?;
        info!(
            trades = activities.transactions.len(),
            login_bonuses = activities.login_bonus_events.len(),
            achievements = activities.achievement_bonus_events.len(),
            "Activities fetched"
        );

        let mut failures = Vec::new();

        let pool =
            collect_achievement_pool(self.api, league_id, &activities.achievement_bonus_events)
                .await;
        failures.extend(pool.failures);

        let participants = self
            .api
            .fetch_participants(league_id)
            .await
            .map_err(|e| BudgetError::Participants(format!("{e:#}")))?;

        let performance = PerformanceAggregator::new(self.api, league_id)
            .collect(&participants)
            .await;
        failures.extend(performance.failures);

        let ranking = match FetchOutcome::from_result(
            "league_ranking",
            league_id,
            self.api.fetch_league_ranking(league_id).await,
        ) {
            FetchOutcome::Fetched(ranking) => ranking,
            FetchOutcome::Skipped(failure) => {
                failures.push(failure);
                Vec::new()
            }
        };

        let self_participant = match FetchOutcome::from_result(
            "self_identity",
            "self",
            self.api.fetch_self_identity().await,
        ) {
            FetchOutcome::Fetched(name) => Some(name),
            FetchOutcome::Skipped(failure) => {
                failures.push(failure);
                None
            }
        };

        let self_budget = match FetchOutcome::from_result(
            "self_budget",
            league_id,
            self.api.fetch_self_budget(league_id).await,
        ) {
            FetchOutcome::Fetched(budget) => Some(budget),
            FetchOutcome::Skipped(failure) => {
                warn!("Could not sync own budget");
                failures.push(failure);
                None
            }
        };

        let input = ReconcileInput {
            ledger: &activities.transactions,
            login_bonus_events: &activities.login_bonus_events,
            achievement_pool: pool.total,
            performance: &performance.records,
            ranking: &ranking,
            starting_budget: self.params.starting_budget,
            self_participant: self_participant.as_deref(),
            self_budget,
        };
        let table = LedgerReconciler::reconcile(&input)?;

        let self_budget_synced = match (&self_participant, self_budget) {
            (Some(name), Some(_)) => table.get(name).is_some(),
            _ => false,
        };

        info!(
            participants = table.len(),
            skipped = failures.len(),
            self_budget_synced,
            "Reconciliation run complete"
        );

        Ok(RunReport {
            table,
            self_participant,
            self_budget_synced,
            failures,
        })
    }
}
