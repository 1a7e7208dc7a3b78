//! Per-manager performance and squad value.
//!
//! Fetches every manager's dashboard (team value) and season performance
//! (total points) concurrently, then merges them by manager in the order
//! the league listed them. Each manager's two calls fail independently.

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{FetchFailure, FetchOutcome};
use crate::league::LeagueApi;
use crate::types::{ParticipantInfo, ParticipantPerformance, ParticipantRef, PerformanceRecord};

/// Merged performance data plus the calls that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceReport {
    pub records: Vec<PerformanceRecord>,
    pub failures: Vec<FetchFailure>,
}

pub struct PerformanceAggregator<'a> {
    api: &'a dyn LeagueApi,
    league_id: &'a str,
}

impl<'a> PerformanceAggregator<'a> {
    pub fn new(api: &'a dyn LeagueApi, league_id: &'a str) -> Self {
        Self { api, league_id }
    }

    /// Fetch and merge performance for all `participants`.
    ///
    /// A manager for whom both calls failed is left out entirely; if only
    /// one call failed, the other field is still reported.
    pub async fn collect(&self, participants: &[ParticipantRef]) -> PerformanceReport {
        let fetches = participants.iter().map(|p| self.fetch_one(p));
        let outcomes = join_all(fetches).await;

        let mut report = PerformanceReport::default();
        for (participant, (info, performance)) in participants.iter().zip(outcomes) {
            report.failures.extend(info.failure().cloned());
            report.failures.extend(performance.failure().cloned());

            let info = info.fetched();
            let performance = performance.fetched();
            if info.is_none() && performance.is_none() {
                warn!(participant = %participant.name, "No performance data, skipping manager");
                continue;
            }

            report.records.push(PerformanceRecord {
                participant: participant.name.clone(),
                total_points: performance.and_then(|p| p.total_points),
                team_value: info.and_then(|i| i.team_value),
            });
        }

        info!(
            managers = participants.len(),
            records = report.records.len(),
            failed_calls = report.failures.len(),
            "Performance collected"
        );

        report
    }

    async fn fetch_one(
        &self,
        participant: &ParticipantRef,
    ) -> (FetchOutcome<ParticipantInfo>, FetchOutcome<ParticipantPerformance>) {
        let (info, performance) = tokio::join!(
            self.api.fetch_participant_info(self.league_id, &participant.id),
            self.api.fetch_participant_performance(
                self.league_id,
                &participant.id,
                &participant.name
            ),
        );

        (
            FetchOutcome::from_result("participant_info", &participant.name, info),
            FetchOutcome::from_result("participant_performance", &participant.name, performance),
        )
    }
}
