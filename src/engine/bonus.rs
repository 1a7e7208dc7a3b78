//! Bonus pool aggregation.
//!
//! Login bonuses are a flat amount paid to every manager. Achievement
//! bonuses are measured for the logged-in manager only, by resolving each
//! achievement event against the reward table.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{FetchFailure, FetchOutcome};
use crate::league::LeagueApi;
use crate::types::BonusEvent;

/// Sum of all login bonus amounts.
pub fn login_bonus_total(events: &[BonusEvent]) -> Decimal {
    events.iter().map(BonusEvent::amount).sum()
}

/// Aggregated achievement pool plus the lookups that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementPool {
    pub total: Decimal,
    /// Events that resolved and contributed to `total`.
    pub resolved: usize,
    /// Events without an achievement reference.
    pub unreferenced: usize,
    pub failures: Vec<FetchFailure>,
}

/// Resolve every achievement event into one pool.
///
/// Events without a reference are skipped; a failed lookup is logged and
/// excluded without aborting the rest.
pub async fn collect_achievement_pool(
    api: &dyn LeagueApi,
    league_id: &str,
    events: &[BonusEvent],
) -> AchievementPool {
    let mut pool = AchievementPool::default();

    for event in events {
        let Some(achievement_id) = event.achievement_id() else {
            debug!(payload = ?event.payload, "Achievement event without reference, skipping");
            pool.unreferenced += 1;
            continue;
        };

        let result = api
            .fetch_achievement_reward(league_id, &achievement_id)
            .await;
        match FetchOutcome::from_result("achievement_reward", &achievement_id, result) {
            FetchOutcome::Fetched(reward) => {
                pool.total += reward.total();
                pool.resolved += 1;
            }
            FetchOutcome::Skipped(failure) => pool.failures.push(failure),
        }
    }

    info!(
        total = %pool.total,
        resolved = pool.resolved,
        unreferenced = pool.unreferenced,
        failed = pool.failures.len(),
        "Achievement pool collected"
    );

    pool
}
