//! Achievement bonus estimation.
//!
//! Achievement completions are only observable for the logged-in manager
//! (the anchor). Everyone else's share of achievement rewards is estimated
//! relative to the anchor from the league ranking.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::RankingEntry;

/// Multiplier step per rank of difference for the rank-based policy.
const RANK_STEP: Decimal = dec!(0.1);

/// Estimation policy for other managers' achievement bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AchievementPolicy {
    /// Scale the anchor's pool by the points ratio target / anchor.
    #[default]
    ByPoints,
    /// Scale by `1 + 0.1 * (anchor_rank - target_rank)`. Unclamped; kept as
    /// an alternative and not used by the reconciler.
    ByRank,
}

impl AchievementPolicy {
    pub fn estimate(
        &self,
        ranking: &[RankingEntry],
        self_participant: &str,
        pool: Decimal,
        target: &str,
    ) -> Decimal {
        match self {
            AchievementPolicy::ByPoints => estimate_share(ranking, self_participant, pool, target),
            AchievementPolicy::ByRank => {
                estimate_share_by_rank(ranking, self_participant, pool, target)
            }
        }
    }
}

fn points_of(ranking: &[RankingEntry], name: &str) -> Option<Decimal> {
    ranking
        .iter()
        .find(|e| e.name == name)
        .map(|e| e.total_points)
}

fn rank_of(ranking: &[RankingEntry], name: &str) -> Option<usize> {
    ranking.iter().position(|e| e.name == name).map(|i| i + 1)
}

/// Estimate `target`'s achievement bonus from the anchor's measured pool,
/// scaled by the ratio of their total points.
///
/// The anchor always gets the pool itself. An unranked target gets
/// nothing; an unranked anchor counts as zero points, which leaves the
/// scale at 1.
pub fn estimate_share(
    ranking: &[RankingEntry],
    self_participant: &str,
    pool: Decimal,
    target: &str,
) -> Decimal {
    if ranking.is_empty() {
        return Decimal::ZERO;
    }

    let self_points = points_of(ranking, self_participant).unwrap_or(Decimal::ZERO);

    if target == self_participant {
        return pool;
    }

    let Some(target_points) = points_of(ranking, target) else {
        return Decimal::ZERO;
    };

    let scale = if self_points.is_zero() {
        Decimal::ONE
    } else {
        target_points / self_points
    };

    debug!(participant = target, %target_points, %self_points, %scale, "Achievement share by points");
    pool * scale
}

/// Rank-based estimate: each rank above the anchor adds 10% of the pool,
/// each rank below removes 10%. Large gaps can push the result negative.
pub fn estimate_share_by_rank(
    ranking: &[RankingEntry],
    self_participant: &str,
    pool: Decimal,
    target: &str,
) -> Decimal {
    if ranking.is_empty() {
        return Decimal::ZERO;
    }

    let Some(self_rank) = rank_of(ranking, self_participant) else {
        return Decimal::ZERO;
    };

    if target == self_participant {
        return pool;
    }

    let Some(target_rank) = rank_of(ranking, target) else {
        return Decimal::ZERO;
    };

    let rank_diff = Decimal::from(self_rank as i64 - target_rank as i64);
    let scale = Decimal::ONE + rank_diff * RANK_STEP;
    pool * scale
}
