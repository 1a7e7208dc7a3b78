//! League service integration.
//!
//! Defines the `LeagueApi` trait the engine depends on and provides the
//! Kickbase HTTP implementation. Credentials live inside the implementor.

pub mod kickbase;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{
    AchievementReward, LeagueActivities, ParticipantInfo, ParticipantPerformance, ParticipantRef,
    RankingEntry,
};

/// Abstraction over the league service.
///
/// Every call is independent; the engine decides which failures are fatal
/// and which only skip one item.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueApi: Send + Sync {
    /// Trades, login bonuses and achievement bonuses since `since`.
    async fn fetch_league_activities(
        &self,
        league_id: &str,
        since: DateTime<Utc>,
    ) -> Result<LeagueActivities>;

    /// How often an achievement was earned and its per-completion reward.
    async fn fetch_achievement_reward(
        &self,
        league_id: &str,
        achievement_id: &str,
    ) -> Result<AchievementReward>;

    /// All managers in the league.
    async fn fetch_participants(&self, league_id: &str) -> Result<Vec<ParticipantRef>>;

    /// Squad information (team value) for one manager.
    async fn fetch_participant_info(
        &self,
        league_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantInfo>;

    /// Season performance for one manager.
    async fn fetch_participant_performance(
        &self,
        league_id: &str,
        participant_id: &str,
        name: &str,
    ) -> Result<ParticipantPerformance>;

    /// League table as (name, total points).
    async fn fetch_league_ranking(&self, league_id: &str) -> Result<Vec<RankingEntry>>;

    /// Authoritative budget of the logged-in manager.
    async fn fetch_self_budget(&self, league_id: &str) -> Result<Decimal>;

    /// Display name of the logged-in manager.
    async fn fetch_self_identity(&self) -> Result<String>;
}
