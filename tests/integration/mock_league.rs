//! Mock league for integration testing.
//!
//! Provides a deterministic `LeagueApi` implementation with fully
//! controllable activities, managers, ranking and self budget. Everything
//! stays in memory.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use league_budget::league::LeagueApi;
use league_budget::types::*;

/// A manager as the mock league knows them.
#[derive(Debug, Clone)]
pub struct MockManager {
    pub id: String,
    pub name: String,
    pub points: Decimal,
    pub team_value: Decimal,
}

/// An in-memory league. Every collaborator call is served from these
/// fields; failures can be injected per operation and item.
pub struct MockLeague {
    pub self_name: String,
    pub self_budget: Option<Decimal>,
    pub managers: Vec<MockManager>,
    pub trades: Vec<Map<String, Value>>,
    pub login_bonuses: Vec<Decimal>,
    /// Achievement id → (count, unit reward).
    pub achievements: HashMap<String, (Decimal, Decimal)>,
    /// Achievement references in the activity feed, in order.
    pub achievement_events: Vec<Option<String>>,
    /// `(operation, item)` pairs that fail.
    failing: Arc<Mutex<HashSet<(String, String)>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLeague {
    pub fn new(self_name: &str) -> Self {
        Self {
            self_name: self_name.to_string(),
            self_budget: None,
            managers: Vec::new(),
            trades: Vec::new(),
            login_bonuses: Vec::new(),
            achievements: HashMap::new(),
            achievement_events: Vec::new(),
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn manager(mut self, id: &str, name: &str, points: Decimal, team_value: Decimal) -> Self {
        self.managers.push(MockManager {
            id: id.to_string(),
            name: name.to_string(),
            points,
            team_value,
        });
        self
    }

    pub fn trade(mut self, buyer: Option<&str>, seller: Option<&str>, price: i64) -> Self {
        self.trades
            .push(json!({"byr": buyer, "slr": seller, "trp": price}).as_object().cloned().unwrap());
        self
    }

    pub fn login_bonus(mut self, amount: Decimal) -> Self {
        self.login_bonuses.push(amount);
        self
    }

    pub fn achievement(mut self, id: &str, count: Decimal, unit: Decimal) -> Self {
        self.achievements.insert(id.to_string(), (count, unit));
        self.achievement_events.push(Some(id.to_string()));
        self
    }

    pub fn self_budget(mut self, budget: Decimal) -> Self {
        self.self_budget = Some(budget);
        self
    }

    /// Make `operation` fail for `item` on every subsequent call.
    pub fn fail(&self, operation: &str, item: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert((operation.to_string(), item.to_string()));
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &str, item: &str) -> Result<()> {
        self.calls.lock().unwrap().push(operation.to_string());
        if self
            .failing
            .lock()
            .unwrap()
            .contains(&(operation.to_string(), item.to_string()))
        {
            return Err(anyhow!("mock failure: {operation} [{item}]"));
        }
        Ok(())
    }

    fn find(&self, id: &str) -> Result<&MockManager> {
        self.managers
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| anyhow!("unknown manager {id}"))
    }
}

#[async_trait]
impl LeagueApi for MockLeague {
    async fn fetch_league_activities(
        &self,
        league_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<LeagueActivities> {
        self.record("activities", league_id)?;
        Ok(LeagueActivities {
            transactions: self.trades.clone(),
            login_bonus_events: self
                .login_bonuses
                .iter()
                .map(|bn| BonusEvent::new(json!({ "bn": bn.to_string() }).as_object().cloned().unwrap()))
                .collect(),
            achievement_bonus_events: self
                .achievement_events
                .iter()
                .map(|t| BonusEvent::new(json!({ "t": t }).as_object().cloned().unwrap()))
                .collect(),
        })
    }

    async fn fetch_achievement_reward(
        &self,
        _league_id: &str,
        achievement_id: &str,
    ) -> Result<AchievementReward> {
        self.record("achievement_reward", achievement_id)?;
        let (count, unit_reward) = self
            .achievements
            .get(achievement_id)
            .copied()
            .ok_or_else(|| anyhow!("unknown achievement {achievement_id}"))?;
        Ok(AchievementReward { count, unit_reward })
    }

    async fn fetch_participants(&self, league_id: &str) -> Result<Vec<ParticipantRef>> {
        self.record("participants", league_id)?;
        Ok(self
            .managers
            .iter()
            .map(|m| ParticipantRef {
                name: m.name.clone(),
                id: m.id.clone(),
            })
            .collect())
    }

    async fn fetch_participant_info(
        &self,
        _league_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantInfo> {
        let manager = self.find(participant_id)?;
        self.record("participant_info", &manager.name)?;
        Ok(ParticipantInfo {
            team_value: Some(manager.team_value),
        })
    }

    async fn fetch_participant_performance(
        &self,
        _league_id: &str,
        participant_id: &str,
        name: &str,
    ) -> Result<ParticipantPerformance> {
        let manager = self.find(participant_id)?;
        self.record("participant_performance", name)?;
        Ok(ParticipantPerformance {
            name: name.to_string(),
            total_points: Some(manager.points),
        })
    }

    async fn fetch_league_ranking(&self, league_id: &str) -> Result<Vec<RankingEntry>> {
        self.record("league_ranking", league_id)?;
        Ok(self
            .managers
            .iter()
            .map(|m| RankingEntry::new(m.name.clone(), m.points))
            .collect())
    }

    async fn fetch_self_budget(&self, league_id: &str) -> Result<Decimal> {
        self.record("self_budget", league_id)?;
        self.self_budget
            .ok_or_else(|| anyhow!("budget endpoint unavailable"))
    }

    async fn fetch_self_identity(&self) -> Result<String> {
        self.record("self_identity", "self")?;
        Ok(self.self_name.clone())
    }
}
