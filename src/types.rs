//! Shared types for the league budget engine.
//!
//! These types form the data model used across all modules. The league
//! client produces them, the engine consumes them, and storage persists
//! the final `ParticipantBudget` rows.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fraction of (team value + budget) a manager may go into debt.
pub const MAX_NEGATIVE_RATIO: Decimal = dec!(-0.33);

/// Budget credited per performance point.
pub const POINT_BONUS_PER_POINT: Decimal = dec!(1000);

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One raw ledger row as delivered by the league service.
///
/// Field names are not stable across API revisions, so rows are kept
/// untyped until `LedgerSchema` resolves which keys hold buyer, seller
/// and price.
pub type LedgerRow = Map<String, Value>;

/// A single trade, after field resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Absent when the player came from the neutral pool.
    pub buyer_id: Option<String>,
    /// Absent when the player was released to the neutral pool.
    pub seller_id: Option<String>,
    pub price: Decimal,
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <- {} @ {}",
            self.buyer_id.as_deref().unwrap_or("-"),
            self.seller_id.as_deref().unwrap_or("-"),
            self.price,
        )
    }
}

// ---------------------------------------------------------------------------
// Bonus events
// ---------------------------------------------------------------------------

/// A bonus entry from the activity feed. The payload is the raw `data`
/// object; login bonuses carry `bn`, achievement bonuses carry `t`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusEvent {
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl BonusEvent {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    /// Login bonus amount (`bn`). Missing or non-numeric reads as zero.
    pub fn amount(&self) -> Decimal {
        self.payload
            .get("bn")
            .and_then(value_to_decimal)
            .unwrap_or(Decimal::ZERO)
    }

    /// Achievement reference (`t`), if present.
    pub fn achievement_id(&self) -> Option<String> {
        self.payload.get("t").and_then(value_to_identifier)
    }
}

/// Everything the activity feed yields for one league since a date.
#[derive(Debug, Clone, Default)]
pub struct LeagueActivities {
    pub transactions: Vec<LedgerRow>,
    pub login_bonus_events: Vec<BonusEvent>,
    pub achievement_bonus_events: Vec<BonusEvent>,
}

/// How often an achievement was earned and what each completion pays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AchievementReward {
    pub count: Decimal,
    pub unit_reward: Decimal,
}

impl AchievementReward {
    pub fn total(&self) -> Decimal {
        self.count * self.unit_reward
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// A league member as listed by the league service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub name: String,
    pub id: String,
}

/// Squad information for one manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub team_value: Option<Decimal>,
}

/// Season performance for one manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantPerformance {
    pub name: String,
    pub total_points: Option<Decimal>,
}

/// One row of the league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub total_points: Decimal,
}

impl RankingEntry {
    pub fn new(name: impl Into<String>, total_points: Decimal) -> Self {
        Self {
            name: name.into(),
            total_points,
        }
    }
}

/// Performance points and squad value joined onto the budget table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub participant: String,
    pub total_points: Option<Decimal>,
    pub team_value: Option<Decimal>,
}

impl PerformanceRecord {
    /// Budget credit earned from points; missing points earn nothing.
    pub fn point_bonus(&self) -> Decimal {
        self.total_points.unwrap_or(Decimal::ZERO) * POINT_BONUS_PER_POINT
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Final reconciled budget for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantBudget {
    pub participant: String,
    pub budget: Decimal,
    /// Left as `None` when no squad value was available; only the derived
    /// metrics treat it as zero.
    pub team_value: Option<Decimal>,
    pub max_negative: Decimal,
    pub available_budget: Decimal,
}

impl ParticipantBudget {
    /// Build a row and derive its risk metrics.
    pub fn new(participant: impl Into<String>, budget: Decimal, team_value: Option<Decimal>) -> Self {
        let (max_negative, available_budget) = derive_metrics(budget, team_value);
        Self {
            participant: participant.into(),
            budget,
            team_value,
            max_negative,
            available_budget,
        }
    }
}

impl fmt::Display for ParticipantBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let team_value = self
            .team_value
            .map(|v| v.round_dp(0).to_string())
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "{:<20} {:>14} {:>14} {:>14} {:>14}",
            self.participant,
            self.budget.round_dp(0),
            team_value,
            self.max_negative.round_dp(0),
            self.available_budget.round_dp(0),
        )
    }
}

/// `(max_negative, available_budget)` for a budget and optional squad value.
pub fn derive_metrics(budget: Decimal, team_value: Option<Decimal>) -> (Decimal, Decimal) {
    let max_negative = (team_value.unwrap_or(Decimal::ZERO) + budget) * MAX_NEGATIVE_RATIO;
    let available_budget = -(max_negative - budget);
    (max_negative, available_budget)
}

/// Ordered result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetTable {
    pub rows: Vec<ParticipantBudget>,
}

impl BudgetTable {
    pub fn get(&self, participant: &str) -> Option<&ParticipantBudget> {
        self.rows.iter().find(|r| r.participant == participant)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for BudgetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20} {:>14} {:>14} {:>14} {:>14}",
            "Manager", "Budget", "Team Value", "Max Negative", "Available",
        )?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Read a JSON scalar as a decimal. Integers stay exact; floats and
/// numeric strings are converted.
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON scalar as an identifier. `null` and empty strings are
/// treated as missing.
pub fn value_to_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
