//! Ledger reconciler. Turns trades, bonuses and performance into budgets.
//!
//! Pure and synchronous: every input is passed in, nothing is fetched.
//! `engine::run` gathers the inputs from the league service.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::engine::bonus::login_bonus_total;
use crate::engine::estimator::estimate_share;
use crate::engine::ledger::{net_flows, parse_ledger, participants};
use crate::error::BudgetError;
use crate::types::{
    BonusEvent, BudgetTable, LedgerRow, ParticipantBudget, PerformanceRecord, RankingEntry,
};

/// Everything one reconciliation needs.
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput<'a> {
    pub ledger: &'a [LedgerRow],
    pub login_bonus_events: &'a [BonusEvent],
    /// Achievement pool measured for the self participant.
    pub achievement_pool: Decimal,
    pub performance: &'a [PerformanceRecord],
    pub ranking: &'a [RankingEntry],
    pub starting_budget: Decimal,
    /// The logged-in manager, if known.
    pub self_participant: Option<&'a str>,
    /// Authoritative budget for `self_participant`, if it could be fetched.
    pub self_budget: Option<Decimal>,
}

/// Working row before metrics are derived.
#[derive(Debug, Clone)]
struct Entry {
    participant: String,
    budget: Decimal,
    team_value: Option<Decimal>,
}

pub struct LedgerReconciler;

impl LedgerReconciler {
    /// Reconcile all inputs into a budget table sorted by available budget
    /// (descending, ties in participant order).
    ///
    /// Only an unresolvable ledger schema is an error.
    pub fn reconcile(input: &ReconcileInput<'_>) -> Result<BudgetTable, BudgetError> {
        let records = parse_ledger(input.ledger)?;

        // Participant universe: ledger first, then performance entrants.
        let mut entries: Vec<Entry> = participants(&records)
            .into_iter()
            .map(|participant| Entry {
                participant,
                budget: input.starting_budget,
                team_value: None,
            })
            .collect();
        let mut index: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.participant.clone(), i))
            .collect();

        for record in input.performance {
            if !index.contains_key(&record.participant) {
                index.insert(record.participant.clone(), entries.len());
                entries.push(Entry {
                    participant: record.participant.clone(),
                    budget: input.starting_budget,
                    team_value: None,
                });
            }
        }

        // Trades
        let flows = net_flows(&records);
        for entry in entries.iter_mut() {
            if let Some(flow) = flows.get(&entry.participant) {
                entry.budget += *flow;
            }
        }

        // Login bonus, flat for everyone
        let login_bonus = login_bonus_total(input.login_bonus_events);
        for entry in entries.iter_mut() {
            entry.budget += login_bonus;
        }

        // Point bonus and team value
        for record in input.performance {
            if let Some(&i) = index.get(&record.participant) {
                let entry = &mut entries[i];
                entry.budget += record.point_bonus();
                entry.team_value = record.team_value;
            }
        }

        // Achievement bonus, estimated relative to self
        match input.self_participant {
            Some(anchor) => {
                for entry in entries.iter_mut() {
                    let share = estimate_share(
                        input.ranking,
                        anchor,
                        input.achievement_pool,
                        &entry.participant,
                    );
                    entry.budget += share;
                }
            }
            None => {
                if !input.achievement_pool.is_zero() {
                    warn!(
                        pool = %input.achievement_pool,
                        "Self participant unknown, achievement bonus not allocated"
                    );
                }
            }
        }

        // Authoritative self budget replaces everything computed above
        Self::apply_self_budget(&mut entries, &index, input);

        let mut rows: Vec<ParticipantBudget> = entries
            .into_iter()
            .map(|e| ParticipantBudget::new(e.participant, e.budget, e.team_value))
            .collect();
        // Stable sort keeps participant order for ties.
        rows.sort_by(|a, b| b.available_budget.cmp(&a.available_budget));

        info!(
            participants = rows.len(),
            trades = records.len(),
            login_bonus = %login_bonus,
            achievement_pool = %input.achievement_pool,
            "Budgets reconciled"
        );

        Ok(BudgetTable { rows })
    }

    fn apply_self_budget(
        entries: &mut [Entry],
        index: &HashMap<String, usize>,
        input: &ReconcileInput<'_>,
    ) {
        let Some(self_participant) = input.self_participant else {
            return;
        };
        let Some(self_budget) = input.self_budget else {
            warn!(
                participant = self_participant,
                "Authoritative budget unavailable, keeping computed value"
            );
            return;
        };

        match index.get(self_participant) {
            Some(&i) => {
                debug!(
                    participant = self_participant,
                    computed = %entries[i].budget,
                    authoritative = %self_budget,
                    "Self budget synced"
                );
                entries[i].budget = self_budget;
            }
            None => debug!(
                participant = self_participant,
                "Self participant not in budget table, nothing to sync"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
