//! End-to-end reconciliation through `BudgetRun` with a mock league.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use league_budget::engine::run::{BudgetRun, RunParams};
use league_budget::error::BudgetError;
use league_budget::storage::{self, BudgetSnapshot};

use crate::mock_league::MockLeague;

fn params() -> RunParams {
    RunParams {
        league_id: "L1".into(),
        since: Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        starting_budget: dec!(50000000),
    }
}

/// Three managers, alice logged in.
///
/// alice buys from bob for 2M, carol buys from the market for 1M. Everyone
/// gets a 100k login bonus; alice earned achievement 7 twice at 100k.
fn season() -> MockLeague {
    MockLeague::new("alice")
        .manager("1", "alice", dec!(400), dec!(100000000))
        .manager("2", "bob", dec!(200), dec!(80000000))
        .manager("3", "carol", dec!(100), dec!(60000000))
        .trade(Some("alice"), Some("bob"), 2000000)
        .trade(Some("carol"), None, 1000000)
        .login_bonus(dec!(100000))
        .achievement("7", dec!(2), dec!(100000))
}

fn budget_of(table: &league_budget::types::BudgetTable, name: &str) -> Decimal {
    table.get(name).map(|r| r.budget).unwrap()
}

#[tokio::test]
async fn test_full_season_without_self_budget() {
    let league = season();
    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    // start - trades + login + points * 1000 + achievement share
    assert_eq!(budget_of(&report.table, "alice"), dec!(48700000));
    assert_eq!(budget_of(&report.table, "bob"), dec!(52400000));
    assert_eq!(budget_of(&report.table, "carol"), dec!(49250000));

    let order: Vec<&str> = report
        .table
        .rows
        .iter()
        .map(|r| r.participant.as_str())
        .collect();
    assert_eq!(order, vec!["alice", "bob", "carol"]);

    let alice = report.table.get("alice").unwrap();
    assert_eq!(alice.team_value, Some(dec!(100000000)));
    assert_eq!(alice.max_negative, dec!(-49071000));
    assert_eq!(alice.available_budget, dec!(97771000));

    assert_eq!(report.self_participant.as_deref(), Some("alice"));
    assert!(!report.self_budget_synced);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].operation, "self_budget");
}

#[tokio::test]
async fn test_self_budget_overrides_and_resorts() {
    let league = season().self_budget(dec!(45000000));
    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    assert!(report.self_budget_synced);
    assert!(report.failures.is_empty());
    assert_eq!(budget_of(&report.table, "alice"), dec!(45000000));
    assert_eq!(
        report.table.get("alice").unwrap().available_budget,
        dec!(92850000)
    );
    // Others are untouched by the override.
    assert_eq!(budget_of(&report.table, "bob"), dec!(52400000));

    assert_eq!(report.table.rows[0].participant, "bob");
    assert_eq!(report.table.rows[1].participant, "alice");
}

#[tokio::test]
async fn test_failing_manager_is_degraded_not_fatal() {
    let league = season();
    league.fail("participant_info", "carol");
    league.fail("participant_performance", "carol");

    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    // carol stays in the table through the ledger, without points or value.
    let carol = report.table.get("carol").unwrap();
    assert_eq!(carol.team_value, None);
    assert_eq!(carol.budget, dec!(49150000));
    assert_eq!(carol.available_budget, dec!(65369500));

    let skipped: Vec<(&str, &str)> = report
        .failures
        .iter()
        .map(|f| (f.operation.as_str(), f.item.as_str()))
        .collect();
    assert!(skipped.contains(&("participant_info", "carol")));
    assert!(skipped.contains(&("participant_performance", "carol")));
    assert_eq!(budget_of(&report.table, "bob"), dec!(52400000));
}

#[tokio::test]
async fn test_unresolvable_achievement_is_skipped() {
    let mut league = season();
    league.achievement_events.push(Some("99".into()));
    league.achievement_events.push(None);

    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    // Only achievement 7 contributes to the pool.
    assert_eq!(budget_of(&report.table, "alice"), dec!(48700000));
    assert!(report
        .failures
        .iter()
        .any(|f| f.operation == "achievement_reward" && f.item == "99"));
}

#[tokio::test]
async fn test_ranking_failure_drops_achievement_estimates() {
    let league = season();
    league.fail("league_ranking", "L1");

    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    // Without a ranking nobody gets an achievement share, not even self.
    assert_eq!(budget_of(&report.table, "alice"), dec!(48500000));
    assert_eq!(budget_of(&report.table, "bob"), dec!(52300000));
}

#[tokio::test]
async fn test_unknown_self_skips_achievement_pool() {
    let league = season().self_budget(dec!(1));
    league.fail("self_identity", "self");

    let report = BudgetRun::new(&league, params()).execute().await.unwrap();

    assert_eq!(report.self_participant, None);
    assert!(!report.self_budget_synced);
    assert_eq!(budget_of(&report.table, "alice"), dec!(48500000));
}

#[tokio::test]
async fn test_activities_failure_is_fatal() {
    let league = season();
    league.fail("activities", "L1");

    let err = BudgetRun::new(&league, params()).execute().await.unwrap_err();
    assert!(matches!(err, BudgetError::Activities(_)));
    assert_eq!(league.calls(), vec!["activities"]);
}

#[tokio::test]
async fn test_participants_failure_is_fatal() {
    let league = season();
    league.fail("participants", "L1");

    let err = BudgetRun::new(&league, params()).execute().await.unwrap_err();
    assert!(matches!(err, BudgetError::Participants(_)));
}

#[tokio::test]
async fn test_missing_price_field_aborts_run() {
    let mut league = season();
    for trade in league.trades.iter_mut() {
        trade.remove("trp");
    }

    let err = BudgetRun::new(&league, params()).execute().await.unwrap_err();
    match err {
        BudgetError::SchemaResolution { field, observed } => {
            assert_eq!(field, "price");
            assert!(observed.contains(&"byr".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_league_round_trips_through_snapshot() {
    let league = MockLeague::new("alice");
    let report = tokio_test::block_on(BudgetRun::new(&league, params()).execute()).unwrap();
    assert!(report.table.is_empty());

    let path = std::env::temp_dir().join(format!("league_budget_it_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_str().unwrap().to_string();

    let snapshot = BudgetSnapshot::new("L1", report.table);
    storage::save_snapshot(&snapshot, Some(&path)).unwrap();
    let loaded = storage::load_snapshot(Some(&path)).unwrap().unwrap();
    assert_eq!(loaded.league_id, "L1");
    assert!(loaded.table.is_empty());
    storage::delete_snapshot(Some(&path)).unwrap();
}
