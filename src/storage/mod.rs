//! Persistence layer.
//!
//! Saves and loads reconciled budget tables to/from a JSON file so the
//! last run can be inspected or diffed without hitting the API again.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::types::BudgetTable;

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "league_budgets.json";

/// A reconciled table with the context it was produced in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub run_id: String,
    pub league_id: String,
    pub generated_at: DateTime<Utc>,
    pub table: BudgetTable,
}

impl BudgetSnapshot {
    pub fn new(league_id: &str, table: BudgetTable) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            league_id: league_id.to_string(),
            generated_at: Utc::now(),
            table,
        }
    }
}

/// Save a snapshot to a JSON file.
pub fn save_snapshot(snapshot: &BudgetSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise budget snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, rows = snapshot.table.len(), "Snapshot saved");
    Ok(())
}

/// Load a snapshot from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_snapshot(path: Option<&str>) -> Result<Option<BudgetSnapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: BudgetSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        league_id = %snapshot.league_id,
        rows = snapshot.table.len(),
        generated_at = %snapshot.generated_at,
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file.
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
