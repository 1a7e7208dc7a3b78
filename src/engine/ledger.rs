//! Ledger field resolution and trade folding.
//!
//! The activity feed has renamed its trade fields between API revisions,
//! so each logical field is probed under a fixed list of aliases once per
//! run, before any row is read.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::BudgetError;
use crate::types::{value_to_decimal, value_to_identifier, LedgerRow, TransactionRecord};

/// Aliases for the buyer field, highest priority first.
pub const BUYER_ALIASES: &[&str] = &["byr", "usr"];
/// Aliases for the seller field. The seller may be missing entirely.
pub const SELLER_ALIASES: &[&str] = &["slr"];
/// Aliases for the transfer price field.
pub const PRICE_ALIASES: &[&str] = &["trp"];

/// Resolved field names for one ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSchema {
    pub buyer: String,
    pub seller: Option<String>,
    pub price: String,
}

impl LedgerSchema {
    /// Resolve field names against every key seen across `rows`.
    ///
    /// Returns `Ok(None)` for an empty ledger.
    pub fn resolve(rows: &[LedgerRow]) -> Result<Option<Self>, BudgetError> {
        if rows.is_empty() {
            return Ok(None);
        }

        let observed: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        debug!(fields = ?observed, rows = rows.len(), "Ledger fields observed");

        let probe = |aliases: &[&str]| {
            aliases
                .iter()
                .find(|alias| observed.contains(**alias))
                .map(|alias| alias.to_string())
        };
        let missing = |field: &'static str| BudgetError::SchemaResolution {
            field,
            observed: observed.iter().map(|s| s.to_string()).collect(),
        };

        let buyer = probe(BUYER_ALIASES).ok_or_else(|| missing("buyer"))?;
        let price = probe(PRICE_ALIASES).ok_or_else(|| missing("price"))?;
        let seller = probe(SELLER_ALIASES);

        Ok(Some(Self {
            buyer,
            seller,
            price,
        }))
    }

    /// Read one row through the resolved schema. A missing or unreadable
    /// price counts as zero.
    pub fn record(&self, row: &LedgerRow) -> TransactionRecord {
        let buyer_id = row.get(&self.buyer).and_then(value_to_identifier);
        let seller_id = self
            .seller
            .as_ref()
            .and_then(|key| row.get(key))
            .and_then(value_to_identifier);
        let price = row
            .get(&self.price)
            .and_then(value_to_decimal)
            .unwrap_or(Decimal::ZERO);

        TransactionRecord {
            buyer_id,
            seller_id,
            price,
        }
    }
}

/// Parse every row, failing fast if the schema cannot be resolved.
pub fn parse_ledger(rows: &[LedgerRow]) -> Result<Vec<TransactionRecord>, BudgetError> {
    match LedgerSchema::resolve(rows)? {
        Some(schema) => Ok(rows.iter().map(|row| schema.record(row)).collect()),
        None => Ok(Vec::new()),
    }
}

/// Participants in first-seen order (buyer before seller within a row).
pub fn participants(records: &[TransactionRecord]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for record in records {
        for id in [&record.buyer_id, &record.seller_id].into_iter().flatten() {
            if seen.insert(id.as_str()) {
                ordered.push(id.clone());
            }
        }
    }
    ordered
}

/// Net trade flow per participant: sellers are credited, buyers debited.
pub fn net_flows(records: &[TransactionRecord]) -> HashMap<String, Decimal> {
    records.iter().fold(HashMap::new(), |mut flows, record| {
        if let Some(buyer) = &record.buyer_id {
            *flows.entry(buyer.clone()).or_insert(Decimal::ZERO) -= record.price;
        }
        if let Some(seller) = &record.seller_id {
            *flows.entry(seller.clone()).or_insert(Decimal::ZERO) += record.price;
        }
        flows
    })
}
