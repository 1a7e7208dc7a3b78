//! Budget engine: ledger folding, bonus pools, estimation, reconciliation.

pub mod bonus;
pub mod estimator;
pub mod ledger;
pub mod performance;
pub mod reconciler;
pub mod run;
