//! Integration tests: full reconciliation runs against an in-memory league.

mod mock_league;
mod reconciliation;
