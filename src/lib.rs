//! League budget reconciliation.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod engine;
pub mod error;
pub mod league;
pub mod storage;
pub mod types;
