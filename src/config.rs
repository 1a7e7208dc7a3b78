//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Credentials are referenced by env-var name in the config and resolved
//! at runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub league: LeagueConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueConfig {
    pub id: String,
    /// First day of the season; activities before it are ignored.
    pub start_date: NaiveDate,
    /// Budget every manager started the season with.
    pub starting_budget: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub email_env: String,
    pub password_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum activity feed entries requested per run.
    #[serde(default = "default_activity_limit")]
    pub activity_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Where the reconciled table is written as JSON. Empty disables it.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_base_url() -> String {
    crate::league::kickbase::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_activity_limit() -> u32 {
    1000
}

fn default_snapshot_path() -> String {
    "league_budgets.json".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Login credentials resolved from the environment.
    pub fn credentials(&self) -> Result<(String, SecretString)> {
        let email = Self::resolve_env(&self.api.email_env)?;
        let password = SecretString::new(Self::resolve_env(&self.api.password_env)?);
        Ok((email, password))
    }
}

impl LeagueConfig {
    /// Start of the season as a UTC instant (midnight).
    pub fn since(&self) -> DateTime<Utc> {
        self.start_date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}
