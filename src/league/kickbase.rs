//! Kickbase league service integration.
//!
//! Base URL: https://api.kickbase.com/v4/
//! Auth: `POST /v4/user/login` returns a bearer token used for every
//! other request.
//!
//! The activity feed mixes several entry types; only trades (15), login
//! bonuses (22) and achievement bonuses (26) matter for budgets.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::LeagueApi;
use crate::types::{
    AchievementReward, BonusEvent, LeagueActivities, ParticipantInfo, ParticipantPerformance,
    ParticipantRef, RankingEntry,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.kickbase.com";

const ACTIVITY_TRADE: i64 = 15;
const ACTIVITY_LOGIN_BONUS: i64 = 22;
const ACTIVITY_ACHIEVEMENT: i64 = 26;

// ---------------------------------------------------------------------------
// API response types (Kickbase JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginResponse {
    tkn: String,
}

#[derive(Debug, Deserialize)]
struct ActivityFeed {
    #[serde(default)]
    af: Vec<ActivityEntry>,
}

#[derive(Debug, Deserialize)]
struct ActivityEntry {
    /// Activity type code.
    t: i64,
    /// Timestamp, RFC 3339.
    #[serde(default)]
    dt: Option<String>,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RankingResponse {
    #[serde(default)]
    us: Vec<RankingUser>,
}

#[derive(Debug, Deserialize)]
struct RankingUser {
    /// User id.
    i: String,
    /// Display name.
    n: String,
    /// Season points.
    #[serde(default)]
    sp: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    /// Team value.
    #[serde(default)]
    tv: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct PerformanceResponse {
    #[serde(default)]
    tp: Option<Decimal>,
    /// Per-season entries, oldest first.
    #[serde(default)]
    it: Vec<SeasonPerformance>,
}

#[derive(Debug, Deserialize)]
struct SeasonPerformance {
    #[serde(default)]
    tp: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct AchievementResponse {
    /// Times achieved.
    #[serde(default)]
    ac: Decimal,
    /// Reward per completion.
    #[serde(default)]
    er: Decimal,
}

#[derive(Debug, Deserialize)]
struct BudgetResponse {
    b: Decimal,
}

#[derive(Debug, Deserialize)]
struct SettingsResponse {
    u: SettingsUser,
}

#[derive(Debug, Deserialize)]
struct SettingsUser {
    #[serde(alias = "name")]
    unm: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated Kickbase client.
pub struct KickbaseClient {
    http: Client,
    base_url: String,
    token: SecretString,
    activity_limit: u32,
}

impl KickbaseClient {
    fn build_http(timeout_secs: u64) -> Result<Client> {
        Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("league-budget/0.1.0")
            .build()
            .context("Failed to build HTTP client for Kickbase")
    }

    /// Log in with email and password and keep the returned token.
    pub async fn login(
        base_url: &str,
        email: &str,
        password: &SecretString,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Self::build_http(timeout_secs)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let body = serde_json::json!({
            "em": email,
            "pass": password.expose_secret(),
            "loy": false,
            "rep": {},
        });

        let resp = http
            .post(format!("{base_url}/v4/user/login"))
            .json(&body)
            .send()
            .await
            .context("Kickbase login request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Kickbase login failed {status}");
        }

        let login: LoginResponse = resp
            .json()
            .await
            .context("Failed to parse Kickbase login response")?;

        info!(email, "Logged in to Kickbase");

        Ok(Self {
            http,
            base_url,
            token: SecretString::new(login.tkn),
            activity_limit: 1000,
        })
    }

    /// Build a client around an existing token.
    pub fn with_token(base_url: &str, token: SecretString, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: Self::build_http(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            activity_limit: 1000,
        })
    }

    /// Cap on activity feed entries requested per run.
    pub fn with_activity_limit(mut self, limit: u32) -> Self {
        self.activity_limit = limit;
        self
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Kickbase GET");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .with_context(|| format!("Kickbase request failed: {path}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Kickbase API error {status} on {path}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Kickbase response: {path}"))
    }

    fn league_path(league_id: &str, rest: &str) -> String {
        format!("/v4/leagues/{}{rest}", urlencoding::encode(league_id))
    }

    /// Split the feed into trades and bonus events, dropping entries older
    /// than `since`. Entries without a readable timestamp are kept.
    fn split_activities(feed: ActivityFeed, since: DateTime<Utc>) -> LeagueActivities {
        let mut activities = LeagueActivities::default();

        for entry in feed.af {
            let at = entry
                .dt
                .as_deref()
                .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
                .map(|dt| dt.with_timezone(&Utc));
            if matches!(at, Some(at) if at < since) {
                continue;
            }

            match entry.t {
                ACTIVITY_TRADE => activities.transactions.push(entry.data),
                ACTIVITY_LOGIN_BONUS => activities
                    .login_bonus_events
                    .push(BonusEvent::new(entry.data)),
                ACTIVITY_ACHIEVEMENT => activities
                    .achievement_bonus_events
                    .push(BonusEvent::new(entry.data)),
                _ => {}
            }
        }

        activities
    }

    fn season_points(perf: PerformanceResponse) -> Option<Decimal> {
        perf.tp.or_else(|| perf.it.last().and_then(|s| s.tp))
    }
}

// ---------------------------------------------------------------------------
// LeagueApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl LeagueApi for KickbaseClient {
    async fn fetch_league_activities(
        &self,
        league_id: &str,
        since: DateTime<Utc>,
    ) -> Result<LeagueActivities> {
        let path = format!(
            "{}?max={}&start=0",
            Self::league_path(league_id, "/activitiesFeed"),
            self.activity_limit,
        );
        let feed: ActivityFeed = self.get_json(&path).await?;
        let total = feed.af.len();
        let activities = Self::split_activities(feed, since);

        debug!(
            total,
            trades = activities.transactions.len(),
            "Activity feed split"
        );
        Ok(activities)
    }

    async fn fetch_achievement_reward(
        &self,
        league_id: &str,
        achievement_id: &str,
    ) -> Result<AchievementReward> {
        let path = Self::league_path(
            league_id,
            &format!("/user/achievements/{}", urlencoding::encode(achievement_id)),
        );
        let resp: AchievementResponse = self.get_json(&path).await?;
        Ok(AchievementReward {
            count: resp.ac,
            unit_reward: resp.er,
        })
    }

    async fn fetch_participants(&self, league_id: &str) -> Result<Vec<ParticipantRef>> {
        let resp: RankingResponse = self
            .get_json(&Self::league_path(league_id, "/ranking"))
            .await?;
        Ok(resp
            .us
            .into_iter()
            .map(|u| ParticipantRef { name: u.n, id: u.i })
            .collect())
    }

    async fn fetch_participant_info(
        &self,
        league_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantInfo> {
        let path = Self::league_path(
            league_id,
            &format!("/managers/{}/dashboard", urlencoding::encode(participant_id)),
        );
        let resp: DashboardResponse = self.get_json(&path).await?;
        Ok(ParticipantInfo { team_value: resp.tv })
    }

    async fn fetch_participant_performance(
        &self,
        league_id: &str,
        participant_id: &str,
        name: &str,
    ) -> Result<ParticipantPerformance> {
        let path = Self::league_path(
            league_id,
            &format!("/managers/{}/performance", urlencoding::encode(participant_id)),
        );
        let resp: PerformanceResponse = self.get_json(&path).await?;
        Ok(ParticipantPerformance {
            name: name.to_string(),
            total_points: Self::season_points(resp),
        })
    }

    async fn fetch_league_ranking(&self, league_id: &str) -> Result<Vec<RankingEntry>> {
        let resp: RankingResponse = self
            .get_json(&Self::league_path(league_id, "/ranking"))
            .await?;
        Ok(resp
            .us
            .into_iter()
            .map(|u| RankingEntry::new(u.n, u.sp.unwrap_or(Decimal::ZERO)))
            .collect())
    }

    async fn fetch_self_budget(&self, league_id: &str) -> Result<Decimal> {
        let resp: BudgetResponse = self
            .get_json(&Self::league_path(league_id, "/me/budget"))
            .await?;
        Ok(resp.b)
    }

    async fn fetch_self_identity(&self) -> Result<String> {
        let resp: SettingsResponse = self.get_json("/v4/user/settings").await?;
        Ok(resp.u.unm)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
