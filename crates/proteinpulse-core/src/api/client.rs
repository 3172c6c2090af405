//! HTTP client for the Protein Pulse backend.
//!
//! Tables are read and written through a PostgREST-style interface
//! (`/rest/v1/<table>`), and password sign-in goes through `/auth/v1/token`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::SessionData;
use crate::models::{date_key, DailyGoal, IntakeEntry, SavedShortcut, UserProfile};

use super::rows::{DailyGoalRow, FoodEntryRow, ProfileRow, SavedFoodRow};
use super::{RemoteError, RemoteService};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Used when the auth endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const PROFILES_TABLE: &str = "profiles";
const SAVED_FOODS_TABLE: &str = "saved_foods";
const FOOD_ENTRIES_TABLE: &str = "food_entries";
const DAILY_GOALS_TABLE: &str = "daily_goals";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// `/auth/v1/signup` answers with a session when the account is usable right
/// away, or with just the user when the email must be confirmed first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthResponse),
    PendingConfirmation(AuthUser),
}

impl AuthResponse {
    fn into_session(self) -> SessionData {
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        SessionData {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        }
    }
}

impl SignUpResponse {
    fn into_session(self) -> Option<SessionData> {
        match self {
            SignUpResponse::Session(auth) => {
                info!(user_id = %auth.user.id, "Account created");
                Some(auth.into_session())
            }
            SignUpResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "Account created, awaiting email confirmation");
                None
            }
        }
    }
}

/// Client for the remote backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    // ===== Authentication =====

    /// Sign in with email and password and return session data
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionData> {
        let response = self
            .client
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send authentication request")?;

        let response = Self::check_response(response).await?;
        let auth: AuthResponse = response.json().await.context("Failed to parse auth response")?;
        info!(user_id = %auth.user.id, "Signed in");
        Ok(auth.into_session())
    }

    /// Create an account. Returns `None` when the backend requires email
    /// confirmation before the first sign-in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<SessionData>> {
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send sign-up request")?;

        let response = Self::check_response(response).await?;
        let signup: SignUpResponse = response.json().await.context("Failed to parse sign-up response")?;
        Ok(signup.into_session())
    }

    /// Exchange a refresh token for a fresh session
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionData> {
        let response = self
            .client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let response = Self::check_response(response).await?;
        let auth: AuthResponse = response.json().await.context("Failed to parse refresh response")?;
        debug!(user_id = %auth.user.id, "Session refreshed");
        Ok(auth.into_session())
    }

    /// Revoke the session server-side
    pub async fn sign_out(&self, session: &SessionData) -> Result<()> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .headers(self.auth_headers(session)?)
            .send()
            .await
            .context("Failed to send sign-out request")?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Request plumbing =====

    fn auth_headers(&self, session: &SessionData) -> Result<header::HeaderMap, RemoteError> {
        let invalid = |e: header::InvalidHeaderValue| RemoteError::InvalidResponse(e.to_string());
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.anon_key).map_err(invalid)?);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", session.access_token)).map_err(invalid)?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, RemoteError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_status(status, &body))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, RemoteError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_status(status, &body))
        }
    }

    /// Send a request, backing off and retrying while rate limited
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, RemoteError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(RemoteError::RateLimited);
                    }
                    warn!(retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        session: &SessionData,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let url = self.table_url(table);
        let headers = self.auth_headers(session)?;
        let response = self
            .send(|| {
                self.client
                    .get(&url)
                    .headers(headers.clone())
                    .query(&[("select", "*")])
                    .query(filters)
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("{} rows: {}", table, e)))
    }

    async fn upsert<B: Serialize>(
        &self,
        session: &SessionData,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<(), RemoteError> {
        let url = self.table_url(table);
        let headers = self.auth_headers(session)?;
        self.send(|| {
            self.client
                .post(&url)
                .headers(headers.clone())
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .query(&[("on_conflict", on_conflict)])
                .json(body)
        })
        .await?;
        Ok(())
    }

    async fn delete(
        &self,
        session: &SessionData,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<(), RemoteError> {
        let url = self.table_url(table);
        let headers = self.auth_headers(session)?;
        self.send(|| self.client.delete(&url).headers(headers.clone()).query(filters))
            .await?;
        Ok(())
    }

    fn owner(session: &SessionData) -> (&'static str, String) {
        ("user_id", format!("eq.{}", session.user_id))
    }
}

#[async_trait]
impl RemoteService for RestClient {
    async fn fetch_profile(&self, session: &SessionData) -> Result<Option<UserProfile>, RemoteError> {
        let rows: Vec<ProfileRow> = self
            .select(session, PROFILES_TABLE, &[Self::owner(session)])
            .await?;
        Ok(rows.into_iter().next().map(ProfileRow::into_profile))
    }

    async fn upsert_profile(&self, session: &SessionData, profile: &UserProfile) -> Result<(), RemoteError> {
        let row = ProfileRow::from_profile(&session.user_id, profile);
        self.upsert(session, PROFILES_TABLE, "user_id", &row).await
    }

    async fn fetch_shortcuts(&self, session: &SessionData) -> Result<Vec<SavedShortcut>, RemoteError> {
        let rows: Vec<SavedFoodRow> = self
            .select(
                session,
                SAVED_FOODS_TABLE,
                &[Self::owner(session), ("order", "created_at.asc".to_string())],
            )
            .await?;
        Ok(rows.into_iter().filter_map(SavedFoodRow::into_shortcut).collect())
    }

    async fn upsert_shortcut(&self, session: &SessionData, shortcut: &SavedShortcut) -> Result<(), RemoteError> {
        let row = SavedFoodRow::from_shortcut(&session.user_id, shortcut);
        self.upsert(session, SAVED_FOODS_TABLE, "id", &row).await
    }

    async fn delete_shortcut(&self, session: &SessionData, id: &str) -> Result<(), RemoteError> {
        self.delete(
            session,
            SAVED_FOODS_TABLE,
            &[Self::owner(session), ("id", format!("eq.{}", id))],
        )
        .await
    }

    async fn fetch_entries(&self, session: &SessionData, date: NaiveDate) -> Result<Vec<IntakeEntry>, RemoteError> {
        let rows: Vec<FoodEntryRow> = self
            .select(
                session,
                FOOD_ENTRIES_TABLE,
                &[
                    Self::owner(session),
                    ("log_date", format!("eq.{}", date_key(date))),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().filter_map(FoodEntryRow::into_entry).collect())
    }

    async fn upsert_entry(&self, session: &SessionData, entry: &IntakeEntry) -> Result<(), RemoteError> {
        let row = FoodEntryRow::from_entry(&session.user_id, entry);
        self.upsert(session, FOOD_ENTRIES_TABLE, "id", &row).await
    }

    async fn delete_entry(&self, session: &SessionData, id: &str) -> Result<(), RemoteError> {
        self.delete(
            session,
            FOOD_ENTRIES_TABLE,
            &[Self::owner(session), ("id", format!("eq.{}", id))],
        )
        .await
    }

    async fn fetch_daily_goal(&self, session: &SessionData, date: NaiveDate) -> Result<Option<DailyGoal>, RemoteError> {
        let rows: Vec<DailyGoalRow> = self
            .select(
                session,
                DAILY_GOALS_TABLE,
                &[Self::owner(session), ("date", format!("eq.{}", date_key(date)))],
            )
            .await?;
        Ok(rows.into_iter().next().and_then(DailyGoalRow::into_goal))
    }

    async fn upsert_daily_goal(&self, session: &SessionData, goal: &DailyGoal) -> Result<(), RemoteError> {
        let row = DailyGoalRow::from_goal(&session.user_id, goal);
        self.upsert(session, DAILY_GOALS_TABLE, "user_id,date", &row).await
    }
}
