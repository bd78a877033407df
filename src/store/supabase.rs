//! Supabase (PostgREST) profile store.
//!
//! Talks to `{url}/rest/v1/{table}` with the project's anon key. Upserts use
//! `Prefer: resolution=merge-duplicates` with `on_conflict=id`.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::model::ProfileRecord;
use super::traits::ProfileStore;
use crate::error::StoreError;

/// Postgres `unique_violation` SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Connection settings for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
    pub table: String,
}

/// Error body PostgREST returns on failure.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Remote store over the PostgREST HTTP API.
pub struct SupabaseStore {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let key = self.config.anon_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    async fn write(
        &self,
        record: &ProfileRecord,
        upsert: bool,
    ) -> Result<ProfileRecord, StoreError> {
        let mut builder = self.request(reqwest::Method::POST, &self.table_url());
        builder = if upsert {
            builder
                .query(&[("on_conflict", "id")])
                .header("Prefer", "return=representation,resolution=merge-duplicates")
        } else {
            builder.header("Prefer", "return=representation")
        };

        let resp = builder
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status, &body);
            warn!(id = %record.id, status = %status, error = %err, "Profile write rejected");
            return Err(err);
        }

        debug!(id = %record.id, upsert, "Profile written");
        let mut rows: Vec<ProfileRecord> = if body.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&body).map_err(|e| StoreError::Serialization(e.to_string()))?
        };
        Ok(if rows.is_empty() {
            record.clone()
        } else {
            rows.swap_remove(0)
        })
    }
}

#[async_trait]
impl ProfileStore for SupabaseStore {
    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.write(record, true).await
    }

    async fn insert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.write(record, false).await
    }

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let filter = format!("eq.{id}");
        let resp = self
            .request(reqwest::Method::GET, &self.table_url())
            .query(&[("id", filter.as_str()), ("select", "*")])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        let mut rows: Vec<ProfileRecord> =
            serde_json::from_str(&body).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Map a failed PostgREST response onto [`StoreError`].
fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|e| e.code.clone());
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
        let constraint = constraint_name(&message).or_else(|| {
            parsed
                .as_ref()
                .and_then(|e| e.details.as_deref())
                .and_then(constraint_name)
        });
        return StoreError::Conflict {
            constraint,
            message,
        };
    }

    StoreError::Rejected {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Pull `profiles_pkey` out of `... unique constraint "profiles_pkey"`.
fn constraint_name(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}
