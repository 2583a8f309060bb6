//! PostgREST-backed assignment store
//!
//! Talks to a hosted Postgres table over its REST gateway (the
//! `/rest/v1/<table>` layout used by Supabase). Filters are expressed as
//! query parameters (`date=gte.2025-06-01`), and updates request
//! `Prefer: return=representation` so the number of returned rows is the
//! affected-row count.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use super::repository::{Assignment, AssignmentRepository, NewAssignment, RecordId};
use super::{StorageError, StorageResult};

const SELECT_COLUMNS: &str = "id,date,member";

/// Connection settings for a PostgREST endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgrestConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,

    /// Service or anon key, sent as `apikey` and bearer token
    pub api_key: String,

    /// Table holding assignments
    #[serde(default = "default_table")]
    pub table: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "oncall_rotation".to_string()
}

fn default_timeout() -> u64 {
    5
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: default_table(),
            timeout_secs: default_timeout(),
        }
    }
}

/// [`AssignmentRepository`] over PostgREST
pub struct PostgrestAssignmentRepository {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PostgrestAssignmentRepository {
    /// Create a repository client
    pub fn new(config: &PostgrestConfig) -> StorageResult<Self> {
        let base = config.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(StorageError::InvalidConfig(
                "PostgREST base URL cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{base}/rest/v1/{}", config.table),
            api_key: config.api_key.clone(),
        })
    }

    /// Table endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select(&self) -> RequestBuilder {
        self.authorized(self.client.get(&self.endpoint))
            .query(&[("select", SELECT_COLUMNS)])
    }

    async fn check(response: Response) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(StorageError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch(&self, request: RequestBuilder) -> StorageResult<Vec<Assignment>> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<Vec<Assignment>>().await?)
    }

    async fn fetch_one(&self, request: RequestBuilder) -> StorageResult<Option<Assignment>> {
        Ok(self.fetch(request.query(&[("limit", "1")])).await?.into_iter().next())
    }
}

#[async_trait]
impl AssignmentRepository for PostgrestAssignmentRepository {
    async fn latest(&self) -> StorageResult<Option<Assignment>> {
        self.fetch_one(self.select().query(&[("order", "date.desc,id.desc")]))
            .await
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<Assignment>> {
        let request = self.select().query(&[
            ("date", format!("gte.{from}")),
            ("date", format!("lte.{to}")),
            ("order", "date.asc,id.asc".to_string()),
        ]);
        self.fetch(request).await
    }

    async fn exists_between(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<bool> {
        let request = self.select().query(&[
            ("date", format!("gte.{from}")),
            ("date", format!("lte.{to}")),
        ]);
        Ok(self.fetch_one(request).await?.is_some())
    }

    async fn insert_batch(&self, rows: &[NewAssignment]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let request = self
            .authorized(self.client.post(&self.endpoint))
            .header("Prefer", "return=minimal")
            .json(rows);
        Self::check(request.send().await?).await?;

        tracing::debug!(count = rows.len(), endpoint = %self.endpoint, "Inserted assignments");
        Ok(rows.len())
    }

    async fn nearest_future(
        &self,
        responder: &str,
        from: NaiveDate,
    ) -> StorageResult<Option<Assignment>> {
        let request = self.select().query(&[
            ("member", format!("eq.{responder}")),
            ("date", format!("gte.{from}")),
            ("order", "date.asc,id.asc".to_string()),
        ]);
        self.fetch_one(request).await
    }

    async fn on_date(&self, date: NaiveDate) -> StorageResult<Option<Assignment>> {
        let request = self.select().query(&[
            ("date", format!("eq.{date}")),
            ("order", "id.asc".to_string()),
        ]);
        self.fetch_one(request).await
    }

    async fn update_responder(&self, id: RecordId, responder: &str) -> StorageResult<u64> {
        let request = self
            .authorized(self.client.patch(&self.endpoint))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "member": responder }));

        let response = Self::check(request.send().await?).await?;
        let updated = response.json::<Vec<Assignment>>().await?;
        Ok(updated.len() as u64)
    }
}
