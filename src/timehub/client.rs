//! Worklog retrieval from the Timetracker OData API.
//!
//! One batched `$query` request selects every worklog belonging to the
//! given work-item id set. A non-success status or an unparseable body
//! is fatal: the run must never produce a partial aggregation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::TimeHubConfig;
use crate::error::ExportError;

pub struct TimeHubClient {
    base_url: String,
    api_version: String,
    auth_header: String,
    client: reqwest::Client,
}

/// One logged time entry, as returned by the workLogsOnly endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Worklog {
    pub work_item_id: u64,

    /// Logged duration in whole seconds.
    #[serde(default)]
    pub period_length: u64,

    #[serde(default)]
    pub activity: Option<ActivityRef>,

    #[serde(default)]
    pub activity_type: Option<ActivityRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityRef {
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct WorklogResponse {
    #[serde(default)]
    value: Vec<Worklog>,
}

impl Worklog {
    /// Activity label: `Activity.Name` first, then `ActivityType.Name`,
    /// empty when neither is set.
    pub fn activity_name(&self) -> &str {
        self.activity
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .or_else(|| self.activity_type.as_ref().and_then(|a| a.name.as_deref()))
            .unwrap_or("")
    }
}

impl TimeHubClient {
    pub fn new(cfg: &TimeHubConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_version: cfg.api_version.clone(),
            auth_header: format!("Bearer {}", cfg.pat),
            client,
        })
    }

    /// Fetch all worklogs whose work-item id is in `ids`, in one
    /// batched OData query.
    pub async fn fetch_worklogs(&self, ids: &[String]) -> Result<Vec<Worklog>> {
        let url = format!(
            "{}/api/odata/{}/workLogsOnly/$query",
            self.base_url, self.api_version
        );
        let payload = filter_payload(ids);
        debug!("POST {} ({} ids)", url, ids.len());

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "text/plain")
            .header("Accept", "application/json")
            .body(payload)
            .send()
            .await
            .context("Time-log request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::TimeHubApi { status, body }.into());
        }

        let parsed: WorklogResponse = response
            .json()
            .await
            .context("Failed to parse time-log response")?;

        Ok(parsed.value)
    }
}

/// OData body selecting every worklog logged on the given work items.
fn filter_payload(ids: &[String]) -> String {
    format!("$filter=WorkItemId in ({})", ids.join(","))
}
