//! REST client for the work-item tracking API.

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::AzdoConfig;
use crate::error::ExportError;
use crate::models::Ticket;

/// Relation kind linking a parent work item to its children.
const HIERARCHY_FORWARD: &str = "System.LinkTypes.Hierarchy-Forward";

pub struct AzdoClient {
    base_url: String,
    org: String,
    project: String,
    query_id: String,
    api_version: String,
    auth_header: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Deserialize)]
struct WorkItemRef {
    id: u64,
}

#[derive(Deserialize)]
struct WorkItemResponse {
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Deserialize)]
struct Relation {
    rel: Option<String>,
    url: Option<String>,
}

/// One expanded work item: its report row plus any child ids found in
/// forward hierarchy relations.
#[derive(Debug, Clone)]
pub struct WorkItemDetail {
    pub ticket: Ticket,
    pub child_ids: Vec<String>,
}

impl AzdoClient {
    pub fn new(cfg: &AzdoConfig, timeout: Duration) -> Result<Self> {
        // PATs authenticate over Basic auth with an empty username.
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!(":{}", cfg.pat));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            org: cfg.org.clone(),
            project: cfg.project.clone(),
            query_id: cfg.query_id.clone(),
            api_version: cfg.api_version.clone(),
            auth_header: format!("Basic {encoded}"),
            client,
        })
    }

    /// Run the saved query and return the top-level work-item ids.
    ///
    /// An empty result set is reported as `ExportError::EmptyQueryResult`
    /// so the caller can end the run with a warning instead of a report.
    pub async fn run_saved_query(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}/{}/{}/_apis/wit/wiql/{}?api-version={}",
            self.base_url, self.org, self.project, self.query_id, self.api_version
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Saved query request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Work-item query error {}: {}", status, body);
        }

        let query: QueryResponse = response
            .json()
            .await
            .context("Failed to parse saved query response")?;

        let ids = query_ids(&query);
        if ids.is_empty() {
            return Err(ExportError::EmptyQueryResult.into());
        }
        Ok(ids)
    }

    /// Fetch one work item with relations expanded.
    pub async fn fetch_work_item(&self, id: &str) -> Result<WorkItemDetail> {
        let url = format!(
            "{}/{}/_apis/wit/workitems/{}?$expand=relations&api-version={}",
            self.base_url, self.org, id, self.api_version
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Request for work item {} failed", id))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Work item {} fetch error {}: {}", id, status, body);
        }

        let item: WorkItemResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse work item {}", id))?;

        Ok(expand_item(id, &item))
    }
}

fn query_ids(query: &QueryResponse) -> Vec<String> {
    query.work_items.iter().map(|w| w.id.to_string()).collect()
}

/// Build the ticket row and collect forward-hierarchy children.
fn expand_item(id: &str, item: &WorkItemResponse) -> WorkItemDetail {
    let ticket = Ticket {
        id: id.to_string(),
        title: field_text(&item.fields, "System.Title"),
        state: field_text(&item.fields, "System.State"),
        work_item_type: field_text(&item.fields, "System.WorkItemType"),
        priority: field_text(&item.fields, "Microsoft.VSTS.Common.Priority"),
        estimated_dev: field_text(&item.fields, "Custom.EstimatedDevelopmentTime"),
        estimated_test: field_text(&item.fields, "Custom.EstimatedTestingTime"),
    };

    let child_ids = item
        .relations
        .iter()
        .filter(|r| r.rel.as_deref() == Some(HIERARCHY_FORWARD))
        .filter_map(|r| child_id_from_url(r.url.as_deref()?))
        .collect();

    WorkItemDetail { ticket, child_ids }
}

/// Render a field value as report text. Missing fields become empty;
/// numeric values (Priority) keep their plain decimal form.
fn field_text(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// The child id is the trailing path segment of the relation URL.
fn child_id_from_url(url: &str) -> Option<String> {
    match url.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => Some(segment.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_response() {
        let json = r#"{ "workItems": [ { "id": 101 }, { "id": 102 } ] }"#;
        let query: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(query_ids(&query), vec!["101", "102"]);
    }

    #[test]
    fn test_parse_query_response_missing_items() {
        let json = r#"{ "queryType": "flat" }"#;
        let query: QueryResponse = serde_json::from_str(json).unwrap();
        assert!(query_ids(&query).is_empty());
    }

    #[test]
    fn test_expand_item_fields_and_children() {
        let json = r#"{
            "fields": {
                "System.Title": "Login page",
                "System.State": "Active",
                "System.WorkItemType": "User Story",
                "Microsoft.VSTS.Common.Priority": 2
            },
            "relations": [
                {
                    "rel": "System.LinkTypes.Hierarchy-Forward",
                    "url": "https://dev.azure.com/my-org/_apis/wit/workItems/201"
                },
                {
                    "rel": "System.LinkTypes.Hierarchy-Reverse",
                    "url": "https://dev.azure.com/my-org/_apis/wit/workItems/50"
                },
                {
                    "rel": "AttachedFile",
                    "url": "https://dev.azure.com/my-org/_apis/wit/attachments/abc"
                }
            ]
        }"#;
        let item: WorkItemResponse = serde_json::from_str(json).unwrap();
        let detail = expand_item("101", &item);

        assert_eq!(detail.ticket.id, "101");
        assert_eq!(detail.ticket.title, "Login page");
        assert_eq!(detail.ticket.state, "Active");
        assert_eq!(detail.ticket.work_item_type, "User Story");
        assert_eq!(detail.ticket.priority, "2");
        // Custom estimate fields are absent: they default to empty.
        assert_eq!(detail.ticket.estimated_dev, "");
        assert_eq!(detail.ticket.estimated_test, "");
        // Only the forward hierarchy relation contributes a child.
        assert_eq!(detail.child_ids, vec!["201"]);
    }

    #[test]
    fn test_expand_item_without_relations() {
        let json = r#"{ "fields": { "System.Title": "Standalone" } }"#;
        let item: WorkItemResponse = serde_json::from_str(json).unwrap();
        let detail = expand_item("102", &item);

        assert_eq!(detail.ticket.title, "Standalone");
        assert!(detail.child_ids.is_empty());
    }

    #[test]
    fn test_child_id_from_url() {
        assert_eq!(
            child_id_from_url("https://dev.azure.com/org/_apis/wit/workItems/201"),
            Some("201".to_string())
        );
        assert_eq!(child_id_from_url("https://dev.azure.com/trailing/"), None);
    }

    #[test]
    fn test_field_text_shapes() {
        let json = r#"{ "s": "text", "n": 3, "f": 1.5, "b": true, "nul": null }"#;
        let fields: serde_json::Map<String, Value> = serde_json::from_str(json).unwrap();

        assert_eq!(field_text(&fields, "s"), "text");
        assert_eq!(field_text(&fields, "n"), "3");
        assert_eq!(field_text(&fields, "f"), "1.5");
        assert_eq!(field_text(&fields, "b"), "true");
        assert_eq!(field_text(&fields, "nul"), "");
        assert_eq!(field_text(&fields, "missing"), "");
    }
}
