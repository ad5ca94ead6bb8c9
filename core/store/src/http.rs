use anyhow::{Context, Result};
use async_trait::async_trait;
use fraudgraph_schemas::{GraphRecord, GraphValue, NodeIdentity};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::response::TransactionResponse;
use crate::{GraphStore, LabelCount};

/// All edges whose both endpoints are already in the assembled identity set.
const RELATIONSHIPS_QUERY: &str = "\
MATCH (a)-[r]-(b)
WHERE elementId(a) IN $ids AND elementId(b) IN $ids
RETURN a, r, b";

/// Node counts grouped by primary label, largest first.
const LABEL_COUNTS_QUERY: &str = "\
MATCH (n)
WITH labels(n)[0] AS label, count(n) AS cnt
RETURN label, cnt ORDER BY cnt DESC";

/// Configuration for the graph store connection
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("NEO4J_HTTP_URL")
            .unwrap_or_else(|_| "http://localhost:7474".to_string());
        let database = std::env::var("NEO4J_DATABASE").unwrap_or_else(|_| "neo4j".to_string());
        let user = std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string());
        let password =
            std::env::var("NEO4J_PASSWORD").context("NEO4J_PASSWORD required for graph store")?;

        Ok(Self {
            base_url,
            database,
            user,
            password,
            timeout_secs: 30,
        })
    }
}

/// Graph store client over Neo4j's HTTP transaction endpoint. Requests the
/// `row` and `graph` result contents so every cell arrives with enough shape
/// information to discriminate node / edge / scalar in one place.
pub struct HttpGraphStore {
    config: StoreConfig,
    client: Client,
}

impl HttpGraphStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for graph store")?;

        Ok(Self { config, client })
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.config.base_url.trim_end_matches('/'),
            self.config.database
        )
    }

    async fn transact(&self, statement: &str, parameters: Value) -> Result<Vec<GraphRecord>> {
        let body = json!({
            "statements": [{
                "statement": statement,
                "parameters": parameters,
                "resultDataContents": ["row", "graph"]
            }]
        });

        debug!("Running graph query: {}", statement.trim());

        let response = self
            .client
            .post(self.commit_url())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&body)
            .send()
            .await
            .context("failed to reach the graph store")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("graph store HTTP error {}: {}", status, error_text);
        }

        let parsed: TransactionResponse = response
            .json()
            .await
            .context("failed to parse graph store response")?;

        Ok(parsed.into_records()?)
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn run_query(&self, cypher: &str) -> Result<Vec<GraphRecord>> {
        self.transact(cypher, json!({})).await
    }

    async fn relationships_for_nodes(
        &self,
        identities: &[NodeIdentity],
    ) -> Result<Vec<GraphRecord>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = identities.iter().map(|id| id.0.as_str()).collect();
        self.transact(RELATIONSHIPS_QUERY, json!({ "ids": ids }))
            .await
    }

    async fn label_counts(&self) -> Result<Vec<LabelCount>> {
        let records = self.transact(LABEL_COUNTS_QUERY, json!({})).await?;

        let mut counts = Vec::with_capacity(records.len());
        for record in records {
            let mut label = None;
            let mut count = None;
            for (column, value) in &record.cells {
                if let GraphValue::Scalar(scalar) = value {
                    match column.as_str() {
                        "label" => label = scalar.as_str().map(str::to_string),
                        "cnt" => count = scalar.as_i64(),
                        _ => {}
                    }
                }
            }
            if let (Some(label), Some(count)) = (label, count) {
                counts.push(LabelCount { label, count });
            }
        }

        Ok(counts)
    }
}
