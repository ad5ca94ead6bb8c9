use anyhow::Result;
use async_trait::async_trait;
use fraudgraph_schemas::{GraphRecord, NodeIdentity};

mod http;
mod response;

pub use http::{HttpGraphStore, StoreConfig};
pub use response::StoreError;

/// Per-label node count from the live database summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Read-only access to the property graph. The assistant never writes.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a read query. Errors surface the store's own message so the
    /// repair prompt can quote it.
    async fn run_query(&self, cypher: &str) -> Result<Vec<GraphRecord>>;

    /// All edges whose both endpoints are in the given identity set.
    async fn relationships_for_nodes(
        &self,
        identities: &[NodeIdentity],
    ) -> Result<Vec<GraphRecord>>;

    /// Node counts grouped by primary label, for schema-context calibration.
    async fn label_counts(&self) -> Result<Vec<LabelCount>>;
}
