//! Wire types for the Neo4j HTTP transaction API and the single point where
//! result cells are discriminated into node / edge / scalar values.

use fraudgraph_schemas::{GraphEdge, GraphNode, GraphRecord, GraphValue, NodeIdentity};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("graph store rejected the query ({code}): {message}")]
    Query { code: String, message: String },
    #[error("graph store returned a malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataEntry>,
}

#[derive(Debug, Deserialize)]
struct DataEntry {
    #[serde(default)]
    row: Vec<Value>,
    #[serde(default)]
    meta: Vec<Value>,
    #[serde(default)]
    graph: GraphSection,
}

#[derive(Debug, Default, Deserialize)]
struct GraphSection {
    #[serde(default)]
    nodes: Vec<WireNode>,
    #[serde(default)]
    relationships: Vec<WireRelationship>,
}

#[derive(Debug, Deserialize)]
struct WireNode {
    id: String,
    #[serde(rename = "elementId")]
    element_id: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl WireNode {
    fn identity(&self) -> NodeIdentity {
        NodeIdentity(self.element_id.clone().unwrap_or_else(|| self.id.clone()))
    }

    fn matches(&self, key: &str) -> bool {
        self.element_id.as_deref() == Some(key) || self.id == key
    }
}

#[derive(Debug, Deserialize)]
struct WireRelationship {
    id: String,
    #[serde(rename = "elementId")]
    element_id: Option<String>,
    #[serde(rename = "type")]
    edge_type: String,
    #[serde(rename = "startNode")]
    start_node: String,
    #[serde(rename = "endNode")]
    end_node: String,
    #[serde(rename = "startNodeElementId")]
    start_node_element_id: Option<String>,
    #[serde(rename = "endNodeElementId")]
    end_node_element_id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl WireRelationship {
    fn identity(&self) -> String {
        self.element_id.clone().unwrap_or_else(|| self.id.clone())
    }

    fn matches(&self, key: &str) -> bool {
        self.element_id.as_deref() == Some(key) || self.id == key
    }
}

impl TransactionResponse {
    pub(crate) fn into_records(self) -> Result<Vec<GraphRecord>, StoreError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(StoreError::Query {
                code: err.code,
                message: err.message,
            });
        }

        let result = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("no statement results".to_string()))?;

        let columns = result.columns;
        Ok(result
            .data
            .into_iter()
            .map(|entry| entry.into_record(&columns))
            .collect())
    }
}

impl DataEntry {
    fn into_record(self, columns: &[String]) -> GraphRecord {
        let mut cells = Vec::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            let raw = self.row.get(i).cloned().unwrap_or(Value::Null);
            let value = match self.meta.get(i).and_then(meta_ref) {
                Some(("node", key)) => self
                    .graph
                    .node_value(&key)
                    .unwrap_or(GraphValue::Scalar(raw)),
                Some(("relationship", key)) => self
                    .graph
                    .edge_value(&key)
                    .unwrap_or(GraphValue::Scalar(raw)),
                _ => GraphValue::Scalar(raw),
            };
            cells.push((column.clone(), value));
        }

        GraphRecord { cells }
    }
}

impl GraphSection {
    fn node_value(&self, key: &str) -> Option<GraphValue> {
        let node = self.nodes.iter().find(|n| n.matches(key))?;
        Some(GraphValue::Node(GraphNode {
            identity: node.identity(),
            labels: node.labels.clone(),
            properties: node.properties.clone(),
        }))
    }

    fn edge_value(&self, key: &str) -> Option<GraphValue> {
        let rel = self.relationships.iter().find(|r| r.matches(key))?;
        Some(GraphValue::Edge(GraphEdge {
            identity: rel.identity(),
            edge_type: rel.edge_type.clone(),
            source: self.endpoint(rel.start_node_element_id.as_deref(), &rel.start_node),
            target: self.endpoint(rel.end_node_element_id.as_deref(), &rel.end_node),
            properties: rel.properties.clone(),
        }))
    }

    /// Endpoint identity in the same scheme node identities use. Resolved
    /// through the node list so element-id and numeric-id responses stay
    /// consistent with each other.
    fn endpoint(&self, element_id: Option<&str>, numeric_id: &str) -> NodeIdentity {
        let key = element_id.unwrap_or(numeric_id);
        self.nodes
            .iter()
            .find(|n| n.matches(key))
            .map(WireNode::identity)
            .unwrap_or_else(|| NodeIdentity(key.to_string()))
    }
}

/// Classify a meta entry. Node and relationship cells carry a typed object;
/// scalars are null and list cells are nested arrays, both of which fall
/// through to scalar handling.
fn meta_ref(meta: &Value) -> Option<(&str, String)> {
    let obj = meta.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let key = obj
        .get("elementId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| obj.get("id").map(|id| id.to_string()))?;
    Some((kind, key))
}
