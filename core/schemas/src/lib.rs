use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Identity Types
// ============================================================================

/// Opaque identity assigned by the graph store to a node or edge instance.
/// Distinct from any domain-level `id` property carried in the property map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Graph Record Schema
// ============================================================================

/// A node value returned by the store: label set plus property map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub identity: NodeIdentity,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

impl GraphNode {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// The domain-level `id` property, when present.
    pub fn domain_id(&self) -> Option<&str> {
        self.property_str("id")
    }
}

/// An edge value returned by the store: type tag, endpoint identities,
/// property map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub identity: String,
    pub edge_type: String,
    pub source: NodeIdentity,
    pub target: NodeIdentity,
    pub properties: Map<String, Value>,
}

/// One result-row cell. Discriminated once at the store deserialization
/// boundary; downstream stages match instead of re-inspecting shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphValue {
    Node(GraphNode),
    Edge(GraphEdge),
    Scalar(Value),
}

/// One result row: column name to tagged value, in result-column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRecord {
    pub cells: Vec<(String, GraphValue)>,
}

impl GraphRecord {
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.cells.iter().filter_map(|(_, v)| match v {
            GraphValue::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.cells.iter().filter_map(|(_, v)| match v {
            GraphValue::Edge(e) => Some(e),
            _ => None,
        })
    }
}

// ============================================================================
// Investigation Pipeline Schema
// ============================================================================

/// Question complexity tier, controls schema-context richness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "deep")]
    Deep,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Simple => "simple",
            Tier::Deep => "deep",
        }
    }
}

/// Planner output: investigative approach plus at most two Cypher queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationPlan {
    pub reasoning: String,
    pub queries: Vec<String>,
}

impl InvestigationPlan {
    pub fn empty() -> Self {
        Self {
            reasoning: String::new(),
            queries: Vec::new(),
        }
    }
}

/// Outcome of executing one planned query, after any repair attempt.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExecution {
    /// The query as actually executed (original or repaired).
    pub cypher: String,
    pub rows: Vec<GraphRecord>,
    pub row_count: usize,
    pub failed: bool,
    /// True only if the original query errored and the repaired query
    /// executed without raising.
    pub auto_corrected: bool,
    /// Capped store error message, present only when `failed`.
    pub error: Option<String>,
}

impl QueryExecution {
    pub fn audit_entry(&self) -> ExecutedQuery {
        ExecutedQuery {
            cypher: self.cypher.clone(),
            failed: self.failed,
            auto_corrected: self.auto_corrected,
        }
    }
}

/// Audit-log view of an executed query, exposed to the UI collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedQuery {
    pub cypher: String,
    pub failed: bool,
    pub auto_corrected: bool,
}

// ============================================================================
// Visualization Schema
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationNode {
    /// Store identity, not the domain id.
    pub id: String,
    /// Truncated display label; the full name lives in the tooltip.
    pub label: String,
    pub category: String,
    pub color: String,
    pub size: u32,
    pub shape: String,
    pub is_root: bool,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationEdge {
    pub source: String,
    pub target: String,
    pub edge_type: String,
    pub label: String,
}

// ============================================================================
// Session Schema
// ============================================================================

/// Compact record of one completed turn, read back into later planning
/// prompts (most recent 5 only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub question: String,
    pub reasoning: String,
    pub first_query: String,
    pub recorded_at: String, // RFC3339
}

/// Point-in-time view of session LLM usage, for cost display.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub llm_calls: u64,
    pub token_estimate: u64,
}

// ============================================================================
// Turn Outcome (per-turn contract with the UI collaborator)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "aborted_no_queries")]
    AbortedNoQueries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    /// Synthesized finding, fallback message, or clarification request.
    pub finding: String,
    pub follow_ups: Vec<String>,
    pub nodes: Vec<VisualizationNode>,
    pub edges: Vec<VisualizationEdge>,
    pub executed: Vec<ExecutedQuery>,
    pub usage: UsageSnapshot,
}

// ============================================================================
// ID Generation
// ============================================================================

pub fn generate_session_id() -> SessionId {
    SessionId(ulid::Ulid::new().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(identity: &str, labels: &[&str], props: Value) -> GraphNode {
        GraphNode {
            identity: NodeIdentity(identity.to_string()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: props.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_record_cell_iteration() {
        let record = GraphRecord {
            cells: vec![
                (
                    "p".to_string(),
                    GraphValue::Node(node("4:ab:1", &["Provider"], json!({"id": "PROV_001"}))),
                ),
                (
                    "r".to_string(),
                    GraphValue::Edge(GraphEdge {
                        identity: "5:ab:9".to_string(),
                        edge_type: "TREATED_AT".to_string(),
                        source: NodeIdentity("4:ab:2".to_string()),
                        target: NodeIdentity("4:ab:1".to_string()),
                        properties: Map::new(),
                    }),
                ),
                ("total".to_string(), GraphValue::Scalar(json!(45))),
            ],
        };

        assert_eq!(record.nodes().count(), 1);
        assert_eq!(record.edges().count(), 1);
        assert_eq!(record.nodes().next().unwrap().domain_id(), Some("PROV_001"));
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&Tier::Deep).unwrap(), "\"deep\"");
        assert_eq!(Tier::Simple.as_str(), "simple");
    }

    #[test]
    fn test_session_id_generation() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
    }
}
