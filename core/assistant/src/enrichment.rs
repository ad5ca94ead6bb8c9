//! Result enrichment: fetch neighborhoods for entities that query results
//! reference only by identifier.
//!
//! Planned queries often project scalar fields (a name, an id) instead of
//! whole nodes, which would leave dangling references absent from the
//! rendered graph. This stage scans results for identifier strings matching
//! the domain's id conventions, and pulls a bounded one-hop neighborhood for
//! each one not already fetched as a node.

use fraudgraph_schemas::{GraphRecord, GraphValue, QueryExecution};
use fraudgraph_store::GraphStore;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// At most this many neighborhood fetches per turn.
const MAX_CANDIDATES: usize = 5;

/// Row cap on each one-hop fetch.
const NEIGHBORHOOD_LIMIT: usize = 30;

/// Seeded entity id conventions. Longer prefixes first so `PROV_` and
/// `PHONE_` win over `P_`.
fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:PHONE|PROV|ADDR|CLM|ATT|VEH|POL|FAX|LOC|INS|P)_[A-Za-z0-9_]+\b").unwrap()
    })
}

/// First entity identifier mentioned in free text. The orchestrator uses
/// this on the question itself to designate the turn's root entity.
pub(crate) fn first_identifier(text: &str) -> Option<String> {
    id_pattern().find(text).map(|m| m.as_str().to_string())
}

pub async fn enrich(store: &dyn GraphStore, executions: &[QueryExecution]) -> Vec<GraphRecord> {
    let candidates = candidate_identifiers(executions);
    if candidates.is_empty() {
        return Vec::new();
    }

    debug!("Enriching {} unresolved identifiers", candidates.len());

    let mut records = Vec::new();
    for id in candidates {
        // Candidates match a word-character pattern, so the id is safe to
        // inline into the query text.
        let cypher = format!(
            "MATCH (n {{id: '{id}'}})-[r]-(m) RETURN n, r, m LIMIT {NEIGHBORHOOD_LIMIT}"
        );
        match store.run_query(&cypher).await {
            Ok(rows) => records.extend(rows),
            Err(e) => {
                warn!("Neighborhood fetch for {} failed, skipping: {}", id, e);
            }
        }
    }
    records
}

/// Identifier strings referenced in result data but not present among the
/// fetched nodes' domain ids. First occurrence order, capped at
/// [`MAX_CANDIDATES`].
pub(crate) fn candidate_identifiers(executions: &[QueryExecution]) -> Vec<String> {
    let mut fetched: HashSet<&str> = HashSet::new();
    for exec in executions {
        for row in &exec.rows {
            for node in row.nodes() {
                if let Some(id) = node.domain_id() {
                    fetched.insert(id);
                }
            }
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    for exec in executions {
        for row in &exec.rows {
            for (_, value) in &row.cells {
                let GraphValue::Scalar(scalar) = value else {
                    continue;
                };
                // Serializing covers strings nested in lists and maps too.
                let Ok(text) = serde_json::to_string(scalar) else {
                    continue;
                };
                for m in id_pattern().find_iter(&text) {
                    let id = m.as_str();
                    if fetched.contains(id) || !seen.insert(id.to_string()) {
                        continue;
                    }
                    candidates.push(id.to_string());
                    if candidates.len() == MAX_CANDIDATES {
                        return candidates;
                    }
                }
            }
        }
    }
    candidates
}
