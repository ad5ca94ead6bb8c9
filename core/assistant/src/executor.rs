//! Query execution with a single model-assisted repair.
//!
//! A failed query gets exactly one correction attempt: the model sees the
//! failed text, the (capped) store error, and the relationship-direction
//! excerpt, and must answer with query text only. No further retries - a
//! query that fails twice is reported failed with zero rows.

use fraudgraph_llm::LanguageModel;
use fraudgraph_schemas::QueryExecution;
use fraudgraph_store::GraphStore;
use tracing::{info, warn};

use crate::planner::strip_code_fences;
use crate::prompts;

/// Store error messages are quoted in the repair prompt; keep them short.
const MAX_ERROR_CHARS: usize = 200;

pub async fn execute_with_repair(
    store: &dyn GraphStore,
    model: &dyn LanguageModel,
    cypher: &str,
) -> QueryExecution {
    let error = match store.run_query(cypher).await {
        Ok(rows) => {
            return QueryExecution {
                cypher: cypher.to_string(),
                row_count: rows.len(),
                rows,
                failed: false,
                auto_corrected: false,
                error: None,
            };
        }
        Err(e) => e,
    };

    let error_message: String = error.to_string().chars().take(MAX_ERROR_CHARS).collect();
    info!("Query failed, attempting repair: {}", error_message);

    let repair = prompts::repair_prompt(cypher, &error_message);
    let corrected = match model
        .call(&repair, Some(prompts::QUERY_WRITER_SYSTEM), 0.1, 500)
        .await
    {
        Ok(raw) => strip_code_fences(&raw),
        Err(e) => {
            warn!("Repair call failed: {}", e);
            return failed_execution(cypher, error_message);
        }
    };

    if corrected.is_empty() {
        return failed_execution(cypher, error_message);
    }

    match store.run_query(&corrected).await {
        Ok(rows) => {
            info!("Repaired query succeeded ({} rows)", rows.len());
            QueryExecution {
                cypher: corrected,
                row_count: rows.len(),
                rows,
                failed: false,
                auto_corrected: true,
                error: None,
            }
        }
        Err(e) => {
            warn!("Repaired query also failed: {}", e);
            let second: String = e.to_string().chars().take(MAX_ERROR_CHARS).collect();
            failed_execution(cypher, second)
        }
    }
}

/// Terminal failure: zero rows, the original query text for audit display,
/// plus the capped store error for the synthesis evidence block.
fn failed_execution(cypher: &str, error_message: String) -> QueryExecution {
    QueryExecution {
        cypher: cypher.to_string(),
        rows: Vec::new(),
        row_count: 0,
        failed: true,
        auto_corrected: false,
        error: Some(error_message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use fraudgraph_schemas::{GraphRecord, GraphValue, NodeIdentity};
    use fraudgraph_store::LabelCount;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Store whose run_query pops scripted outcomes and counts calls.
    struct ScriptedStore {
        outcomes: Mutex<Vec<Result<Vec<GraphRecord>, String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedStore {
        fn new(outcomes: Vec<Result<Vec<GraphRecord>, String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GraphStore for ScriptedStore {
        async fn run_query(&self, _cypher: &str) -> Result<Vec<GraphRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().unwrap().remove(0) {
                Ok(rows) => Ok(rows),
                Err(msg) => Err(anyhow!(msg)),
            }
        }

        async fn relationships_for_nodes(
            &self,
            _identities: &[NodeIdentity],
        ) -> Result<Vec<GraphRecord>> {
            Ok(Vec::new())
        }

        async fn label_counts(&self) -> Result<Vec<LabelCount>> {
            Ok(Vec::new())
        }
    }

    struct FixedModel {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn call(
            &self,
            _prompt: &str,
            _system: Option<&str>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(anyhow!(msg.clone())),
            }
        }
    }

    fn scalar_row() -> GraphRecord {
        GraphRecord {
            cells: vec![("n".to_string(), GraphValue::Scalar(json!(1)))],
        }
    }

    #[tokio::test]
    async fn test_success_needs_no_repair() {
        let store = ScriptedStore::new(vec![Ok(vec![scalar_row()])]);
        let model = FixedModel {
            response: Ok("unused".to_string()),
            calls: AtomicUsize::new(0),
        };

        let exec = execute_with_repair(&store, &model, "MATCH (n) RETURN n").await;

        assert!(!exec.failed);
        assert!(!exec.auto_corrected);
        assert_eq!(exec.row_count, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repair_succeeds_and_is_flagged() {
        let store = ScriptedStore::new(vec![
            Err("Invalid input 'FILES_CLAIM'".to_string()),
            Ok(vec![scalar_row()]),
        ]);
        let model = FixedModel {
            response: Ok("```cypher\nMATCH (c:Claim)-[:FILED_BY]->(p) RETURN c, p\n```".to_string()),
            calls: AtomicUsize::new(0),
        };

        let exec =
            execute_with_repair(&store, &model, "MATCH (p)-[:FILES_CLAIM]->(c) RETURN c, p").await;

        assert!(!exec.failed);
        assert!(exec.auto_corrected);
        assert_eq!(exec.cypher, "MATCH (c:Claim)-[:FILED_BY]->(p) RETURN c, p");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_failure_stops_after_one_repair() {
        let store = ScriptedStore::new(vec![
            Err("syntax error near MATCH".to_string()),
            Err("still broken".to_string()),
        ]);
        let model = FixedModel {
            response: Ok("MATCH (x) RETURN x".to_string()),
            calls: AtomicUsize::new(0),
        };

        let exec = execute_with_repair(&store, &model, "BAD QUERY").await;

        assert!(exec.failed);
        assert!(!exec.auto_corrected);
        assert_eq!(exec.row_count, 0);
        // Exactly two store attempts and one repair call, never more.
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(exec.cypher, "BAD QUERY");
        // The second failure's message is the one carried forward.
        assert_eq!(exec.error.as_deref(), Some("still broken"));
    }

    #[tokio::test]
    async fn test_repair_call_failure_reports_original() {
        let store = ScriptedStore::new(vec![Err("syntax error near MATCH".to_string())]);
        let model = FixedModel {
            response: Err("provider down".to_string()),
            calls: AtomicUsize::new(0),
        };

        let exec = execute_with_repair(&store, &model, "BAD QUERY").await;

        assert!(exec.failed);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(exec.cypher, "BAD QUERY");
        assert_eq!(exec.error.as_deref(), Some("syntax error near MATCH"));
    }

    #[tokio::test]
    async fn test_carried_error_is_capped() {
        let long_error = "x".repeat(500);
        let store = ScriptedStore::new(vec![Err(long_error.clone()), Err(long_error)]);
        let model = FixedModel {
            response: Ok("MATCH (x) RETURN x".to_string()),
            calls: AtomicUsize::new(0),
        };

        let exec = execute_with_repair(&store, &model, "BAD QUERY").await;

        assert_eq!(exec.error.as_ref().unwrap().chars().count(), MAX_ERROR_CHARS);
    }
}
