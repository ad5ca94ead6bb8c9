//! Final narrative synthesis over the turn's accumulated evidence.

use fraudgraph_llm::LanguageModel;
use fraudgraph_schemas::{GraphValue, QueryExecution};
use serde_json::{json, Value};
use tracing::warn;

use crate::prompts;

/// Row cap per query when serializing evidence into the prompt.
const MAX_ROWS_PER_QUERY: usize = 15;

const MAX_FOLLOW_UPS: usize = 3;

/// One model call turning question + reasoning + results into a structured
/// finding and up to three follow-up questions. A failed call substitutes
/// the fixed fallback message - the turn still completes with whatever graph
/// data was gathered.
pub async fn synthesize(
    model: &dyn LanguageModel,
    question: &str,
    reasoning: &str,
    executions: &[QueryExecution],
) -> (String, Vec<String>) {
    let evidence = serialize_executions(executions);
    let evidence_json =
        serde_json::to_string_pretty(&evidence).unwrap_or_else(|_| "[]".to_string());
    let prompt = prompts::synthesis_prompt(question, reasoning, &evidence_json);

    match model
        .call(&prompt, Some(prompts::SYNTHESIS_SYSTEM), 0.3, 1200)
        .await
    {
        Ok(response) => parse_synthesis(&response),
        Err(e) => {
            warn!("Synthesis call failed, using fallback message: {}", e);
            (prompts::SYNTHESIS_FALLBACK.to_string(), Vec::new())
        }
    }
}

/// Split on the follow-up delimiter; a response without it is all finding.
fn parse_synthesis(response: &str) -> (String, Vec<String>) {
    match response.split_once(prompts::FOLLOW_UP_DELIMITER) {
        Some((finding, tail)) => {
            let follow_ups: Vec<String> = tail
                .lines()
                .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
                .filter(|line| !line.is_empty())
                .take(MAX_FOLLOW_UPS)
                .map(str::to_string)
                .collect();
            (finding.trim().to_string(), follow_ups)
        }
        None => (response.trim().to_string(), Vec::new()),
    }
}

/// Evidence payload for the synthesis prompt: per query, the Cypher text and
/// up to [`MAX_ROWS_PER_QUERY`] rows. Node cells flatten to their property
/// maps, edge cells to a `[:TYPE]` tag, mirroring what an analyst would read
/// off a result table.
pub(crate) fn serialize_executions(executions: &[QueryExecution]) -> Value {
    let queries: Vec<Value> = executions
        .iter()
        .enumerate()
        .map(|(i, exec)| {
            if exec.failed {
                let error = exec.error.as_deref().unwrap_or("query did not resolve");
                json!({
                    "query_index": i + 1,
                    "cypher": exec.cypher,
                    "error": error,
                })
            } else {
                let data: Vec<Value> = exec
                    .rows
                    .iter()
                    .take(MAX_ROWS_PER_QUERY)
                    .map(serialize_row)
                    .collect();
                json!({
                    "query_index": i + 1,
                    "cypher": exec.cypher,
                    "result_count": exec.row_count,
                    "auto_corrected": exec.auto_corrected,
                    "data": data,
                })
            }
        })
        .collect();
    Value::Array(queries)
}

fn serialize_row(row: &fraudgraph_schemas::GraphRecord) -> Value {
    let mut object = serde_json::Map::new();
    for (column, value) in &row.cells {
        let cell = match value {
            GraphValue::Node(node) => Value::Object(node.properties.clone()),
            GraphValue::Edge(edge) => Value::String(format!("[:{}]", edge.edge_type)),
            GraphValue::Scalar(scalar) => scalar.clone(),
        };
        object.insert(column.clone(), cell);
    }
    Value::Object(object)
}
