//! Two-stage investigation planning.
//!
//! First model call produces a plain-prose investigative approach; the second
//! turns that approach into delimiter-separated Cypher. Either call failing
//! yields an empty query list rather than an error - the orchestrator turns
//! an empty plan into a clarification request.

use fraudgraph_llm::LanguageModel;
use fraudgraph_schemas::{InvestigationPlan, Tier};
use tracing::{debug, warn};

use crate::prompts;

/// Hard cap on planned queries per turn.
pub const MAX_QUERIES: usize = 2;

pub async fn plan(
    model: &dyn LanguageModel,
    schema: &str,
    memory_digest: &str,
    question: &str,
    tier: Tier,
) -> InvestigationPlan {
    let reasoning_prompt = prompts::reasoning_prompt(schema, memory_digest, question);
    let reasoning = match model
        .call(&reasoning_prompt, Some(prompts::REASONING_SYSTEM), 0.2, 400)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!("Reasoning call failed, aborting plan: {}", e);
            return InvestigationPlan::empty();
        }
    };

    debug!("Investigation approach ({} tier): {}", tier.as_str(), reasoning);

    let generation_prompt = prompts::query_generation_prompt(schema, &reasoning, question, tier);
    let queries = match model
        .call(
            &generation_prompt,
            Some(prompts::QUERY_WRITER_SYSTEM),
            0.1,
            800,
        )
        .await
    {
        Ok(raw) => parse_queries(&raw),
        Err(e) => {
            warn!("Query generation call failed: {}", e);
            Vec::new()
        }
    };

    InvestigationPlan { reasoning, queries }
}

/// Parse the query-generation response into at most [`MAX_QUERIES`] query
/// strings. A response with no delimiter at all is accepted as a single bare
/// query (models occasionally return one fenced query and nothing else).
fn parse_queries(raw: &str) -> Vec<String> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut queries: Vec<String> = cleaned
        .split(prompts::QUERY_DELIMITER)
        .map(|segment| strip_code_fences(segment))
        .filter(|segment| !segment.is_empty())
        .collect();
    queries.truncate(MAX_QUERIES);
    queries
}

/// Remove surrounding markdown code fences (with or without a language tag)
/// and trim.
pub(crate) fn strip_code_fences(text: &str) -> String {
    let mut cleaned = text.trim();
    if cleaned.starts_with("```") {
        cleaned = match cleaned.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        };
    }
    if let Some(stripped) = cleaned.trim_end().strip_suffix("```") {
        cleaned = stripped;
    }
    cleaned.trim().to_string()
}
