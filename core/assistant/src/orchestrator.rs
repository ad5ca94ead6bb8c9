//! Per-turn pipeline sequencing.
//!
//! Classify → ContextBuild → Plan → Execute×N (with inline repair) →
//! Enrich → Visualize → Synthesize → Persist. A plan with zero usable
//! queries short-circuits to a clarification request; every other stage
//! degrades to a partial result rather than aborting the turn. A memory
//! entry is appended whichever way the turn ends.

use fraudgraph_llm::LanguageModel;
use fraudgraph_schemas::{GraphRecord, NodeIdentity, TurnOutcome, TurnStatus};
use fraudgraph_store::GraphStore;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::session::Session;
use crate::{classifier, context, enrichment, executor, planner, prompts, synthesis, visualization};

pub async fn run_turn(
    store: &dyn GraphStore,
    model: &dyn LanguageModel,
    session: &mut Session,
    question: &str,
) -> TurnOutcome {
    let tier = classifier::classify(question);
    info!("Turn start ({} tier): {}", tier.as_str(), question);

    let schema = context::build_schema_context(tier, store).await;
    let memory_digest = session.memory_digest();
    let plan = planner::plan(model, &schema, &memory_digest, question, tier).await;

    if plan.queries.is_empty() {
        warn!("Planner produced no usable queries, aborting turn");
        session.remember(question, &plan.reasoning, "");
        return TurnOutcome {
            status: TurnStatus::AbortedNoQueries,
            finding: prompts::CLARIFICATION_REQUEST.to_string(),
            follow_ups: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            executed: Vec::new(),
            usage: session.usage(),
        };
    }

    let mut executions = Vec::with_capacity(plan.queries.len());
    for cypher in &plan.queries {
        executions.push(executor::execute_with_repair(store, model, cypher).await);
    }

    let enrichment_records = enrichment::enrich(store, &executions).await;

    let mut records: Vec<GraphRecord> = executions
        .iter()
        .flat_map(|exec| exec.rows.iter().cloned())
        .collect();
    records.extend(enrichment_records);

    // Interconnecting edges among everything fetched so far. A failure here
    // just means a sparser graph.
    let identities = node_identities(&records);
    if !identities.is_empty() {
        match store.relationships_for_nodes(&identities).await {
            Ok(rel_records) => records.extend(rel_records),
            Err(e) => warn!("Interconnecting edge fetch failed: {}", e),
        }
    }

    let root_id = enrichment::first_identifier(question);
    let (nodes, edges) = visualization::assemble(&records, root_id.as_deref());
    info!("Assembled {} nodes, {} edges", nodes.len(), edges.len());

    let (finding, follow_ups) =
        synthesis::synthesize(model, question, &plan.reasoning, &executions).await;

    let first_query = plan.queries.first().map(String::as_str).unwrap_or("");
    session.remember(question, &plan.reasoning, first_query);

    TurnOutcome {
        status: TurnStatus::Completed,
        finding,
        follow_ups,
        nodes,
        edges,
        executed: executions.iter().map(|exec| exec.audit_entry()).collect(),
        usage: session.usage(),
    }
}

/// Distinct node identities across the collected records, in first-seen
/// order.
fn node_identities(records: &[GraphRecord]) -> Vec<NodeIdentity> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut identities = Vec::new();
    for record in records {
        for node in record.nodes() {
            if seen.insert(node.identity.0.as_str()) {
                identities.push(node.identity.clone());
            }
        }
    }
    identities
}
