//! Tier-appropriate schema context for the planner.

use fraudgraph_schemas::Tier;
use fraudgraph_store::GraphStore;
use tracing::warn;

use crate::prompts;

/// Build the schema text handed to the planning prompts.
///
/// Simple tier gets the compact static schema plus the pattern library and
/// never touches the store. Deep tier adds live per-label node counts so the
/// model can calibrate "common" vs "rare"; a failed store call degrades
/// silently to the static portion. This never errors and never blocks the
/// turn.
pub async fn build_schema_context(tier: Tier, store: &dyn GraphStore) -> String {
    match tier {
        Tier::Simple => format!(
            "{}{}",
            prompts::COMPACT_SCHEMA,
            prompts::INVESTIGATION_GUIDE
        ),
        Tier::Deep => {
            let mut schema = format!("{}{}", prompts::GRAPH_SCHEMA, prompts::INVESTIGATION_GUIDE);

            match store.label_counts().await {
                Ok(counts) if !counts.is_empty() => {
                    schema.push_str("\nLIVE DATABASE SUMMARY:\n");
                    for entry in counts {
                        schema.push_str(&format!("  - {}: {} nodes\n", entry.label, entry.count));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Live schema stats unavailable, using static schema only: {}", e);
                }
            }

            schema
        }
    }
}
