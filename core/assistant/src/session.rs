//! Session-scoped conversational state.
//!
//! Memory entries, provider selection, and usage counters live for the chat
//! session, are mutated only at turn boundaries, and are cleared by an
//! explicit reset.

use chrono::Utc;
use fraudgraph_llm::UsageMeter;
use fraudgraph_schemas::{MemoryEntry, SessionId, UsageSnapshot};
use std::sync::Arc;

use crate::prompts;

/// Only this many of the most recent entries are read back into planning
/// prompts.
pub const MEMORY_READ_WINDOW: usize = 5;

/// Reasoning text is summarized into memory, not stored whole.
const MEMORY_REASONING_CHARS: usize = 300;

pub struct Session {
    pub id: SessionId,
    pub provider: String,
    memory: Vec<MemoryEntry>,
    meter: Arc<UsageMeter>,
}

impl Session {
    pub fn new(id: SessionId, provider: &str, meter: Arc<UsageMeter>) -> Self {
        Self {
            id,
            provider: provider.to_string(),
            memory: Vec::new(),
            meter,
        }
    }

    /// Append one entry after a completed (or aborted) turn.
    pub fn remember(&mut self, question: &str, reasoning: &str, first_query: &str) {
        let summary: String = reasoning.chars().take(MEMORY_REASONING_CHARS).collect();
        self.memory.push(MemoryEntry {
            question: question.to_string(),
            reasoning: summary,
            first_query: first_query.to_string(),
            recorded_at: Utc::now().to_rfc3339(),
        });
    }

    /// The recent-memory digest rendered into planning prompts: the last
    /// [`MEMORY_READ_WINDOW`] entries as question/approach pairs, or the
    /// fixed no-context sentinel.
    pub fn memory_digest(&self) -> String {
        if self.memory.is_empty() {
            return prompts::NO_PRIOR_CONTEXT.to_string();
        }
        let start = self.memory.len().saturating_sub(MEMORY_READ_WINDOW);
        self.memory[start..]
            .iter()
            .map(|entry| format!("User: {}\nApproach: {}\n", entry.question, entry.reasoning))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.meter.snapshot()
    }

    /// Clear conversation: memory and usage counters both reset.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.meter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudgraph_schemas::generate_session_id;

    fn session() -> Session {
        Session::new(generate_session_id(), "groq", UsageMeter::new())
    }

    #[test]
    fn test_empty_memory_uses_sentinel() {
        assert_eq!(session().memory_digest(), prompts::NO_PRIOR_CONTEXT);
    }

    #[test]
    fn test_digest_reads_only_recent_window() {
        let mut session = session();
        for i in 0..8 {
            session.remember(&format!("question {i}"), "approach", "MATCH (n) RETURN n");
        }

        let digest = session.memory_digest();
        assert!(!digest.contains("question 2"));
        assert!(digest.contains("question 3"));
        assert!(digest.contains("question 7"));
        assert_eq!(session.memory_len(), 8);
    }

    #[test]
    fn test_reasoning_truncated_in_memory() {
        let mut session = session();
        session.remember("q", &"x".repeat(1000), "");

        let digest = session.memory_digest();
        assert!(digest.len() < 500);
    }

    #[test]
    fn test_reset_clears_memory_and_usage() {
        let meter = UsageMeter::new();
        meter.record(400, 100);
        let mut session = Session::new(generate_session_id(), "azure_openai", meter);
        session.remember("q", "r", "");

        session.reset();

        assert_eq!(session.memory_len(), 0);
        assert_eq!(session.usage().llm_calls, 0);
        assert_eq!(session.memory_digest(), prompts::NO_PRIOR_CONTEXT);
    }
}
