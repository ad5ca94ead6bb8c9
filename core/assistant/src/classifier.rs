//! Question complexity classification.
//!
//! Pure keyword heuristic: a question carrying any relationship, comparison,
//! multi-entity, temporal, continuation, shared-infrastructure, or
//! historical-status signal gets the deep tier; anything else stays simple.
//! Absence of signal is itself the simple result, not an error.

use fraudgraph_schemas::Tier;

/// Signal phrases indicating a network- or comparison-style investigation.
/// Matched case-insensitively as substrings.
const DEEP_SIGNALS: &[&str] = &[
    // relationship / network language
    "connection",
    "connected",
    "network",
    "link",
    "related",
    "relationship",
    "between",
    "ring",
    // comparison / aggregation language
    "most",
    "highest",
    "largest",
    "average",
    "above-average",
    "compare",
    "more than",
    "how many",
    // multi-entity quantifiers
    "all claims",
    "all providers",
    "all attorneys",
    "multiple",
    "several",
    "every",
    // temporal language
    "bind date",
    "close to",
    "recent",
    "timeline",
    "before",
    "after",
    // investigative continuation
    "dig deeper",
    "expand",
    "what else",
    "follow up",
    // infrastructure sharing
    "share",
    "sharing",
    "same fax",
    "same phone",
    "same address",
    "same number",
    // historical status
    "revoked",
    "former",
    "previously",
    "used to",
];

/// Signal words matched on word boundaries. "top" as a substring would
/// misfire on "stop" or "laptop", but it must still catch "top-5" and a
/// question ending in "top".
const DEEP_SIGNAL_WORDS: &[&str] = &["top"];

/// Classify a question into a complexity tier. Deterministic,
/// case-insensitive substring matching; no side effects.
pub fn classify(question: &str) -> Tier {
    let lowered = question.to_lowercase();
    if DEEP_SIGNALS.iter().any(|signal| lowered.contains(signal)) {
        return Tier::Deep;
    }
    let mut words = lowered.split(|c: char| !c.is_alphanumeric());
    if words.any(|word| DEEP_SIGNAL_WORDS.contains(&word)) {
        Tier::Deep
    } else {
        Tier::Simple
    }
}
