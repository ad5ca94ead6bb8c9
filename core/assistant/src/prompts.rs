//! Prompt templates and schema text for the investigation pipeline.
//!
//! Everything here is data. The templates embed the graph schema, canonical
//! investigation patterns, and the fixed delimiters the planner and
//! synthesis stages split model output on.

use fraudgraph_schemas::Tier;

/// Separates multiple queries in the query-generation response.
pub const QUERY_DELIMITER: &str = "---QUERY---";

/// Separates the finding from the follow-up questions in the synthesis
/// response.
pub const FOLLOW_UP_DELIMITER: &str = "---FOLLOW-UPS---";

/// Rendered into the planning prompt when the session has no history yet.
pub const NO_PRIOR_CONTEXT: &str = "No prior context.";

/// Substituted for the finding when the synthesis call fails.
pub const SYNTHESIS_FALLBACK: &str = "I wasn't able to produce a written analysis for this \
investigation. The graph visualization and the executed queries below still reflect everything \
that was found - please review them directly, or try rephrasing the question.";

/// Returned when the planner produced no usable queries.
pub const CLARIFICATION_REQUEST: &str = "I couldn't translate that question into a graph query. \
Could you rephrase it, or name a specific entity (a claim ID, provider, attorney, or vehicle) \
to start from?";

pub const REASONING_SYSTEM: &str = "You are a veteran P&C insurance SIU analyst with 20 years \
of fraud investigation experience. You plan investigations over a claims knowledge graph. \
Think in networks: fraud operates through relationships, not isolated transactions. Quantify \
everything and distinguish evidence from inference.";

pub const QUERY_WRITER_SYSTEM: &str = "You are a Cypher query writer for a Neo4j insurance \
knowledge graph. You output only query text, never commentary, never markdown.";

pub const SYNTHESIS_SYSTEM: &str = "You are a veteran P&C insurance SIU analyst presenting \
findings to your investigation team. You communicate with the precision and confidence of a \
seasoned investigator presenting to an SIU review board.";

pub const GRAPH_SCHEMA: &str = "\
=== INSURANCE KNOWLEDGE GRAPH SCHEMA ===

NODE TYPES AND PROPERTIES:
--------------------------
1. Claim - Insurance claim record
   Properties: id, claim_amount, claim_date, incident_type, status, claim_type
   status values: 'Open', 'Closed', 'Paid', 'Denied - Fraud'
   claim_type values: 'Bodily Injury', 'Property Damage Only'

2. Person - Individuals involved in insurance operations
   Properties: id, name, role, license
   role values: 'Claimant', 'Witness', 'Driver', 'Passenger', 'Owner', 'Policyholder', 'Adjuster'
   Note: All individuals use the :Person label. There are no separate :Claimant or :Adjuster labels.

3. Provider - Medical providers, clinics, treatment facilities
   Properties: id, name, type, specialty, status, npi, opened_date, revocation_date
   status values: 'Active', 'License Revoked'

4. Attorney - Legal representatives
   Properties: id, name, firm, firm_type, specialty, status, bar_number

5. Vehicle - Insured vehicles
   Properties: id, vin, make, model, year, color, value

6. Policy - Insurance policies
   Properties: id, policy_number, bind_date, premium, coverage_type

7. Address - Physical addresses
   Properties: id, street, city, state, zip, type

8. Phone - Phone numbers, device identifiers, fax numbers
   Properties: id, number, type
   type values: 'Mobile', 'Office', 'Fax', 'Mobile Device Fingerprint'

9. Location - Accident/incident locations
   Properties: id, name, type, area

10. Insurer - Insurance carrier
    Properties: id, name

RELATIONSHIPS:
--------------
(Claim)-[:FILED_BY {role}]->(Person)
(Claim)-[:TREATED_AT]->(Provider)
(Claim)-[:REPRESENTED_BY {hours_to_retain}]->(Attorney)
(Claim)-[:HANDLED_BY]->(Person)
(Claim)-[:WITNESSED_BY]->(Person)
(Claim)-[:OCCURRED_AT]->(Location)
(Claim)-[:INVOLVES_VEHICLE]->(Vehicle)
(Claim)-[:INVOLVED {role}]->(Person)
(Claim)-[:UNDER_POLICY]->(Policy)
(Person)-[:HAS_PHONE]->(Phone)
(Person)-[:LIVES_AT]->(Address)
(Person)-[:HAS_POLICY]->(Policy)
(Policy)-[:COVERS]->(Vehicle)
(Policy)-[:INSURED_BY]->(Insurer)
(Attorney)-[:HAS_PHONE]->(Phone)
(Provider)-[:LOCATED_AT]->(Address)
(Attorney)-[:LOCATED_AT]->(Address)
(Provider)-[:OWNED_BY]->(Person)
(Person)-[:FORMER_EMPLOYEE_OF {role, dates, end_reason}]->(Provider)
";

/// Compact schema for simple-tier questions: node types with key properties,
/// plus the full relationship list (directions matter even for lookups).
pub const COMPACT_SCHEMA: &str = "\
=== INSURANCE KNOWLEDGE GRAPH (COMPACT) ===

NODE TYPES (key properties):
  Claim (id, claim_amount, claim_date, status, claim_type)
  Person (id, name, role)
  Provider (id, name, type, status)
  Attorney (id, name, firm)
  Vehicle (id, vin, make, model)
  Policy (id, policy_number, bind_date)
  Address (id, street, city)
  Phone (id, number, type)
  Location (id, name, type)
  Insurer (id, name)

RELATIONSHIPS (direction matters - most originate from Claim):
(Claim)-[:FILED_BY]->(Person)
(Claim)-[:TREATED_AT]->(Provider)
(Claim)-[:REPRESENTED_BY]->(Attorney)
(Claim)-[:HANDLED_BY]->(Person)
(Claim)-[:WITNESSED_BY]->(Person)
(Claim)-[:OCCURRED_AT]->(Location)
(Claim)-[:INVOLVES_VEHICLE]->(Vehicle)
(Claim)-[:UNDER_POLICY]->(Policy)
(Person)-[:HAS_PHONE]->(Phone)
(Person)-[:LIVES_AT]->(Address)
(Person)-[:HAS_POLICY]->(Policy)
(Policy)-[:COVERS]->(Vehicle)
(Attorney)-[:HAS_PHONE]->(Phone)
(Provider)-[:LOCATED_AT]->(Address)
(Provider)-[:OWNED_BY]->(Person)
";

pub const INVESTIGATION_GUIDE: &str = "
RELATIONSHIP CHAINS FOR COMMON INVESTIGATIONS:
- Insurance chain: Person -[:HAS_POLICY]-> Policy -[:COVERS]-> Vehicle; Claim -[:UNDER_POLICY]-> Policy
- Treatment chain: Claim -[:TREATED_AT]-> Provider; Claim -[:REPRESENTED_BY]-> Attorney
- Identity chain: Person -[:HAS_PHONE]-> Phone; Person -[:LIVES_AT]-> Address; Attorney -[:HAS_PHONE]-> Phone
- Corporate chain: Provider -[:OWNED_BY]-> Person -[:FORMER_EMPLOYEE_OF]-> Provider
- Incident chain: Claim -[:OCCURRED_AT]-> Location; Claim -[:INVOLVES_VEHICLE]-> Vehicle

INVESTIGATION PATTERNS (analytical templates, not answers):
- Provider assessment: claim volume, attorney concentration ratio, peer benchmarks via aggregation
- Network mapping: start with a 1-hop neighborhood, look for shared connections between entities
- Temporal analysis: compare dates across connected entities (bind_date vs claim_date)
- Identity linkage: trace through Phone and Address nodes to find hidden connections between People
- Corporate tracing: follow OWNED_BY and FORMER_EMPLOYEE_OF chains

DATA VOLUME CONTEXT:
- Fraud patterns emerge from relationship density and structural anomalies, not from any single node property
";

/// Just the relationship directions. Embedded in the repair prompt to keep
/// it small; wrong-direction edges are the most common query error.
pub const RELATIONSHIP_DIRECTIONS: &str = "\
CANONICAL RELATIONSHIP DIRECTIONS (most edges originate from Claim):
(Claim)-[:FILED_BY]->(Person)
(Claim)-[:TREATED_AT]->(Provider)
(Claim)-[:REPRESENTED_BY]->(Attorney)
(Claim)-[:HANDLED_BY]->(Person)
(Claim)-[:WITNESSED_BY]->(Person)
(Claim)-[:OCCURRED_AT]->(Location)
(Claim)-[:INVOLVES_VEHICLE]->(Vehicle)
(Claim)-[:INVOLVED]->(Person)
(Claim)-[:UNDER_POLICY]->(Policy)
(Person)-[:HAS_PHONE]->(Phone)
(Person)-[:LIVES_AT]->(Address)
(Person)-[:HAS_POLICY]->(Policy)
(Policy)-[:COVERS]->(Vehicle)
(Policy)-[:INSURED_BY]->(Insurer)
(Attorney)-[:HAS_PHONE]->(Phone)
(Provider)-[:LOCATED_AT]->(Address)
(Attorney)-[:LOCATED_AT]->(Address)
(Provider)-[:OWNED_BY]->(Person)
(Person)-[:FORMER_EMPLOYEE_OF]->(Provider)
";

const SIMPLE_EXAMPLES: &str = "\
EXAMPLE
Question: Show claim CLM_001
---QUERY---
MATCH (c:Claim {id: 'CLM_001'})
OPTIONAL MATCH (c)-[r]->(connected)
RETURN c, r, connected

EXAMPLE
Question: What is the status of provider PROV_S1_MAIN?
---QUERY---
MATCH (p:Provider {id: 'PROV_S1_MAIN'})
RETURN p
";

const DEEP_EXAMPLES: &str = "\
EXAMPLE
Question: Show me providers with the most claims and their attorney links
---QUERY---
MATCH (p:Provider)<-[:TREATED_AT]-(c:Claim)
WITH p, count(c) AS claim_count
ORDER BY claim_count DESC LIMIT 5
MATCH (p)<-[r:TREATED_AT]-(c2:Claim)
RETURN p, r, c2, claim_count LIMIT 50
---QUERY---
MATCH (p:Provider)<-[:TREATED_AT]-(c:Claim)-[rep:REPRESENTED_BY]->(a:Attorney)
WITH p, a, count(c) AS shared_claims
WHERE shared_claims > 3
MATCH (a)-[hp:HAS_PHONE]->(ph:Phone)
RETURN p, a, ph, hp, shared_claims LIMIT 50

EXAMPLE
Question: Are there attorneys sharing the same fax number?
---QUERY---
MATCH (a1:Attorney)-[r1:HAS_PHONE]->(ph:Phone {type: 'Fax'})<-[r2:HAS_PHONE]-(a2:Attorney)
WHERE a1.id < a2.id
RETURN a1, r1, ph, r2, a2
";

pub fn reasoning_prompt(schema: &str, memory_digest: &str, question: &str) -> String {
    format!(
        "You are planning a fraud investigation over a Neo4j insurance knowledge graph.\n\n\
         GRAPH SCHEMA:\n{schema}\n\n\
         INVESTIGATION CONTEXT (recent questions):\n{memory_digest}\n\n\
         USER QUESTION: {question}\n\n\
         Describe, in plain prose, how you would investigate this question:\n\
         1. What is the user actually asking? Restate it in precise investigation terms.\n\
         2. Which entities and relationships are central? Which graph patterns would answer it?\n\
         3. What should the first query establish, and what (if anything) should a second query \
         corroborate or expand?\n\n\
         Do NOT write any query syntax. Respond with 2-4 short numbered points."
    )
}

pub fn query_generation_prompt(
    schema: &str,
    reasoning: &str,
    question: &str,
    tier: Tier,
) -> String {
    let examples = match tier {
        Tier::Simple => SIMPLE_EXAMPLES,
        Tier::Deep => DEEP_EXAMPLES,
    };
    format!(
        "Write Cypher for a Neo4j insurance knowledge graph.\n\n\
         GRAPH SCHEMA:\n{schema}\n\n\
         {directions}\n\
         INVESTIGATION APPROACH:\n{reasoning}\n\n\
         USER QUESTION: {question}\n\n\
         GUIDELINES:\n\
         - Return nodes AND relationships for visualization: prefer RETURN a, r, b patterns\n\
         - Use OPTIONAL MATCH for secondary data to avoid losing primary results\n\
         - Include aggregations (count, sum, avg) when the question implies comparison\n\
         - LIMIT large result sets to 50 rows\n\
         - Write 1 or 2 queries. If you write two, the first answers the core question and \
         the second expands or corroborates.\n\n\
         {examples}\n\
         OUTPUT FORMAT: only query text. Precede EACH query with a line containing exactly \
         {delimiter}. No markdown fences, no commentary.",
        directions = RELATIONSHIP_DIRECTIONS,
        delimiter = QUERY_DELIMITER,
    )
}

pub fn repair_prompt(failed_query: &str, error_message: &str) -> String {
    format!(
        "This Cypher query failed against a Neo4j insurance knowledge graph.\n\n\
         FAILED QUERY:\n{failed_query}\n\n\
         ERROR:\n{error_message}\n\n\
         {RELATIONSHIP_DIRECTIONS}\n\
         Write a corrected version of the query. The most common mistake is a reversed \
         relationship direction. Respond with ONLY the corrected query text - no fences, \
         no explanation."
    )
}

pub fn synthesis_prompt(question: &str, reasoning: &str, results_json: &str) -> String {
    format!(
        "ORIGINAL QUESTION: {question}\n\n\
         INVESTIGATION SUMMARY:\n{reasoning}\n\n\
         EVIDENCE (query results):\n{results_json}\n\n\
         Synthesize your findings following this structure:\n\n\
         **FINDING**: One-sentence headline of what the data shows.\n\n\
         **EVIDENCE**: Cite specific entities, relationships, and numbers from the results. \
         Name names, reference claim IDs, state dollar amounts.\n\n\
         **SEVERITY**: One of ROUTINE, NOTABLE, CONCERNING, CRITICAL.\n\n\
         **EXPOSURE**: Quantify dollar impact where possible, using sums, counts, and \
         averages from the data.\n\n\
         **NEXT STEPS**: 2-4 specific, actionable recommendations.\n\n\
         GUIDELINES:\n\
         - Be precise: \"the clinic treated 45 claimants, all represented by 3 attorneys \
         sharing one fax\" - not \"there seem to be some connections\"\n\
         - Distinguish between what the data SHOWS and what it SUGGESTS\n\
         - If results are empty or inconclusive, say so directly\n\n\
         After the finding, emit a line containing exactly {delimiter}, then up to 3 \
         suggested follow-up questions, one per line.",
        delimiter = FOLLOW_UP_DELIMITER,
    )
}

/// Canned questions surfaced to the UI collaborator.
pub const QUICK_QUERIES: &[&str] = &[
    "Show me the highest-volume providers and their attorney connections",
    "Which claims have the largest dollar exposure?",
    "Find providers with above-average claim amounts",
    "Are there attorneys sharing the same fax phone number?",
    "Show all claims connected to Vehicle VEH_S3_MAIN",
    "What providers have had their licenses revoked?",
    "Find people who appear in multiple claims in different roles",
    "Show the complete network around Provider PROV_S1_MAIN",
    "Which attorneys represent the most claimants?",
    "Find claims where policy bind date is close to claim date",
];
