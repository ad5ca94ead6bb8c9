//! Converts accumulated graph records into a deduplicated, render-ready
//! node/edge set.
//!
//! Assembly is two-phase: all nodes first, then edges filtered to endpoints
//! already present. Edges referencing unseen nodes are dropped silently -
//! never turned into placeholder nodes. Output order follows input order, so
//! the same record set always assembles to the same lists.

use fraudgraph_schemas::{GraphEdge, GraphNode, GraphRecord, VisualizationEdge, VisualizationNode};
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_COLOR: &str = "#AAB7B8";
const NODE_SIZE: u32 = 30;
const ROOT_SIZE: u32 = 50;
const MAX_LABEL_CHARS: usize = 20;

/// Category resolution order when a node carries multiple labels.
const LABEL_PRIORITY: &[&str] = &[
    "Claimant", "Witness", "Adjuster", "Employee", "Provider", "Attorney", "BodyShop", "Address",
    "Phone", "Location", "Claim", "Person", "Vehicle", "Policy", "Firm", "Insurer",
];

const COLOR_MAP: &[(&str, &str)] = &[
    ("Claim", "#4A90A4"),
    ("Claimant", "#5DADE2"),
    ("Witness", "#85C1E9"),
    ("Adjuster", "#58D68D"),
    ("Employee", "#48C9B0"),
    ("Provider", "#AF7AC5"),
    ("Attorney", "#F5B041"),
    ("BodyShop", "#EB984E"),
    ("Address", "#45B7A0"),
    ("Phone", "#5499C7"),
    ("Location", "#9B7ED9"),
    ("Vehicle", "#E74C3C"),
    ("Person", "#5DADE2"),
    ("Firm", "#D35400"),
    ("Policy", "#34495E"),
    ("Insurer", "#1A5276"),
];

const RELATIONSHIP_LABELS: &[(&str, &str)] = &[
    ("FILED_BY", "filed by"),
    ("TREATED_AT", "treated at"),
    ("REPRESENTED_BY", "represented by"),
    ("HANDLED_BY", "handled by"),
    ("WITNESSED_BY", "witnessed by"),
    ("OCCURRED_AT", "occurred at"),
    ("INVOLVES_VEHICLE", "involves"),
    ("LIVES_AT", "lives at"),
    ("HAS_PHONE", "uses device"),
    ("COVERS", "covers"),
    ("HAS_POLICY", "policyholder"),
    ("UNDER_POLICY", "under policy"),
    ("INSURED_BY", "insured by"),
    ("LOCATED_AT", "located at"),
    ("OWNED_BY", "owned by"),
    ("FORMER_EMPLOYEE_OF", "formerly employed at"),
    ("INVOLVED", "involved in"),
];

pub fn assemble(
    records: &[GraphRecord],
    root_id: Option<&str>,
) -> (Vec<VisualizationNode>, Vec<VisualizationEdge>) {
    let mut nodes = Vec::new();
    let mut seen_nodes: HashSet<String> = HashSet::new();

    for record in records {
        for node in record.nodes() {
            if !seen_nodes.insert(node.identity.0.clone()) {
                continue;
            }
            nodes.push(build_node(node, root_id));
        }
    }

    let mut edges = Vec::new();
    let mut seen_edges: HashSet<(String, String, String)> = HashSet::new();

    for record in records {
        for edge in record.edges() {
            if !seen_nodes.contains(&edge.source.0) || !seen_nodes.contains(&edge.target.0) {
                continue;
            }
            let key = (
                edge.source.0.clone(),
                edge.target.0.clone(),
                edge.edge_type.clone(),
            );
            if !seen_edges.insert(key) {
                continue;
            }
            edges.push(build_edge(edge));
        }
    }

    (nodes, edges)
}

fn build_node(node: &GraphNode, root_id: Option<&str>) -> VisualizationNode {
    let category = node_category(&node.labels);
    let name = display_name(node);
    let is_root = matches!((root_id, node.domain_id()), (Some(root), Some(id)) if root == id);

    let color = COLOR_MAP
        .iter()
        .find(|(label, _)| *label == category)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR);

    VisualizationNode {
        id: node.identity.0.clone(),
        label: truncate_label(&name),
        category: category.to_string(),
        color: color.to_string(),
        size: if is_root { ROOT_SIZE } else { NODE_SIZE },
        shape: if is_root { "star" } else { "dot" }.to_string(),
        is_root,
        tooltip: build_tooltip(node, category, &name),
    }
}

fn build_edge(edge: &GraphEdge) -> VisualizationEdge {
    let mut label = RELATIONSHIP_LABELS
        .iter()
        .find(|(edge_type, _)| *edge_type == edge.edge_type)
        .map(|(_, phrase)| phrase.to_string())
        .unwrap_or_else(|| edge.edge_type.replace('_', " ").to_lowercase());

    if let Some(role) = edge.properties.get("role").and_then(Value::as_str) {
        label = format!("{} ({})", label, role);
    }

    VisualizationEdge {
        source: edge.source.0.clone(),
        target: edge.target.0.clone(),
        edge_type: edge.edge_type.clone(),
        label,
    }
}

/// First priority label wins; unlabeled nodes fall back to "Unknown".
fn node_category(labels: &[String]) -> &str {
    for priority in LABEL_PRIORITY {
        if labels.iter().any(|l| l == priority) {
            return priority;
        }
    }
    labels.first().map(String::as_str).unwrap_or("Unknown")
}

/// Fallback chain over the properties that different node types use as
/// their human-readable handle.
fn display_name(node: &GraphNode) -> String {
    for key in ["name", "number", "street", "vin"] {
        if let Some(value) = node.property_str(key) {
            return value.to_string();
        }
    }
    node.domain_id()
        .map(str::to_string)
        .unwrap_or_else(|| node.identity.0.clone())
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() > MAX_LABEL_CHARS {
        let truncated: String = name.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", truncated)
    } else {
        name.to_string()
    }
}

fn build_tooltip(node: &GraphNode, category: &str, name: &str) -> String {
    let mut lines = vec![
        format!("--- {} ---", category.to_uppercase()),
        format!("Name: {}", name),
    ];

    match category {
        "Claim" => {
            if let Some(amount) = node.properties.get("claim_amount").and_then(Value::as_f64) {
                lines.push(format!("Amount: {}", format_currency(amount)));
            }
            if let Some(status) = node.property_str("status") {
                lines.push(format!("Status: {}", status));
            }
            if let Some(incident) = node.property_str("incident_type") {
                lines.push(format!("Type: {}", incident));
            }
        }
        "Policy" => {
            if let Some(bind_date) = node.property_str("bind_date") {
                lines.push(format!("Bound: {}", bind_date));
            }
        }
        "Phone" => {
            if let Some(device) = node.property_str("type") {
                lines.push(format!("Device: {}", device));
            }
            if let Some(number) = node.property_str("number") {
                lines.push(format!("Number: {}", number));
            }
        }
        _ => {}
    }

    if let Some(id) = node.domain_id() {
        lines.push(format!("\nID: {}", id));
    }

    lines.join("\n")
}

fn format_currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudgraph_schemas::{GraphValue, NodeIdentity};
    use serde_json::{json, Map};

    fn node_value(identity: &str, labels: &[&str], props: serde_json::Value) -> GraphValue {
        GraphValue::Node(GraphNode {
            identity: NodeIdentity(identity.to_string()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: props.as_object().cloned().unwrap_or_default(),
        })
    }

    fn edge_value(source: &str, target: &str, edge_type: &str, props: serde_json::Value) -> GraphValue {
        GraphValue::Edge(GraphEdge {
            identity: format!("{}-{}", source, target),
            edge_type: edge_type.to_string(),
            source: NodeIdentity(source.to_string()),
            target: NodeIdentity(target.to_string()),
            properties: props.as_object().cloned().unwrap_or_default(),
        })
    }

    fn record(cells: Vec<GraphValue>) -> GraphRecord {
        GraphRecord {
            cells: cells
                .into_iter()
                .enumerate()
                .map(|(i, v)| (format!("c{}", i), v))
                .collect(),
        }
    }

    #[test]
    fn test_node_dedup_first_occurrence_wins() {
        let records = vec![
            record(vec![node_value(
                "4:ab:1",
                &["Provider"],
                json!({"id": "PROV_001", "name": "Metro Care Clinic"}),
            )]),
            record(vec![node_value(
                "4:ab:1",
                &["Provider"],
                json!({"id": "PROV_001", "name": "Renamed Clinic"}),
            )]),
        ];

        let (nodes, _) = assemble(&records, None);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "Metro Care Clinic");
    }

    #[test]
    fn test_orphan_edges_dropped() {
        let records = vec![record(vec![
            node_value("4:ab:1", &["Claim"], json!({"id": "CLM_001"})),
            edge_value("4:ab:1", "4:ab:99", "TREATED_AT", json!({})),
        ])];

        let (nodes, edges) = assemble(&records, None);

        assert_eq!(nodes.len(), 1);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_parallel_edges_collapse() {
        let base = vec![
            node_value("4:ab:1", &["Claim"], json!({"id": "CLM_001"})),
            node_value("4:ab:2", &["Provider"], json!({"id": "PROV_001"})),
            edge_value("4:ab:1", "4:ab:2", "TREATED_AT", json!({})),
        ];
        let records = vec![record(base.clone()), record(base)];

        let (nodes, edges) = assemble(&records, None);

        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].label, "treated at");
    }

    #[test]
    fn test_root_promotion() {
        let records = vec![record(vec![
            node_value("4:ab:1", &["Provider"], json!({"id": "PROV_S1_MAIN", "name": "Metro"})),
            node_value("4:ab:2", &["Claim"], json!({"id": "CLM_001"})),
        ])];

        let (nodes, _) = assemble(&records, Some("PROV_S1_MAIN"));

        assert!(nodes[0].is_root);
        assert_eq!(nodes[0].size, ROOT_SIZE);
        assert_eq!(nodes[0].shape, "star");
        assert!(!nodes[1].is_root);
        assert_eq!(nodes[1].size, NODE_SIZE);
    }

    #[test]
    fn test_category_priority_and_default_color() {
        assert_eq!(node_category(&["Person".to_string(), "Claimant".to_string()]), "Claimant");
        assert_eq!(node_category(&[]), "Unknown");

        let records = vec![record(vec![node_value(
            "4:ab:1",
            &["SomethingNew"],
            json!({"id": "X_001"}),
        )])];
        let (nodes, _) = assemble(&records, None);
        assert_eq!(nodes[0].color, DEFAULT_COLOR);
        assert_eq!(nodes[0].category, "SomethingNew");
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let phone = GraphNode {
            identity: NodeIdentity("4:ab:7".to_string()),
            labels: vec!["Phone".to_string()],
            properties: json!({"id": "FAX_S1_SHARED", "number": "555-0142", "type": "Fax"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        };
        assert_eq!(display_name(&phone), "555-0142");

        let bare = GraphNode {
            identity: NodeIdentity("4:ab:8".to_string()),
            labels: vec![],
            properties: Map::new(),
        };
        assert_eq!(display_name(&bare), "4:ab:8");
    }

    #[test]
    fn test_long_labels_truncated_full_name_in_tooltip() {
        let records = vec![record(vec![node_value(
            "4:ab:1",
            &["Provider"],
            json!({"id": "PROV_001", "name": "Extremely Long Provider Practice Name LLC"}),
        )])];

        let (nodes, _) = assemble(&records, None);

        assert!(nodes[0].label.ends_with("..."));
        assert_eq!(nodes[0].label.chars().count(), MAX_LABEL_CHARS + 3);
        assert!(nodes[0]
            .tooltip
            .contains("Extremely Long Provider Practice Name LLC"));
    }

    #[test]
    fn test_edge_role_suffix() {
        let records = vec![record(vec![
            node_value("4:ab:1", &["Claim"], json!({"id": "CLM_001"})),
            node_value("4:ab:2", &["Person"], json!({"id": "P_001"})),
            edge_value("4:ab:1", "4:ab:2", "FILED_BY", json!({"role": "Claimant"})),
        ])];

        let (_, edges) = assemble(&records, None);

        assert_eq!(edges[0].label, "filed by (Claimant)");
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let records = vec![
            record(vec![
                node_value("4:ab:1", &["Claim"], json!({"id": "CLM_001", "claim_amount": 4500})),
                node_value("4:ab:2", &["Provider"], json!({"id": "PROV_001", "name": "Metro"})),
                edge_value("4:ab:1", "4:ab:2", "TREATED_AT", json!({})),
            ]),
            record(vec![
                node_value("4:ab:3", &["Attorney"], json!({"id": "ATT_001", "name": "Stone"})),
                edge_value("4:ab:1", "4:ab:3", "REPRESENTED_BY", json!({})),
            ]),
        ];

        let first = assemble(&records, Some("CLM_001"));
        let second = assemble(&records, Some("CLM_001"));

        assert_eq!(first, second);
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency(45000.0), "$45,000");
        assert_eq!(format_currency(900.0), "$900");
        assert_eq!(format_currency(1234567.4), "$1,234,567");
    }
}
