use std::collections::HashMap;

use crate::graph::{Graph, NodeId, ShapeKind};

const INDENT: &str = "    ";

/// Serializes the graph as flowchart text. Identifiers are positional
/// (`node0`, `node1`, ...) and recomputed on every call.
pub fn to_dsl(graph: &Graph) -> String {
    let mut lines = vec!["flowchart TD".to_string()];

    if graph.is_empty() {
        lines.push(format!("{INDENT}%% No shapes on canvas"));
        return lines.join("\n");
    }

    let names: HashMap<NodeId, String> = graph
        .node_ids()
        .enumerate()
        .map(|(i, id)| (id, format!("node{i}")))
        .collect();

    for node in graph.nodes() {
        let name = &names[&node.id()];
        let text = escape_label(node.display_label(name));
        let shape = match node.kind {
            ShapeKind::Process => format!("[\"{text}\"]"),
            ShapeKind::Decision => format!("{{\"{text}\"}}"),
            ShapeKind::Ellipse => format!("((\"{text}\"))"),
            ShapeKind::Terminator => format!("(\"{text}\")"),
            ShapeKind::Io => format!("[/\"{text}\"/]"),
        };
        lines.push(format!("{INDENT}{name}{shape}"));
    }

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (names.get(&edge.source), names.get(&edge.target))
        else {
            continue;
        };
        if edge.label.is_empty() {
            lines.push(format!("{INDENT}{source} --> {target}"));
        } else {
            let label = escape_edge_label(&edge.label);
            lines.push(format!("{INDENT}{source} -->|{label}| {target}"));
        }
    }

    lines.join("\n")
}

fn escape_label(label: &str) -> String {
    label.replace('\n', "\\n").replace('"', "#quot;")
}

fn escape_edge_label(label: &str) -> String {
    label.replace('\n', "\\n").replace('|', "#124;")
}
