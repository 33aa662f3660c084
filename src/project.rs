//! JSON project files.
//!
//! A project stores every node with its geometry and color plus the
//! connections between them, keyed by positional ids (`node0`, `node1`,
//! ...). Loading is lenient: missing fields take defaults and connections
//! to unknown ids are skipped.

use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;
use crate::geometry::{Point, Size};
use crate::graph::{Graph, NodeId, ShapeKind};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("project is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("project contains no nodes")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub nodes: Vec<ProjectNode>,
    #[serde(default)]
    pub connections: Vec<ProjectConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_coordinate")]
    pub x: f32,
    #[serde(default = "default_coordinate")]
    pub y: f32,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_color")]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConnection {
    #[serde(default)]
    pub start_id: Option<String>,
    #[serde(default)]
    pub end_id: Option<String>,
    #[serde(default)]
    pub label: String,
}

fn default_label() -> String {
    "Node".to_string()
}

fn default_kind() -> String {
    ShapeKind::Process.token().to_string()
}

fn default_coordinate() -> f32 {
    100.0
}

fn default_width() -> f32 {
    100.0
}

fn default_height() -> f32 {
    60.0
}

fn default_color() -> String {
    Rgb::LIGHT_BLUE.to_string()
}

pub fn to_project_data(graph: &Graph) -> ProjectFile {
    let names: HashMap<NodeId, String> = graph
        .node_ids()
        .enumerate()
        .map(|(i, id)| (id, format!("node{i}")))
        .collect();

    let nodes = graph
        .nodes()
        .map(|node| ProjectNode {
            id: Some(names[&node.id()].clone()),
            label: node.label.clone(),
            kind: node.kind.token().to_string(),
            x: node.position.x(),
            y: node.position.y(),
            width: node.size().width(),
            height: node.size().height(),
            color: node.style.fill.to_string(),
        })
        .collect();

    let connections = graph
        .edges()
        .iter()
        .map(|edge| ProjectConnection {
            start_id: names.get(&edge.source).cloned(),
            end_id: names.get(&edge.target).cloned(),
            label: edge.label.clone(),
        })
        .collect();

    ProjectFile { nodes, connections }
}

/// Pretty-printed project JSON. An empty graph has nothing to save.
pub fn to_project(graph: &Graph) -> Result<String, LoadError> {
    if graph.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(serde_json::to_string_pretty(&to_project_data(graph))?)
}

pub fn from_project(text: &str) -> Result<Graph, LoadError> {
    let data: ProjectFile = serde_json::from_str(text)?;
    graph_from_project(&data)
}

/// Builds a graph keeping the stored positions and sizes.
pub fn graph_from_project(data: &ProjectFile) -> Result<Graph, LoadError> {
    if data.nodes.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut graph = Graph::new();
    let mut symbols: HashMap<Option<&str>, NodeId> = HashMap::new();

    for node in &data.nodes {
        let fill = node.color.parse::<Rgb>().unwrap_or_else(|err| {
            warn!(color = node.color.as_str(), err = err.as_str(); "Using default fill");
            Rgb::default()
        });
        let id = graph.add_node(
            ShapeKind::from_token(&node.kind),
            node.label.clone(),
            Point::new(node.x, node.y),
            Size::new(node.width, node.height),
            fill,
        );
        symbols.insert(node.id.as_deref(), id);
    }

    for connection in &data.connections {
        let source = symbols.get(&connection.start_id.as_deref());
        let target = symbols.get(&connection.end_id.as_deref());
        let (Some(&source), Some(&target)) = (source, target) else {
            warn!(
                start = connection.start_id.as_deref().unwrap_or_default(),
                end = connection.end_id.as_deref().unwrap_or_default();
                "Skipping connection to unknown node"
            );
            continue;
        };
        let added = graph.add_edge(source, target, connection.label.clone());
        debug_assert!(added.is_ok(), "connected a node that was not loaded");
    }

    info!(nodes = graph.node_count(), edges = graph.edge_count(); "Loaded project");
    Ok(graph)
}
