use std::fmt;

use indexmap::IndexMap;
use log::{debug, error};
use thiserror::Error;
use uuid::Uuid;

use crate::color::Rgb;
use crate::geometry::{Point, Rect, Size};

pub const MIN_NODE_WIDTH: f32 = 100.0;
pub const MIN_NODE_HEIGHT: f32 = 60.0;

/// Opaque node identity. Random, so it never collides with ids of another
/// graph and is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Position of an edge in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeRef(pub usize);

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShapeKind {
    #[default]
    Process,
    Decision,
    Terminator,
    Io,
    Ellipse,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Process,
        ShapeKind::Decision,
        ShapeKind::Terminator,
        ShapeKind::Io,
        ShapeKind::Ellipse,
    ];

    /// Token used in project files.
    pub fn token(self) -> &'static str {
        match self {
            ShapeKind::Process => "rectangle",
            ShapeKind::Decision => "diamond",
            ShapeKind::Terminator => "start_end",
            ShapeKind::Io => "input_output",
            ShapeKind::Ellipse => "ellipse",
        }
    }

    /// Unknown tokens decay to `Process`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "diamond" | "decision" => ShapeKind::Decision,
            "start_end" => ShapeKind::Terminator,
            "input_output" => ShapeKind::Io,
            "ellipse" => ShapeKind::Ellipse,
            _ => ShapeKind::Process,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub fill: Rgb,
    pub border: Rgb,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: Rgb::LIGHT_BLUE,
            border: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    pub kind: ShapeKind,
    pub label: String,
    pub position: Point,
    size: Size,
    pub style: NodeStyle,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Sets the size, flooring it at the minimum node size.
    pub fn set_size(&mut self, size: Size) {
        self.size = size.max(Size::new(MIN_NODE_WIDTH, MIN_NODE_HEIGHT));
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Label to show, falling back to `fallback` (usually the node's DSL
    /// identifier) when the label is empty.
    pub fn display_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.label.is_empty() {
            fallback
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Empty means no label.
    pub label: String,
}

impl Edge {
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

/// Fields to change with [`Graph::update_node`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub kind: Option<ShapeKind>,
    pub label: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub fill: Option<Rgb>,
}

/// Model change notification, drained by whatever keeps a rendered view
/// of the graph in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeChanged(NodeId),
    NodeRemoved(NodeId),
    EdgeAdded(EdgeRef),
    EdgeChanged(EdgeRef),
    /// Later edges shift down by one position.
    EdgeRemoved(EdgeRef),
    Cleared,
    /// The whole graph was replaced by a load.
    Reloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("{0} does not exist")]
    EdgeNotFound(EdgeRef),
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
    events: Vec<GraphEvent>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        kind: ShapeKind,
        label: impl Into<String>,
        position: Point,
        size: Size,
        fill: Rgb,
    ) -> NodeId {
        let id = NodeId::fresh();
        let mut node = Node {
            id,
            kind,
            label: label.into(),
            position,
            size,
            style: NodeStyle {
                fill,
                ..NodeStyle::default()
            },
        };
        node.set_size(size);
        self.nodes.insert(id, node);
        self.events.push(GraphEvent::NodeAdded(id));
        id
    }

    /// Removes the node and every edge touching it. The edges go first so
    /// no dangling edge is ever stored.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(&id) {
            error!(node:% = id; "Cannot remove unknown node");
            return Err(GraphError::NodeNotFound(id));
        }

        let cascaded = self.edges_touching(id).count();
        let mut index = 0;
        while index < self.edges.len() {
            if self.edges[index].touches(id) {
                self.edges.remove(index);
                self.events.push(GraphEvent::EdgeRemoved(EdgeRef(index)));
            } else {
                index += 1;
            }
        }

        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        self.events.push(GraphEvent::NodeRemoved(id));
        debug!(node:% = id, edges = cascaded; "Removed node");
        Ok(node)
    }

    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: impl Into<String>,
    ) -> Result<EdgeRef, GraphError> {
        for id in [source, target] {
            if !self.nodes.contains_key(&id) {
                error!(node:% = id; "Cannot connect unknown node");
                return Err(GraphError::NodeNotFound(id));
            }
        }

        self.edges.push(Edge {
            source,
            target,
            label: label.into(),
        });
        let edge = EdgeRef(self.edges.len() - 1);
        self.events.push(GraphEvent::EdgeAdded(edge));
        Ok(edge)
    }

    pub fn remove_edge(&mut self, edge: EdgeRef) -> Result<Edge, GraphError> {
        if edge.0 >= self.edges.len() {
            error!(edge:% = edge; "Cannot remove unknown edge");
            return Err(GraphError::EdgeNotFound(edge));
        }
        let removed = self.edges.remove(edge.0);
        self.events.push(GraphEvent::EdgeRemoved(edge));
        Ok(removed)
    }

    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), GraphError> {
        let Some(node) = self.nodes.get_mut(&id) else {
            error!(node:% = id; "Cannot update unknown node");
            return Err(GraphError::NodeNotFound(id));
        };

        if let Some(kind) = patch.kind {
            node.kind = kind;
        }
        if let Some(label) = patch.label {
            node.label = label;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(size) = patch.size {
            node.set_size(size);
        }
        if let Some(fill) = patch.fill {
            node.style.fill = fill;
        }
        self.events.push(GraphEvent::NodeChanged(id));
        Ok(())
    }

    pub fn update_edge(&mut self, edge: EdgeRef, label: impl Into<String>) -> Result<(), GraphError> {
        let Some(stored) = self.edges.get_mut(edge.0) else {
            error!(edge:% = edge; "Cannot relabel unknown edge");
            return Err(GraphError::EdgeNotFound(edge));
        };
        stored.label = label.into();
        self.events.push(GraphEvent::EdgeChanged(edge));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.nodes.clear();
        self.events.push(GraphEvent::Cleared);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Position of the node in insertion order.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn edge(&self, edge: EdgeRef) -> Option<&Edge> {
        self.edges.get(edge.0)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_touching(&self, id: NodeId) -> impl Iterator<Item = (EdgeRef, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.touches(id))
            .map(|(i, e)| (EdgeRef(i), e))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topmost node (last inserted) whose rectangle contains `point`.
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|n| n.rect().contains(point))
            .map(Node::id)
    }

    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drops construction events and records a single `Reloaded` in their
    /// place, for graphs built off to the side and then swapped in.
    pub(crate) fn mark_reloaded(&mut self) {
        self.events.clear();
        self.events.push(GraphEvent::Reloaded);
    }
}
