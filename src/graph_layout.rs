use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{info, warn};
use serde::Deserialize;

use crate::geometry::Point;
use crate::graph::{Graph, GraphError, NodeId, NodePatch};

/// Spacing of the layered layout. Node width and height here are the
/// nominal slot size used for centering, not the nodes' actual sizes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub horizontal_separation: f32,
    pub vertical_separation: f32,
    pub node_width: f32,
    pub node_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_separation: 150.0,
            vertical_separation: 150.0,
            node_width: 100.0,
            node_height: 60.0,
        }
    }
}

/// Visible area the laid out block is centered in.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layering {
    /// Nodes per layer, each in insertion order.
    pub layers: Vec<Vec<NodeId>>,
    /// Nodes that could not be layered because of a cycle. Each got a
    /// layer of its own after the regular ones.
    pub fallback: Vec<NodeId>,
}

impl Layering {
    pub fn layer_of(&self, id: NodeId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(&id))
    }
}

/// Top-left position for every node, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub positions: IndexMap<NodeId, Point>,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Layer 0 holds the nodes without predecessors; every later layer
    /// holds the nodes whose predecessors all sit in earlier layers.
    pub fn assign_layers(&self, graph: &Graph) -> Layering {
        let ids: Vec<NodeId> = graph.node_ids().collect();

        let mut predecessors: HashMap<NodeId, Vec<NodeId>> =
            ids.iter().map(|&id| (id, Vec::new())).collect();
        for edge in graph.edges() {
            predecessors
                .entry(edge.target)
                .or_default()
                .push(edge.source);
        }

        let mut layered: HashSet<NodeId> = HashSet::new();
        let mut layers: Vec<Vec<NodeId>> = Vec::new();

        loop {
            let next: Vec<NodeId> = ids
                .iter()
                .copied()
                .filter(|id| !layered.contains(id))
                .filter(|id| predecessors[id].iter().all(|p| layered.contains(p)))
                .collect();
            if next.is_empty() {
                break;
            }
            layered.extend(next.iter().copied());
            layers.push(next);
        }

        let fallback: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| !layered.contains(id))
            .collect();
        if !fallback.is_empty() {
            warn!(
                nodes = fallback.len(),
                first_layer = layers.len();
                "Cycle detected, stacking remaining nodes one per layer"
            );
        }
        layers.extend(fallback.iter().map(|&id| vec![id]));

        Layering { layers, fallback }
    }

    pub fn place(&self, graph: &Graph, viewport: Viewport) -> Placement {
        let layering = self.assign_layers(graph);
        if layering.layers.is_empty() {
            return Placement::default();
        }

        let LayoutConfig {
            horizontal_separation: hsep,
            vertical_separation: vsep,
            node_width,
            node_height,
        } = self.config;

        let row_width = |n: usize| (n as f32 - 1.0) * hsep + node_width;
        let max_width = layering
            .layers
            .iter()
            .map(|layer| row_width(layer.len()))
            .fold(node_width, f32::max);
        let total_height = (layering.layers.len() as f32 - 1.0) * vsep + node_height;

        let offset_x = viewport.width / 2.0 - max_width / 2.0;
        let offset_y = viewport.height / 2.0 - total_height / 2.0;

        let mut by_node: HashMap<NodeId, Point> = HashMap::new();
        for (layer_idx, layer) in layering.layers.iter().enumerate() {
            let start_x = (max_width - row_width(layer.len())) / 2.0;
            let y = layer_idx as f32 * vsep;
            for (i, &id) in layer.iter().enumerate() {
                let x = start_x + i as f32 * hsep;
                by_node.insert(id, Point::new(x + offset_x, y + offset_y));
            }
        }

        let positions = graph
            .node_ids()
            .filter_map(|id| by_node.get(&id).map(|&p| (id, p)))
            .collect();
        Placement { positions }
    }

    /// Moves every node to its layered position. Sizes are left alone.
    pub fn apply(&self, graph: &mut Graph, viewport: Viewport) -> Result<(), GraphError> {
        let placement = self.place(graph, viewport);
        if placement.positions.is_empty() {
            return Ok(());
        }

        for (&id, &position) in &placement.positions {
            graph.update_node(
                id,
                NodePatch {
                    position: Some(position),
                    ..NodePatch::default()
                },
            )?;
        }
        info!(nodes = placement.positions.len(); "Applied layered layout");
        Ok(())
    }
}
