use log::{debug, info, warn};

use crate::color::Rgb;
use crate::config::AppConfig;
use crate::geometry::{EdgeRoute, Point, Size};
use crate::graph::{Edge, EdgeRef, Graph, GraphError, GraphEvent, Node, NodeId, NodePatch, ShapeKind};
use crate::graph_layout::{LayoutEngine, Viewport};
use crate::graph_parser::{Direction, ParseNote, ParseWarning, parse_flowchart};
use crate::graph_serializer::to_dsl;
use crate::project::{self, LoadError, ProjectFile};
use crate::sizing::{SizingConfig, auto_fit};
use crate::text_metrics::{FontSpec, TextMeasure};

/// Outcome of a successful [`Document::from_dsl_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub direction: Direction,
    pub notes: Vec<ParseNote>,
}

/// A flowchart being edited: the graph plus the settings every edit
/// needs. Loads replace the graph only once they fully succeed.
pub struct Document {
    graph: Graph,
    layout: LayoutEngine,
    sizing: SizingConfig,
    measure: Box<dyn TextMeasure>,
    viewport: Viewport,
    fill: Rgb,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl Document {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            graph: Graph::new(),
            layout: LayoutEngine::new(config.layout),
            sizing: config.sizing.clone(),
            measure: Box::new(config.sizing.measure()),
            viewport: config.viewport,
            fill: config.style.fill(),
        }
    }

    /// Replaces the text measure, e.g. with one backed by a real font.
    pub fn with_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        self.graph.take_events()
    }

    fn font(&self) -> FontSpec {
        self.sizing.font()
    }

    fn fit(&self, label: &str) -> Size {
        auto_fit(label, self.measure.as_ref(), &self.font(), self.sizing.padding)
    }

    /// Adds a node sized to its label with the default fill.
    pub fn create_node(&mut self, kind: ShapeKind, label: &str, position: Point) -> NodeId {
        let size = self.fit(label);
        self.graph.add_node(kind, label, position, size, self.fill)
    }

    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<(), GraphError> {
        self.graph.update_node(
            id,
            NodePatch {
                position: Some(position),
                ..NodePatch::default()
            },
        )
    }

    pub fn resize_node(&mut self, id: NodeId, size: Size) -> Result<(), GraphError> {
        self.graph.update_node(
            id,
            NodePatch {
                size: Some(size),
                ..NodePatch::default()
            },
        )
    }

    /// Changes the label and refits the node around it.
    pub fn relabel_node(&mut self, id: NodeId, label: &str) -> Result<(), GraphError> {
        let size = self.fit(label);
        self.graph.update_node(
            id,
            NodePatch {
                label: Some(label.to_string()),
                size: Some(size),
                ..NodePatch::default()
            },
        )
    }

    pub fn retype_node(&mut self, id: NodeId, kind: ShapeKind) -> Result<(), GraphError> {
        self.graph.update_node(
            id,
            NodePatch {
                kind: Some(kind),
                ..NodePatch::default()
            },
        )
    }

    pub fn recolor_node(&mut self, id: NodeId, fill: Rgb) -> Result<(), GraphError> {
        self.graph.update_node(
            id,
            NodePatch {
                fill: Some(fill),
                ..NodePatch::default()
            },
        )
    }

    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: &str,
    ) -> Result<EdgeRef, GraphError> {
        self.graph.add_edge(source, target, label)
    }

    pub fn relabel_edge(&mut self, edge: EdgeRef, label: &str) -> Result<(), GraphError> {
        self.graph.update_edge(edge, label)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        self.graph.remove_node(id)
    }

    pub fn delete_edge(&mut self, edge: EdgeRef) -> Result<Edge, GraphError> {
        self.graph.remove_edge(edge)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    pub fn run_layout(&mut self, width: f32, height: f32) -> Result<(), GraphError> {
        self.viewport = Viewport { width, height };
        self.layout.apply(&mut self.graph, self.viewport)
    }

    pub fn to_dsl_text(&self) -> String {
        to_dsl(&self.graph)
    }

    /// Replaces the graph with the parsed flowchart, laid out in the last
    /// used viewport. On `Err` the current graph is kept.
    pub fn from_dsl_text(&mut self, text: &str) -> Result<ParseReport, ParseWarning> {
        let parsed = match parse_flowchart(text, self.measure.as_ref(), &self.sizing, self.fill) {
            Ok(parsed) => parsed,
            Err(warning) => {
                warn!(warning:% = warning; "Keeping current graph");
                return Err(warning);
            }
        };

        let mut graph = parsed.graph;
        if let Err(err) = self.layout.apply(&mut graph, self.viewport) {
            warn!(err:% = err; "Layout of parsed flowchart failed");
        }
        self.publish(graph);

        Ok(ParseReport {
            direction: parsed.direction,
            notes: parsed.notes,
        })
    }

    pub fn to_project_data(&self) -> ProjectFile {
        project::to_project_data(&self.graph)
    }

    pub fn to_project(&self) -> Result<String, LoadError> {
        project::to_project(&self.graph)
    }

    /// Replaces the graph with the project's, keeping stored positions.
    /// On `Err` the current graph is kept.
    pub fn from_project(&mut self, text: &str) -> Result<(), LoadError> {
        let graph = project::from_project(text).inspect_err(|err| {
            warn!(err:% = err; "Keeping current graph");
        })?;
        self.publish(graph);
        Ok(())
    }

    fn publish(&mut self, mut graph: Graph) {
        graph.mark_reloaded();
        self.graph = graph;
        info!(nodes = self.graph.node_count(), edges = self.graph.edge_count(); "Replaced graph");
    }

    /// Connector geometry between the current positions of the edge's
    /// endpoints.
    pub fn edge_route(&self, edge: EdgeRef) -> Result<EdgeRoute, GraphError> {
        let stored = self.graph.edge(edge).ok_or(GraphError::EdgeNotFound(edge))?;
        let source = self
            .graph
            .node(stored.source)
            .ok_or(GraphError::NodeNotFound(stored.source))?;
        let target = self
            .graph
            .node(stored.target)
            .ok_or(GraphError::NodeNotFound(stored.target))?;

        let label_size =
            (!stored.label.is_empty()).then(|| self.measure.measure(&stored.label, &self.font(), None));
        debug!(edge:% = edge; "Routing edge");
        Ok(EdgeRoute::between(source.rect(), target.rect(), label_size))
    }

    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.graph.node_at(point)
    }
}
