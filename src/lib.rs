pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod graph_layout;
pub mod graph_parser;
pub mod graph_serializer;
pub mod project;
pub mod sizing;
pub mod text_metrics;

use std::path::Path;

pub use config::AppConfig;
pub use document::{Document, ParseReport};
pub use error::FlowError;
pub use graph::{Edge, EdgeRef, Graph, GraphError, GraphEvent, Node, NodeId, ShapeKind};
pub use graph_parser::{Direction, ParseNote, ParseWarning};
pub use project::LoadError;

/// On-disk representation of a flowchart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Mermaid-style flowchart text
    Dsl,
    /// JSON project
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Format::Json),
            "mmd" | "txt" => Some(Format::Dsl),
            _ => None,
        }
    }

    /// Guesses from the content: projects are JSON objects.
    pub fn sniff(input: &str) -> Self {
        if input.trim_start().starts_with('{') {
            Format::Json
        } else {
            Format::Dsl
        }
    }

    pub fn other(self) -> Self {
        match self {
            Format::Dsl => Format::Json,
            Format::Json => Format::Dsl,
        }
    }
}

pub fn convert(input: &str, from: Format, to: Format, layout: bool) -> Result<String, FlowError> {
    convert_with_config(input, from, to, layout, &AppConfig::default())
}

/// Loads `input` as `from` and writes it back out as `to`. Flowchart text
/// is always laid out on load; `layout` re-lays out project input too.
pub fn convert_with_config(
    input: &str,
    from: Format,
    to: Format,
    layout: bool,
    config: &AppConfig,
) -> Result<String, FlowError> {
    let mut document = Document::new(config);
    match from {
        Format::Dsl => {
            document.from_dsl_text(input)?;
        }
        Format::Json => document.from_project(input)?,
    }

    if layout {
        document.run_layout(config.viewport.width, config.viewport.height)?;
    }

    match to {
        Format::Dsl => Ok(document.to_dsl_text()),
        Format::Json => Ok(document.to_project()?),
    }
}
