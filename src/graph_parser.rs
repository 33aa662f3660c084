use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;
use winnow::ascii::{Caseless, space0, space1};
use winnow::combinator::{alt, delimited};
use winnow::prelude::*;
use winnow::token::{any, literal, rest, take_till, take_until, take_while};

use crate::color::Rgb;
use crate::geometry::Point;
use crate::graph::{Graph, NodeId, ShapeKind};
use crate::sizing::{SizingConfig, auto_fit};
use crate::text_metrics::TextMeasure;

const COMMENT_MARKER: char = '%';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    LeftRight,
}

/// Reasons flowchart text produced no graph. The caller keeps whatever
/// graph it had.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("flowchart text must start with `flowchart TD` or `flowchart LR`, found `{found}`")]
    MissingHeader { found: String },

    #[error("could not identify any shapes in the flowchart text")]
    NoShapes,
}

/// Non-fatal findings of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNote {
    UndefinedEndpoint { line: usize, identifier: String },
}

impl fmt::Display for ParseNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNote::UndefinedEndpoint { line, identifier } => write!(
                f,
                "line {line}: connection references undefined node `{identifier}`; dropped"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedFlowchart {
    pub graph: Graph,
    /// Parsed for validation only; layout is always top-down.
    pub direction: Direction,
    pub notes: Vec<ParseNote>,
}

#[derive(Debug, Clone, PartialEq)]
struct NodeDef {
    kind: ShapeKind,
    label: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Connection {
    line: usize,
    source: String,
    target: String,
    label: String,
}

/// Parses with the default sizing settings and monospace measure.
pub fn parse_graph(input: &str) -> Result<ParsedFlowchart, ParseWarning> {
    let sizing = SizingConfig::default();
    parse_flowchart(input, &sizing.measure(), &sizing, Rgb::default())
}

/// Builds a fresh graph from flowchart text. Nodes are sized to their
/// labels but not positioned.
pub fn parse_flowchart(
    input: &str,
    measure: &dyn TextMeasure,
    sizing: &SizingConfig,
    fill: Rgb,
) -> Result<ParsedFlowchart, ParseWarning> {
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .collect();

    let Some(&(_, first)) = lines.first() else {
        return Err(ParseWarning::MissingHeader {
            found: String::new(),
        });
    };
    let direction = header(&mut &*first).map_err(|_| ParseWarning::MissingHeader {
        found: context_display(first),
    })?;

    let mut defs: IndexMap<String, NodeDef> = IndexMap::new();
    let mut connections: Vec<Connection> = Vec::new();

    for &(line_no, line) in &lines[1..] {
        collect_line(line_no, line, &mut defs, &mut connections);
    }

    let font = sizing.font();
    let mut graph = Graph::new();
    let mut symbols: HashMap<&str, NodeId> = HashMap::new();
    for (identifier, def) in &defs {
        let size = auto_fit(&def.label, measure, &font, sizing.padding);
        let id = graph.add_node(def.kind, def.label.clone(), Point::default(), size, fill);
        symbols.insert(identifier.as_str(), id);
    }

    let mut notes = Vec::new();
    for connection in connections {
        let source = symbols.get(connection.source.as_str());
        let target = symbols.get(connection.target.as_str());
        match (source, target) {
            (Some(&source), Some(&target)) => {
                let added = graph.add_edge(source, target, connection.label);
                debug_assert!(added.is_ok(), "connected a node that was not materialized");
            }
            _ => {
                let identifier = if source.is_none() {
                    connection.source
                } else {
                    connection.target
                };
                warn!(line = connection.line, identifier = identifier.as_str(); "Dropping connection to undefined node");
                notes.push(ParseNote::UndefinedEndpoint {
                    line: connection.line,
                    identifier,
                });
            }
        }
    }

    if graph.is_empty() {
        return Err(ParseWarning::NoShapes);
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        notes = notes.len();
        "Parsed flowchart"
    );

    Ok(ParsedFlowchart {
        graph,
        direction,
        notes,
    })
}

fn context_display(line: &str) -> String {
    if line.chars().count() > 40 {
        let prefix: String = line.chars().take(40).collect();
        format!("{prefix}...")
    } else {
        line.to_string()
    }
}

fn collect_line(
    line_no: usize,
    line: &str,
    defs: &mut IndexMap<String, NodeDef>,
    connections: &mut Vec<Connection>,
) {
    if let Ok((source, target, label)) = connection(&mut &*line) {
        debug!(line = line_no, source = source, target = target; "Connection");
        connections.push(Connection {
            line: line_no,
            source: source.to_string(),
            target: target.to_string(),
            label,
        });
    } else if let Ok((id, fragment)) = bare_definition(&mut &*line) {
        debug!(line = line_no, id = id; "Node definition");
        defs.insert(id.to_string(), definition(id, fragment));
    } else {
        debug!(line = line_no; "Ignoring line without a leading identifier");
    }

    for (id, kind, text) in inline_definitions(line) {
        let replace = defs.get(id).is_none_or(|existing| existing.label == id);
        if replace {
            defs.insert(id.to_string(), node_def(id, kind, &text));
        }
    }
}

fn header(input: &mut &str) -> winnow::Result<Direction> {
    literal(Caseless("flowchart")).parse_next(input)?;
    space1.parse_next(input)?;
    alt((
        literal(Caseless("TD")).value(Direction::TopDown),
        literal(Caseless("LR")).value(Direction::LeftRight),
    ))
    .parse_next(input)
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn arrow(input: &mut &str) -> winnow::Result<()> {
    (take_while(1.., ['-', '=']), '>').void().parse_next(input)
}

/// Consumes everything up to and including the first arrow outside a
/// quoted label.
fn skip_to_arrow(input: &mut &str) -> winnow::Result<()> {
    loop {
        let before = *input;
        if arrow(input).is_ok() {
            return Ok(());
        }
        *input = before;
        if quoted(input).is_err() {
            *input = before;
            any.parse_next(input)?;
        }
    }
}

fn edge_label<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    delimited('|', take_till(0.., '|'), '|').parse_next(input)
}

/// `<id> ... <arrow> [|label|] <id> ...`; anything after the target
/// identifier is left for the inline definition scan.
fn connection<'s>(input: &mut &'s str) -> winnow::Result<(&'s str, &'s str, String)> {
    let source = identifier(input)?;
    skip_to_arrow(input)?;
    space0.parse_next(input)?;
    let before_label = *input;
    let label = match edge_label(input) {
        Ok(label) => decode_text(label.trim()),
        Err(_) => {
            *input = before_label;
            String::new()
        }
    };
    space0.parse_next(input)?;
    let target = identifier(input)?;
    Ok((source, target, label))
}

fn bare_definition<'s>(input: &mut &'s str) -> winnow::Result<(&'s str, &'s str)> {
    let id = identifier(input)?;
    let fragment = rest.parse_next(input)?;
    Ok((id, fragment.trim()))
}

/// Decodes the text after a bare identifier. A missing fragment means a
/// plain rectangle labeled with the identifier; so does a fragment that is
/// not a complete shape.
fn definition(id: &str, fragment: &str) -> NodeDef {
    if fragment.is_empty() {
        return node_def(id, ShapeKind::Process, "");
    }

    let mut input = fragment;
    match shape(&mut input) {
        Ok((kind, text)) if input.trim().is_empty() => node_def(id, kind, &text),
        _ => node_def(id, ShapeKind::Process, ""),
    }
}

fn node_def(id: &str, kind: ShapeKind, text: &str) -> NodeDef {
    let label = if text.is_empty() {
        id.to_string()
    } else {
        text.to_string()
    };
    NodeDef { kind, label }
}

/// Every `<id><shape>` occurrence in the line, skipping edge labels.
fn inline_definitions(line: &str) -> Vec<(&str, ShapeKind, String)> {
    let mut found = Vec::new();
    let mut input = line;

    while !input.is_empty() {
        let before = input;
        if let Ok(id) = identifier(&mut input) {
            let after_id = input;
            match shape(&mut input) {
                Ok((kind, text)) => found.push((id, kind, text)),
                Err(_) => input = after_id,
            }
            continue;
        }
        input = before;

        if input.starts_with('|') {
            if edge_label(&mut input).is_err() {
                input = "";
            }
            continue;
        }

        let mut chars = input.chars();
        chars.next();
        input = chars.as_str();
    }

    found
}

/// Most specific delimiters first.
fn shape(input: &mut &str) -> winnow::Result<(ShapeKind, String)> {
    alt((
        ellipse_label.map(|l| (ShapeKind::Ellipse, l)),
        terminator_label.map(|l| (ShapeKind::Terminator, l)),
        decision_label.map(|l| (ShapeKind::Decision, l)),
        io_label.map(|l| (ShapeKind::Io, l)),
        process_label.map(|l| (ShapeKind::Process, l)),
    ))
    .parse_next(input)
}

fn ellipse_label(input: &mut &str) -> winnow::Result<String> {
    "((".parse_next(input)?;
    let text = label_text("))").parse_next(input)?;
    "))".parse_next(input)?;
    Ok(text)
}

fn terminator_label(input: &mut &str) -> winnow::Result<String> {
    "(".parse_next(input)?;
    let text = label_text(")").parse_next(input)?;
    ")".parse_next(input)?;
    Ok(text)
}

fn decision_label(input: &mut &str) -> winnow::Result<String> {
    "{".parse_next(input)?;
    let text = label_text("}").parse_next(input)?;
    "}".parse_next(input)?;
    Ok(text)
}

fn io_label(input: &mut &str) -> winnow::Result<String> {
    "[/".parse_next(input)?;
    let text = label_text("/]").parse_next(input)?;
    "/]".parse_next(input)?;
    Ok(text)
}

fn process_label(input: &mut &str) -> winnow::Result<String> {
    "[".parse_next(input)?;
    let text = label_text("]").parse_next(input)?;
    "]".parse_next(input)?;
    Ok(text)
}

/// Text up to `closer`. A double-quoted string may contain the closer;
/// otherwise the raw text has surrounding quotes stripped.
fn label_text(closer: &'static str) -> impl FnMut(&mut &str) -> winnow::Result<String> {
    move |input: &mut &str| {
        let before = *input;
        if let Ok(text) = quoted(input) {
            if input.starts_with(closer) {
                return Ok(decode_text(text.trim()));
            }
        }
        *input = before;

        let raw = take_until(0.., closer).parse_next(input)?;
        Ok(decode_text(strip_quotes(raw)))
    }
}

fn quoted<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    delimited((space0, '"'), take_till(0.., '"'), ('"', space0)).parse_next(input)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.trim(),
        None => s,
    }
}

/// Undoes the escaping applied by the serializer.
pub(crate) fn decode_text(s: &str) -> String {
    s.replace("\\n", "\n")
        .replace("#quot;", "\"")
        .replace("#124;", "|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(parsed: &ParsedFlowchart) -> Vec<(ShapeKind, String)> {
        parsed
            .graph
            .nodes()
            .map(|n| (n.kind, n.label.clone()))
            .collect()
    }

    fn edges(parsed: &ParsedFlowchart) -> Vec<(String, String, String)> {
        let graph = &parsed.graph;
        graph
            .edges()
            .iter()
            .map(|e| {
                (
                    graph.node(e.source).unwrap().label.clone(),
                    graph.node(e.target).unwrap().label.clone(),
                    e.label.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn parse_header_td() {
        let mut input = "flowchart TD";
        assert_eq!(header(&mut input).unwrap(), Direction::TopDown);
    }

    #[test]
    fn parse_header_lr_case_insensitive() {
        let mut input = "FlowChart lr";
        assert_eq!(header(&mut input).unwrap(), Direction::LeftRight);
    }

    #[test]
    fn parse_header_rejects_graph_keyword() {
        let mut input = "graph TD";
        assert!(header(&mut input).is_err());
    }

    #[test]
    fn parse_arrow_variants() {
        for token in ["->", "-->", "==>", "-=->", "----->"] {
            let mut input = token;
            assert!(arrow(&mut input).is_ok(), "{token} should be an arrow");
            assert_eq!(input, "");
        }
        let mut input = "---";
        assert!(arrow(&mut input).is_err());
    }

    #[test]
    fn parse_connection_plain() {
        let mut input = "A --> B";
        assert_eq!(connection(&mut input).unwrap(), ("A", "B", String::new()));
    }

    #[test]
    fn parse_connection_with_label() {
        let mut input = "A -->| Yes | B";
        assert_eq!(connection(&mut input).unwrap(), ("A", "B", "Yes".to_string()));
    }

    #[test]
    fn parse_connection_skips_inline_shape() {
        let mut input = "start[\"a-b\"] ==> finish(Done)";
        let (source, target, label) = connection(&mut input).unwrap();
        assert_eq!((source, target, label.as_str()), ("start", "finish", ""));
        assert_eq!(input, "(Done)");
    }

    #[test]
    fn parse_connection_ignores_arrow_in_quoted_label() {
        let mut input = "node0[\"a --> node1\"]";
        assert!(connection(&mut input).is_err());
    }

    #[test]
    fn parse_connection_requires_arrow() {
        let mut input = "A --- B";
        assert!(connection(&mut input).is_err());
    }

    #[test]
    fn parse_shape_each_kind() {
        let cases = [
            ("((Circle))", ShapeKind::Ellipse, "Circle"),
            ("(Round)", ShapeKind::Terminator, "Round"),
            ("{Choice}", ShapeKind::Decision, "Choice"),
            ("[/Read input/]", ShapeKind::Io, "Read input"),
            ("[Box]", ShapeKind::Process, "Box"),
        ];
        for (fragment, kind, label) in cases {
            let mut input = fragment;
            assert_eq!(shape(&mut input).unwrap(), (kind, label.to_string()), "{fragment}");
        }
    }

    #[test]
    fn parse_shape_strips_quotes() {
        let mut input = "[/\"quoted io\"/]";
        assert_eq!(shape(&mut input).unwrap(), (ShapeKind::Io, "quoted io".to_string()));
    }

    #[test]
    fn parse_shape_quoted_text_may_contain_closer() {
        let mut input = "[\"[NOTE] a]b\"]";
        assert_eq!(shape(&mut input).unwrap(), (ShapeKind::Process, "[NOTE] a]b".to_string()));
    }

    #[test]
    fn parse_shape_decodes_escapes() {
        let mut input = "{\"say #quot;hi#quot;\\nthen go\"}";
        assert_eq!(
            shape(&mut input).unwrap(),
            (ShapeKind::Decision, "say \"hi\"\nthen go".to_string())
        );
    }

    #[test]
    fn definition_empty_text_uses_identifier() {
        assert_eq!(
            definition("n1", "[\"\"]"),
            NodeDef {
                kind: ShapeKind::Process,
                label: "n1".to_string()
            }
        );
    }

    #[test]
    fn definition_unknown_fragment_is_plain_rectangle() {
        assert_eq!(
            definition("n1", ">odd]"),
            NodeDef {
                kind: ShapeKind::Process,
                label: "n1".to_string()
            }
        );
    }

    #[test]
    fn parse_process_and_decision() {
        let parsed = parse_graph("flowchart TD\n    A[\"Start Node\"]\n    B{\"Go?\"}\n").unwrap();
        assert_eq!(
            labels(&parsed),
            vec![
                (ShapeKind::Process, "Start Node".to_string()),
                (ShapeKind::Decision, "Go?".to_string()),
            ]
        );
    }

    #[test]
    fn parse_labeled_connection_between_defined_nodes() {
        let parsed = parse_graph("flowchart TD\n    A[One]\n    B[Two]\n    A -->|Yes| B\n").unwrap();
        assert_eq!(
            edges(&parsed),
            vec![("One".to_string(), "Two".to_string(), "Yes".to_string())]
        );
    }

    #[test]
    fn parse_inline_definitions_in_connection() {
        let parsed = parse_graph("flowchart LR\n    A(Start) --> B{Ready?}\n").unwrap();
        assert_eq!(parsed.direction, Direction::LeftRight);
        assert_eq!(
            labels(&parsed),
            vec![
                (ShapeKind::Terminator, "Start".to_string()),
                (ShapeKind::Decision, "Ready?".to_string()),
            ]
        );
        assert_eq!(
            edges(&parsed),
            vec![("Start".to_string(), "Ready?".to_string(), String::new())]
        );
    }

    #[test]
    fn inline_definition_replaces_placeholder() {
        let parsed = parse_graph("flowchart TD\n    A\n    A((Rich)) --> A\n").unwrap();
        assert_eq!(labels(&parsed), vec![(ShapeKind::Ellipse, "Rich".to_string())]);
    }

    #[test]
    fn inline_definition_keeps_richer_existing() {
        let parsed = parse_graph("flowchart TD\n    A[First]\n    A((Second)) --> A\n").unwrap();
        assert_eq!(labels(&parsed), vec![(ShapeKind::Process, "First".to_string())]);
    }

    #[test]
    fn later_bare_definition_wins() {
        let parsed = parse_graph("flowchart TD\n    A[First]\n    A{Second}\n").unwrap();
        assert_eq!(labels(&parsed), vec![(ShapeKind::Decision, "Second".to_string())]);
    }

    #[test]
    fn edge_label_is_not_an_inline_definition() {
        let parsed = parse_graph("flowchart TD\n    A[a]\n    B[b]\n    A -->|x(y)| B\n").unwrap();
        assert_eq!(parsed.graph.node_count(), 2);
        assert_eq!(edges(&parsed)[0].2, "x(y)");
    }

    #[test]
    fn bare_identifier_defaults_to_own_label() {
        let parsed = parse_graph("flowchart TD\n    lonely\n").unwrap();
        assert_eq!(labels(&parsed), vec![(ShapeKind::Process, "lonely".to_string())]);
    }

    #[test]
    fn undefined_endpoint_is_dropped_with_note() {
        let parsed = parse_graph("flowchart TD\n    A[a]\n    A --> Z\n").unwrap();
        assert_eq!(parsed.graph.edge_count(), 0);
        assert_eq!(
            parsed.notes,
            vec![ParseNote::UndefinedEndpoint {
                line: 3,
                identifier: "Z".to_string()
            }]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let parsed = parse_graph("%% leading comment\n\nflowchart TD\n  %% note\n  A[a]\n").unwrap();
        assert_eq!(parsed.graph.node_count(), 1);
    }

    #[test]
    fn missing_header_is_a_warning() {
        let err = parse_graph("graph TD\n    A[a]\n").unwrap_err();
        assert_eq!(
            err,
            ParseWarning::MissingHeader {
                found: "graph TD".to_string()
            }
        );
    }

    #[test]
    fn empty_input_is_a_warning() {
        assert!(matches!(
            parse_graph("   \n"),
            Err(ParseWarning::MissingHeader { .. })
        ));
    }

    #[test]
    fn connections_alone_produce_no_shapes() {
        assert_eq!(parse_graph("flowchart TD\n    A --> B\n").unwrap_err(), ParseWarning::NoShapes);
    }

    #[test]
    fn parsed_nodes_are_auto_fitted() {
        let parsed = parse_graph("flowchart TD\n    A[\"a fairly long label that will need to wrap onto a second line\"]\n").unwrap();
        let node = parsed.graph.nodes().next().unwrap();
        assert!(node.size().width() > 100.0);
        assert!(node.size().height() >= 60.0);
    }

    #[test]
    fn header_context_is_truncated() {
        let long = "x".repeat(60);
        let err = parse_graph(&long).unwrap_err();
        assert_eq!(
            err,
            ParseWarning::MissingHeader {
                found: format!("{}...", "x".repeat(40))
            }
        );
    }
}
