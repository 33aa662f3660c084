use flowdraft::geometry::{Point, Size};
use flowdraft::graph_parser::parse_graph;
use flowdraft::graph_serializer::to_dsl;
use flowdraft::project::{from_project, to_project, to_project_data};
use flowdraft::{Graph, ShapeKind};
use proptest::prelude::*;

type Shape = (ShapeKind, String);
type Link = (usize, usize, String);

/// Graph structure with node ids replaced by insertion positions.
fn erase_ids(graph: &Graph) -> (Vec<Shape>, Vec<Link>) {
    let nodes = graph
        .nodes()
        .map(|n| (n.kind, n.label.clone()))
        .collect();
    let edges = graph
        .edges()
        .iter()
        .map(|e| {
            (
                graph.node_index(e.source).unwrap(),
                graph.node_index(e.target).unwrap(),
                e.label.clone(),
            )
        })
        .collect();
    (nodes, edges)
}

fn build(nodes: &[Shape], edges: &[Link]) -> Graph {
    let mut graph = Graph::new();
    let ids: Vec<_> = nodes
        .iter()
        .enumerate()
        .map(|(i, (kind, label))| {
            graph.add_node(
                *kind,
                label.clone(),
                Point::new(i as f32 * 10.0, i as f32 * 20.0),
                Size::new(100.0, 60.0),
                Default::default(),
            )
        })
        .collect();
    for (from, to, label) in edges {
        graph.add_edge(ids[*from], ids[*to], label.clone()).unwrap();
    }
    graph
}

// ===================
// Strategies
// ===================

fn kind_strategy() -> impl Strategy<Value = ShapeKind> {
    prop::sample::select(ShapeKind::ALL.to_vec())
}

/// Labels the text format can carry: no surrounding whitespace, and no
/// backslashes or semicolons that could read as escapes.
fn label_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ?!\"|()\\[\\]{}/<>=%é-]{1,16}"
        .prop_filter("surrounding whitespace is trimmed", |s| s.trim() == s)
}

fn edge_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), label_strategy(), Just("two\nlines".to_string())]
}

fn graph_strategy() -> impl Strategy<Value = (Vec<Shape>, Vec<Link>)> {
    prop::collection::vec((kind_strategy(), label_strategy()), 1..8).prop_flat_map(|nodes| {
        let count = nodes.len();
        (
            Just(nodes),
            prop::collection::vec((0..count, 0..count, edge_label_strategy()), 0..10),
        )
    })
}

// ===================
// Property Test Functions
// ===================

fn check_dsl_round_trip(nodes: Vec<Shape>, edges: Vec<Link>) -> Result<(), TestCaseError> {
    let graph = build(&nodes, &edges);
    let text = to_dsl(&graph);
    let parsed = parse_graph(&text).map_err(|e| TestCaseError::fail(format!("{e}\n{text}")))?;

    prop_assert!(parsed.notes.is_empty(), "unexpected notes {:?}\n{}", parsed.notes, text);
    prop_assert_eq!(erase_ids(&parsed.graph), (nodes, edges), "{}", text);
    Ok(())
}

fn check_project_round_trip(nodes: Vec<Shape>, edges: Vec<Link>) -> Result<(), TestCaseError> {
    let graph = build(&nodes, &edges);
    let text = to_project(&graph).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let loaded = from_project(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;

    prop_assert_eq!(to_project_data(&loaded), to_project_data(&graph));
    Ok(())
}

proptest! {
    #[test]
    fn dsl_round_trip_is_isomorphic((nodes, edges) in graph_strategy()) {
        check_dsl_round_trip(nodes, edges)?;
    }

    #[test]
    fn project_round_trip_preserves_everything((nodes, edges) in graph_strategy()) {
        check_project_round_trip(nodes, edges)?;
    }
}

#[test]
fn dsl_round_trip_multiline_label() {
    let nodes = vec![(ShapeKind::Decision, "line one\nline two".to_string())];
    let graph = build(&nodes, &[]);
    let parsed = parse_graph(&to_dsl(&graph)).unwrap();
    assert_eq!(erase_ids(&parsed.graph), (nodes, vec![]));
}
