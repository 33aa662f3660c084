use flowdraft::{Format, convert};
use pretty_assertions::assert_eq;

#[test]
fn snapshot_decision_flow() {
    let input = "\
flowchart TD
    %% login flow
    start((Begin)) --> check{\"Valid user?\"}
    check -->|Yes| home[Dashboard]
    check -->|No| retry[/Ask again/]
    retry --> check
";
    let output = convert(input, Format::Dsl, Format::Dsl, false).unwrap();
    let expected = "\
flowchart TD
    node0((\"Begin\"))
    node1{\"Valid user?\"}
    node2[\"Dashboard\"]
    node3[/\"Ask again\"/]
    node0 --> node1
    node1 -->|Yes| node2
    node1 -->|No| node3
    node3 --> node1";
    assert_eq!(output, expected);
}

#[test]
fn snapshot_escaped_labels() {
    let input = "\
flowchart TD
    a[\"He said #quot;stop#quot;\\nthen left\"]
    b(Done)
    a -->|x #124; y| b
";
    let output = convert(input, Format::Dsl, Format::Dsl, false).unwrap();
    let expected = "\
flowchart TD
    node0[\"He said #quot;stop#quot;\\nthen left\"]
    node1(\"Done\")
    node0 -->|x #124; y| node1";
    assert_eq!(output, expected);
}

#[test]
fn snapshot_project_json() {
    let input = "flowchart TD\n    A(Start) -->|go| B[Work]\n";
    let output = convert(input, Format::Dsl, Format::Json, false).unwrap();
    let expected = r##"{
  "nodes": [
    {
      "id": "node0",
      "label": "Start",
      "type": "start_end",
      "x": 350.0,
      "y": 195.0,
      "width": 100.0,
      "height": 60.0,
      "color": "#add8e6"
    },
    {
      "id": "node1",
      "label": "Work",
      "type": "rectangle",
      "x": 350.0,
      "y": 345.0,
      "width": 100.0,
      "height": 60.0,
      "color": "#add8e6"
    }
  ],
  "connections": [
    {
      "start_id": "node0",
      "end_id": "node1",
      "label": "go"
    }
  ]
}"##;
    assert_eq!(output, expected);
}

#[test]
fn snapshot_project_back_to_dsl() {
    let input = r##"{
  "nodes": [
    {"id": "n1", "label": "Read", "type": "input_output", "x": 0, "y": 0},
    {"id": "n2", "label": "Parse", "type": "ellipse"},
    {"id": "n3", "label": "Ok?", "type": "diamond"}
  ],
  "connections": [
    {"start_id": "n1", "end_id": "n2"},
    {"start_id": "n2", "end_id": "n3", "label": "then"}
  ]
}"##;
    let output = convert(input, Format::Json, Format::Dsl, false).unwrap();
    let expected = "\
flowchart TD
    node0[/\"Read\"/]
    node1((\"Parse\"))
    node2{\"Ok?\"}
    node0 --> node1
    node1 -->|then| node2";
    assert_eq!(output, expected);
}
