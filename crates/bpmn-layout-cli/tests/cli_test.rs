use std::fs;

use tempfile::tempdir;

use bpmn_layout::{
    LayoutError,
    config::{Direction, LayoutMode},
    model::{CoordinateFrame, Model},
};
use bpmn_layout_cli::{Args, run};

const ORDER_PROCESS: &str = r#"{
    "process_id": "order",
    "elements": [
        {"id": "start", "type_tag": "bpmn:startEvent"},
        {"id": "check", "type_tag": "bpmn:userTask", "name": "Check order"},
        {"id": "decide", "type_tag": "bpmn:exclusiveGateway"},
        {"id": "ship", "type_tag": "bpmn:serviceTask", "name": "Ship"},
        {"id": "end", "type_tag": "bpmn:endEvent"}
    ],
    "flows": [
        {"id": "f1", "source": "start", "target": "check"},
        {"id": "f2", "source": "check", "target": "decide"},
        {"id": "f3", "source": "decide", "target": "ship", "name": "ok"},
        {"id": "f4", "source": "decide", "target": "end"},
        {"id": "f5", "source": "ship", "target": "end"}
    ]
}"#;

fn read_output(path: &std::path::Path) -> Model {
    let json = fs::read_to_string(path).expect("output written");
    serde_json::from_str(&json).expect("output is a model")
}

#[test]
fn test_layout_file_round_trip() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("order.json");
    let output = dir.path().join("order.out.json");
    fs::write(&input, ORDER_PROCESS).expect("write input");

    let args = Args::new(
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    );
    run(&args).expect("layout succeeds");

    let model = read_output(&output);
    assert!(model.is_resolved());
    assert_eq!(model.frame, CoordinateFrame::ParentRelative);
    assert_eq!(model.elements.len(), 5);
    assert!(model.flows.iter().all(|flow| flow.waypoints.len() >= 2));
    let labelled = model.flows.iter().find(|flow| flow.id == "f3").expect("f3");
    assert!(labelled.label_position.is_some());
}

#[test]
fn test_direction_override() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("order.json");
    let output = dir.path().join("order.out.json");
    fs::write(&input, ORDER_PROCESS).expect("write input");

    let mut args = Args::new(
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    );
    args.direction = Some(Direction::TopBottom);
    args.mode = Some(LayoutMode::Auto);
    run(&args).expect("layout succeeds");

    let model = read_output(&output);
    let start = model.absolute_bounds("start").expect("start placed");
    let check = model.absolute_bounds("check").expect("check placed");
    assert!(start.max_y() < check.min_y());
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("order.json");
    let output = dir.path().join("order.out.json");
    let config = dir.path().join("config.toml");
    fs::write(&input, ORDER_PROCESS).expect("write input");
    fs::write(&config, "[layout]\ndirection = \"TB\"\n").expect("write config");

    let mut args = Args::new(
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    );
    args.config = Some(config.to_string_lossy().to_string());
    run(&args).expect("layout succeeds");

    let model = read_output(&output);
    let start = model.absolute_bounds("start").expect("start placed");
    let check = model.absolute_bounds("check").expect("check placed");
    assert!(start.max_y() < check.min_y());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempdir().expect("Failed to create temp directory");
    let args = Args::new(
        dir.path().join("absent.json").to_string_lossy().to_string(),
        dir.path().join("out.json").to_string_lossy().to_string(),
    );
    assert!(matches!(run(&args), Err(LayoutError::Io(_))));
}

#[test]
fn test_malformed_json_is_input_error() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("broken.json");
    let output = dir.path().join("out.json");
    fs::write(&input, "{\"process_id\": ").expect("write input");

    let args = Args::new(
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
    );
    assert!(matches!(run(&args), Err(LayoutError::Input(_))));
    assert!(!output.exists());
}
