use super::*;

const MINIMAL: &str = r#"{
  "schedule": { "steps": [
    { "kind": "time_derive", "phase": 0 },
    { "kind": "node_eval", "node_id": "osc", "op": { "op": "oscillator", "wave": "sine" },
      "inputs": [0], "outputs": [1] }
  ]},
  "time_model": { "kind": "cyclic", "period_ms": 1000 },
  "slot_meta": [
    { "storage": "f64", "type": "phase" },
    { "storage": "f64", "type": "number", "debug_name": "osc.out" },
    { "storage": "object", "type": "render_frame" }
  ],
  "constants": [
    { "kind": "number", "value": 2.5 },
    { "kind": "color", "value": [1.0, 0.5, 0.0, 1.0] }
  ],
  "state_layout": { "cells": [
    { "node_id": "osc", "role": "accum", "storage": "f64", "init": 0 }
  ]},
  "outputs": [ { "slot": 2, "kind": "render_frame" } ]
}"#;

#[test]
fn parses_minimal_program() {
    let p = CompiledProgramIR::from_json(MINIMAL).unwrap();
    assert_eq!(p.schedule.steps.len(), 2);
    assert_eq!(p.schedule.steps[1].kind_name(), "node_eval");
    assert_eq!(p.slot_meta[1].debug_name.as_deref(), Some("osc.out"));
    assert_eq!(p.state_layout.cells[0].len, 1);
    assert_eq!(p.state_layout.cells[0].key, StateKey::new("osc", "accum"));
    assert_eq!(p.render_output().unwrap(), SlotId(2));
    assert!(p.fields.is_empty());
}

#[test]
fn constant_lookup_and_views() {
    let p = CompiledProgramIR::from_json(MINIMAL).unwrap();
    assert_eq!(p.constant(ConstId(0)).unwrap().as_f64(), Some(2.5));
    assert_eq!(
        p.constant(ConstId(1)).unwrap().to_object(),
        Some(ObjectValue::Color(Rgba::new(1.0, 0.5, 0.0, 1.0)))
    );
    let err = p.constant(ConstId(7)).unwrap_err();
    assert!(matches!(err, ReelError::Contract(_)));
}

#[test]
fn missing_slot_meta_and_output_are_contract_errors() {
    let mut p = CompiledProgramIR::from_json(MINIMAL).unwrap();
    assert!(p.slot_meta(SlotId(3)).is_err());
    p.outputs.clear();
    assert!(p.render_output().is_err());
}

#[test]
fn unknown_step_kind_is_rejected() {
    let bad = MINIMAL.replace("\"time_derive\"", "\"teleport\"");
    let err = CompiledProgramIR::from_json(&bad).unwrap_err();
    assert!(err.to_string().starts_with("serialization error:"));
}

#[test]
fn type_tags_accept_matching_payloads() {
    assert!(TypeTag::Number.accepts(&Value::F64(1.0)));
    assert!(TypeTag::Bool.accepts(&Value::U32(1)));
    assert!(!TypeTag::Number.accepts(&Value::Object(ObjectValue::Field(FieldExprId(0)))));
    assert!(TypeTag::Field.accepts(&Value::Object(ObjectValue::Field(FieldExprId(0)))));
    assert!(!TypeTag::Color.accepts(&Value::Object(ObjectValue::Vec2(Vec2::ZERO))));
    assert!(!TypeTag::Vec2.accepts(&Value::F64(0.0)));
}

#[test]
fn path_constants_roundtrip_through_json() {
    let json = r#"{ "kind": "paths", "value": [ { "commands": [
        { "cmd": "move_to", "x": 0, "y": 0 },
        { "cmd": "cubic_to", "x1": 1, "y1": 0, "x2": 1, "y2": 1, "x": 0, "y": 1 },
        { "cmd": "close" }
    ]}]}"#;
    let c: ConstValue = serde_json::from_str(json).unwrap();
    let ConstValue::Paths(paths) = &c else {
        panic!("expected paths constant");
    };
    assert_eq!(paths[0].commands.len(), 3);
    assert_eq!(paths[0].commands[2], PathCommand::Close);
    assert!(matches!(c.to_object(), Some(ObjectValue::PathSource(_))));
    assert_eq!(c.as_f64(), None);
}

#[test]
fn paths_convert_to_and_from_kurbo() {
    let mut bez = BezPath::new();
    bez.move_to((0.0, 0.0));
    bez.quad_to((5.0, 10.0), (10.0, 0.0));
    bez.curve_to((10.0, 5.0), (5.0, 5.0), (0.0, 5.0));
    bez.close_path();

    let path = PathIR::from_bez_path(&bez);
    assert_eq!(path.commands.len(), 4);
    assert_eq!(
        path.commands[1],
        PathCommand::QuadTo {
            x1: 5.0,
            y1: 10.0,
            x: 10.0,
            y: 0.0
        }
    );
    assert_eq!(path.to_bez_path(), bez);
}
