use smallvec::smallvec;

use super::*;
use crate::animation::ease::{Ease, Waveform};
use crate::field::expr::FieldExprIR;
use crate::foundation::core::{ConstId, FieldExprId, StateKey};
use crate::ir::program::{
    ConstValue, Schedule, SlotMeta, StateCellSpec, StateLayout, StorageClass, TypeTag,
};
use crate::time::resolver::TimeModel;

fn program() -> CompiledProgramIR {
    CompiledProgramIR {
        schedule: Schedule::default(),
        time_model: TimeModel::Infinite,
        state_layout: StateLayout {
            cells: vec![
                StateCellSpec {
                    key: StateKey::new("n", "a"),
                    storage: StorageClass::F64,
                    len: 1,
                    init: None,
                },
                StateCellSpec {
                    key: StateKey::new("n", "b"),
                    storage: StorageClass::F64,
                    len: 1,
                    init: None,
                },
            ],
        },
        slot_meta: vec![
            SlotMeta::new(StorageClass::F64, TypeTag::Number),
            SlotMeta::new(StorageClass::F64, TypeTag::Number),
            SlotMeta::new(StorageClass::F64, TypeTag::Number),
            SlotMeta::new(StorageClass::F64, TypeTag::Number),
            SlotMeta::new(StorageClass::Object, TypeTag::Color),
            SlotMeta::new(StorageClass::Object, TypeTag::Events),
            SlotMeta::new(StorageClass::Object, TypeTag::Field),
        ],
        constants: vec![ConstValue::Number(3.0), ConstValue::Color([1.0, 0.0, 0.0, 1.0])],
        fields: vec![FieldExprIR::Index],
        outputs: Vec::new(),
    }
}

struct Harness {
    program: CompiledProgramIR,
    values: ValueStore,
    state: StateBuffer,
    frame: u64,
}

impl Harness {
    fn new() -> Self {
        let program = program();
        let values = ValueStore::new(&program.slot_meta);
        let state = StateBuffer::new(&program.state_layout, &program.constants).unwrap();
        Self {
            program,
            values,
            state,
            frame: 0,
        }
    }

    /// Clear slots and set inputs 0..n for a fresh frame.
    fn frame(&mut self, inputs: &[f64]) {
        self.frame += 1;
        self.values.clear(self.frame);
        for (i, &v) in inputs.iter().enumerate() {
            self.values.write_number(SlotId(i as u32), v).unwrap();
        }
    }

    fn run(&mut self, step: &NodeEvalStep, time: &EffectiveTime) -> ReelResult<()> {
        eval_node(step, &self.program, &mut self.values, &mut self.state, time)
    }

    fn out(&self) -> f64 {
        self.values.read_f64(SlotId(3)).unwrap()
    }
}

fn step(op: NodeOp, inputs: &[u32], out: u32) -> NodeEvalStep {
    NodeEvalStep {
        node_id: "n".into(),
        op,
        inputs: inputs.iter().map(|&i| SlotId(i)).collect(),
        outputs: smallvec![SlotId(out)],
        state: smallvec![StateCellIdx(0), StateCellIdx(1)],
    }
}

fn playing(delta_ms: f64) -> EffectiveTime {
    EffectiveTime {
        delta_ms,
        ..EffectiveTime::default()
    }
}

fn scrubbing() -> EffectiveTime {
    EffectiveTime {
        delta_ms: -500.0,
        is_scrub: true,
        ..EffectiveTime::default()
    }
}

#[test]
fn pure_arithmetic() {
    let t = playing(16.0);
    let cases: [(NodeOp, &[f64], f64); 8] = [
        (NodeOp::Add, &[2.0, 3.0], 5.0),
        (NodeOp::Sub, &[2.0, 3.0], -1.0),
        (NodeOp::Mul, &[2.0, 3.0], 6.0),
        (NodeOp::Max, &[2.0, 3.0], 3.0),
        (NodeOp::Abs, &[-2.0], 2.0),
        (NodeOp::Clamp, &[5.0, 0.0, 1.0], 1.0),
        (NodeOp::Lerp, &[10.0, 20.0, 0.25], 12.5),
        (
            NodeOp::Ease {
                ease: Ease::InQuad,
            },
            &[0.5],
            0.25,
        ),
    ];
    for (op, inputs, want) in cases {
        let mut h = Harness::new();
        h.frame(inputs);
        let ins: Vec<u32> = (0..inputs.len() as u32).collect();
        h.run(&step(op, &ins, 3), &t).unwrap();
        assert_eq!(h.out(), want, "{op:?}");
    }
}

#[test]
fn nan_inputs_propagate_through_min_max_and_clamp() {
    let t = playing(16.0);
    let cases: [(NodeOp, &[f64]); 5] = [
        (NodeOp::Min, &[f64::NAN, 1.0]),
        (NodeOp::Min, &[1.0, f64::NAN]),
        (NodeOp::Max, &[f64::NAN, 1.0]),
        (NodeOp::Clamp, &[f64::NAN, 0.0, 1.0]),
        (NodeOp::Clamp, &[0.5, f64::NAN, 1.0]),
    ];
    for (op, inputs) in cases {
        let mut h = Harness::new();
        h.frame(inputs);
        let ins: Vec<u32> = (0..inputs.len() as u32).collect();
        h.run(&step(op, &ins, 3), &t).unwrap();
        assert!(h.out().is_nan(), "{op:?} {inputs:?}");
    }
}

#[test]
fn oscillator_samples_phase() {
    let mut h = Harness::new();
    h.frame(&[0.25]);
    h.run(
        &step(
            NodeOp::Oscillator {
                wave: Waveform::Sine,
            },
            &[0],
            3,
        ),
        &playing(16.0),
    )
    .unwrap();
    assert!((h.out() - 1.0).abs() < 1e-12);
}

#[test]
fn constants_colors_and_field_refs() {
    let mut h = Harness::new();
    h.frame(&[]);
    let t = playing(0.0);
    h.run(&step(NodeOp::Const { id: ConstId(0) }, &[], 3), &t)
        .unwrap();
    assert_eq!(h.out(), 3.0);
    h.run(&step(NodeOp::Const { id: ConstId(1) }, &[], 4), &t)
        .unwrap();
    assert_eq!(
        h.values.read_object(SlotId(4)).unwrap(),
        Some(&ObjectValue::Color(Rgba::new(1.0, 0.0, 0.0, 1.0)))
    );
    h.run(
        &step(
            NodeOp::FieldRef {
                field: FieldExprId(0),
            },
            &[],
            6,
        ),
        &t,
    )
    .unwrap();

    let err = h
        .run(&step(NodeOp::Const { id: ConstId(9) }, &[], 2), &t)
        .unwrap_err();
    assert!(matches!(err, ReelError::Contract(_)));
    let err = h
        .run(
            &step(
                NodeOp::FieldRef {
                    field: FieldExprId(4),
                },
                &[],
                1,
            ),
            &t,
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Contract(_)));
}

#[test]
fn missing_inputs_are_contract_errors() {
    let mut h = Harness::new();
    h.frame(&[]);
    let err = h.run(&step(NodeOp::Add, &[0], 3), &playing(0.0)).unwrap_err();
    assert!(err.to_string().contains("missing input 1"));
}

#[test]
fn emit_on_trigger_produces_one_event() {
    let mut h = Harness::new();
    h.frame(&[1.0, 7.0]);
    let t = EffectiveTime {
        t_model_ms: 250.0,
        ..playing(16.0)
    };
    h.run(&step(NodeOp::EmitOnTrigger, &[0, 1], 5), &t).unwrap();
    let Some(ObjectValue::Events(ev)) = h.values.read_object(SlotId(5)).unwrap() else {
        panic!("expected events");
    };
    assert_eq!(
        &ev[..],
        &[BusEvent {
            t_ms: 250.0,
            value: 7.0,
        }]
    );

    h.frame(&[0.0]);
    h.run(&step(NodeOp::EmitOnTrigger, &[0], 5), &t).unwrap();
    let Some(ObjectValue::Events(ev)) = h.values.read_object(SlotId(5)).unwrap() else {
        panic!("expected events");
    };
    assert!(ev.is_empty());
}

#[test]
fn integrate_accumulates_over_playback_time_only() {
    let mut h = Harness::new();
    let s = step(NodeOp::Integrate, &[0], 3);
    for _ in 0..4 {
        h.frame(&[2.0]);
        h.run(&s, &playing(250.0)).unwrap();
    }
    assert!((h.out() - 2.0).abs() < 1e-12);
    h.frame(&[2.0]);
    h.run(&s, &scrubbing()).unwrap();
    assert!((h.out() - 2.0).abs() < 1e-12);
}

#[test]
fn delay_outputs_previous_input() {
    let mut h = Harness::new();
    let s = step(NodeOp::Delay, &[0], 3);
    let mut outs = Vec::new();
    for x in [1.0, 2.0, 3.0] {
        h.frame(&[x]);
        h.run(&s, &playing(16.0)).unwrap();
        outs.push(h.out());
    }
    assert_eq!(outs, vec![0.0, 1.0, 2.0]);
}

#[test]
fn sample_hold_and_counter() {
    let mut h = Harness::new();
    let hold = step(NodeOp::SampleHold, &[0, 1], 3);
    let mut outs = Vec::new();
    for (x, trig) in [(5.0, 0.0), (6.0, 1.0), (7.0, 0.0)] {
        h.frame(&[x, trig]);
        h.run(&hold, &playing(16.0)).unwrap();
        outs.push(h.out());
    }
    assert_eq!(outs, vec![0.0, 6.0, 6.0]);

    let mut h = Harness::new();
    let counter = step(NodeOp::Counter, &[0, 1], 3);
    let mut outs = Vec::new();
    for (trig, reset) in [(1.0, 0.0), (1.0, 0.0), (0.0, 0.0), (1.0, 1.0)] {
        h.frame(&[trig, reset]);
        h.run(&counter, &playing(16.0)).unwrap();
        outs.push(h.out());
    }
    assert_eq!(outs, vec![1.0, 2.0, 2.0, 1.0]);
}

#[test]
fn smooth_converges_and_snaps_on_scrub() {
    let mut h = Harness::new();
    let s = step(NodeOp::Smooth { rate: 10.0 }, &[0], 3);
    h.frame(&[1.0]);
    h.run(&s, &playing(100.0)).unwrap();
    let first = h.out();
    assert!(first > 0.0 && first < 1.0);
    h.frame(&[1.0]);
    h.run(&s, &playing(100.0)).unwrap();
    assert!(h.out() > first && h.out() < 1.0);
    h.frame(&[-4.0]);
    h.run(&s, &scrubbing()).unwrap();
    assert_eq!(h.out(), -4.0);
}

#[test]
fn spring_settles_on_target() {
    let mut h = Harness::new();
    let s = step(
        NodeOp::Spring {
            stiffness: 120.0,
            damping: 20.0,
        },
        &[0],
        3,
    );
    for _ in 0..240 {
        h.frame(&[1.0]);
        h.run(&s, &playing(1000.0 / 60.0)).unwrap();
    }
    assert!((h.out() - 1.0).abs() < 1e-3);
    assert_eq!(
        h.state.get(&StateKey::new("n", "a")),
        Some(crate::store::state::CellValues::F64(&[h.out()]))
    );
}

#[test]
fn spring_survives_a_huge_frame_gap() {
    let mut h = Harness::new();
    let s = step(
        NodeOp::Spring {
            stiffness: 120.0,
            damping: 20.0,
        },
        &[0],
        3,
    );
    h.frame(&[1.0]);
    h.run(&s, &playing(1.0e12)).unwrap();
    assert!(h.out().is_finite());
    assert!((h.out() - 1.0).abs() < 1e-3);
}

#[test]
fn stateful_ops_need_state_cells() {
    let mut h = Harness::new();
    h.frame(&[1.0]);
    let mut s = step(NodeOp::Integrate, &[0], 3);
    s.state.clear();
    assert!(matches!(
        h.run(&s, &playing(16.0)),
        Err(ReelError::Contract(_))
    ));
}
