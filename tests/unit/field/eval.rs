use super::*;
use crate::field::expr::{BinaryFn, UnaryFn};
use crate::foundation::core::{Rgba, Vec2};
use crate::ir::program::{SlotMeta, TypeTag};

fn store() -> ValueStore {
    let mut v = ValueStore::new(&[
        SlotMeta::new(StorageClass::F64, TypeTag::Number),
        SlotMeta::new(StorageClass::Object, TypeTag::Vec2),
        SlotMeta::new(StorageClass::Object, TypeTag::Color),
        SlotMeta::new(StorageClass::Object, TypeTag::FieldBuffer),
    ]);
    v.write_number(SlotId(0), 2.0).unwrap();
    v.write_object(SlotId(1), ObjectValue::Vec2(Vec2::new(1.0, -1.0)))
        .unwrap();
    v.write_object(SlotId(2), ObjectValue::Color(Rgba::new(1.0, 0.5, 0.25, 1.0)))
        .unwrap();
    v
}

fn id(i: u32) -> FieldExprId {
    FieldExprId(i)
}

#[test]
fn index_normalized_and_signal_broadcast() {
    let values = store();
    let fields = [
        FieldExprIR::Index,
        FieldExprIR::Normalized,
        FieldExprIR::Signal { slot: SlotId(0) },
        FieldExprIR::Binary {
            fun: BinaryFn::Mul,
            a: id(0),
            b: id(2),
        },
    ];
    let ev = FieldEvaluator::new(&fields, &values, 3);
    assert_eq!(ev.eval(id(1)).unwrap().data, vec![0.0, 0.5, 1.0]);
    assert_eq!(ev.eval(id(3)).unwrap().data, vec![0.0, 2.0, 4.0]);

    let single = FieldEvaluator::new(&fields, &values, 1);
    assert_eq!(single.eval(id(1)).unwrap().data, vec![0.0]);
}

#[test]
fn scalars_broadcast_against_vectors() {
    let values = store();
    let fields = [
        FieldExprIR::Signal { slot: SlotId(1) },
        FieldExprIR::Index,
        FieldExprIR::Binary {
            fun: BinaryFn::Add,
            a: id(0),
            b: id(1),
        },
    ];
    let l = FieldEvaluator::new(&fields, &values, 2).eval(id(2)).unwrap();
    assert_eq!(l.components, 2);
    assert_eq!(l.data, vec![1.0, -1.0, 2.0, 0.0]);
}

#[test]
fn mismatched_widths_are_rejected() {
    let values = store();
    let fields = [
        FieldExprIR::Signal { slot: SlotId(1) },
        FieldExprIR::Signal { slot: SlotId(2) },
        FieldExprIR::Binary {
            fun: BinaryFn::Add,
            a: id(0),
            b: id(1),
        },
        FieldExprIR::Vec2 { x: id(0), y: id(0) },
    ];
    let ev = FieldEvaluator::new(&fields, &values, 2);
    assert!(matches!(ev.eval(id(2)), Err(ReelError::Materialize(_))));
    assert!(matches!(ev.eval(id(3)), Err(ReelError::Materialize(_))));
}

#[test]
fn polar_places_points_on_a_circle() {
    let values = store();
    let fields = [
        FieldExprIR::Const { value: 10.0 },
        FieldExprIR::Normalized,
        FieldExprIR::Polar {
            radius: id(0),
            angle: id(1),
        },
    ];
    let l = FieldEvaluator::new(&fields, &values, 3).eval(id(2)).unwrap();
    for p in l.data.chunks(2) {
        assert!((p[0].hypot(p[1]) - 10.0).abs() < 1e-9);
    }
    assert!((l.data[2] + 10.0).abs() < 1e-9);
}

#[test]
fn random_is_deterministic_and_in_range() {
    let values = store();
    let fields = [FieldExprIR::Random { seed: 42 }];
    let a = FieldEvaluator::new(&fields, &values, 64).eval(id(0)).unwrap();
    let b = FieldEvaluator::new(&fields, &values, 64).eval(id(0)).unwrap();
    assert_eq!(a, b);
    assert!(a.data.iter().all(|v| (0.0..1.0).contains(v)));
}

#[test]
fn unary_and_color_packing() {
    let values = store();
    let fields = [
        FieldExprIR::Const { value: -0.25 },
        FieldExprIR::Unary {
            fun: UnaryFn::Abs,
            arg: id(0),
        },
        FieldExprIR::Color {
            r: id(1),
            g: id(1),
            b: id(0),
            a: id(1),
        },
    ];
    let l = FieldEvaluator::new(&fields, &values, 1).eval(id(2)).unwrap();
    assert_eq!(l.components, 4);
    assert_eq!(l.data, vec![0.25, 0.25, -0.25, 0.25]);
}

#[test]
fn unknown_ids_cycles_and_bad_signals_fail() {
    let values = store();
    let cyclic = [FieldExprIR::Unary {
        fun: UnaryFn::Neg,
        arg: id(0),
    }];
    let ev = FieldEvaluator::new(&cyclic, &values, 1);
    assert!(matches!(ev.eval(id(0)), Err(ReelError::Evaluation(_))));
    assert!(matches!(ev.eval(id(9)), Err(ReelError::Contract(_))));

    let unwritten = [FieldExprIR::Signal { slot: SlotId(3) }];
    let ev = FieldEvaluator::new(&unwritten, &values, 1);
    assert!(matches!(ev.eval(id(0)), Err(ReelError::Materialize(_))));
}

#[test]
fn binary_min_max_keep_nan() {
    assert!(BinaryFn::Min.apply(f64::NAN, 0.0).is_nan());
    assert!(BinaryFn::Max.apply(0.0, f64::NAN).is_nan());
    assert_eq!(BinaryFn::Max.apply(-1.0, 2.0), 2.0);
}
