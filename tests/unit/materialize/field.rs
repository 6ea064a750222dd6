use super::*;
use crate::ir::program::{SlotMeta, StorageClass, TypeTag};

fn setup(count: f64) -> ValueStore {
    let mut v = ValueStore::new(&[SlotMeta::new(StorageClass::U32, TypeTag::Domain)]);
    v.write_number(SlotId(0), count).unwrap();
    v
}

#[test]
fn miss_then_hit_shares_the_buffer() {
    let values = setup(4.0);
    let fields = [FieldExprIR::Normalized];
    let mut cache = FrameCache::new();
    let a = materialize_field(
        FieldExprId(0),
        SlotId(0),
        BufferFormat::F32,
        &fields,
        &values,
        &mut cache,
    )
    .unwrap();
    let b = materialize_field(
        FieldExprId(0),
        SlotId(0),
        BufferFormat::F32,
        &fields,
        &values,
        &mut cache,
    )
    .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.count, 4);
    assert_eq!(a.data.len(), 4);
    assert_eq!((cache.hits(), cache.misses()), (1, 1));
}

#[test]
fn format_must_match_component_count() {
    let values = setup(2.0);
    let fields = [FieldExprIR::Index];
    let err = materialize_field(
        FieldExprId(0),
        SlotId(0),
        BufferFormat::Vec2F32,
        &fields,
        &values,
        &mut FrameCache::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Materialize(_)));
}

#[test]
fn non_finite_values_are_counted_not_rejected() {
    let values = setup(3.0);
    let fields = [
        FieldExprIR::Index,
        FieldExprIR::Const { value: 0.0 },
        FieldExprIR::Binary {
            fun: crate::field::expr::BinaryFn::Div,
            a: FieldExprId(0),
            b: FieldExprId(1),
        },
    ];
    let buf = materialize_field(
        FieldExprId(2),
        SlotId(0),
        BufferFormat::F32,
        &fields,
        &values,
        &mut FrameCache::new(),
    )
    .unwrap();
    // 0/0 = NaN, 1/0 and 2/0 = inf
    assert_eq!(buf.non_finite, 3);
}
