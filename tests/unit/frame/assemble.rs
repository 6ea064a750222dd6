use super::*;
use crate::foundation::core::{Rgba, Vec2};
use crate::ir::frame::ClearMode;
use crate::ir::program::{PathCommand, PathIR, SlotMeta, TypeTag};
use crate::ir::step::InstanceShape;
use crate::materialize::path::encode_paths;

fn store() -> ValueStore {
    let mut v = ValueStore::new(&[
        SlotMeta::new(StorageClass::U32, TypeTag::Domain),
        SlotMeta::new(StorageClass::Object, TypeTag::FieldBuffer),
        SlotMeta::new(StorageClass::F64, TypeTag::Number),
        SlotMeta::new(StorageClass::Object, TypeTag::Color),
        SlotMeta::new(StorageClass::Object, TypeTag::PathBuffer),
        SlotMeta::new(StorageClass::Object, TypeTag::Vec2),
    ]);
    v.write_number(SlotId(0), 2.0).unwrap();
    v.write_object(
        SlotId(1),
        ObjectValue::FieldBuffer(Arc::new(FieldBuffer::new(
            BufferFormat::Vec2F32,
            2,
            vec![0.0, 0.0, 1.0, 1.0],
        ))),
    )
    .unwrap();
    v.write_number(SlotId(2), 4.0).unwrap();
    v.write_object(SlotId(3), ObjectValue::Color(Rgba::new(1.0, 0.0, 0.0, 1.0)))
        .unwrap();
    let paths = encode_paths(&[PathIR {
        commands: vec![
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::LineTo { x: 1.0, y: 0.0 },
        ],
    }])
    .unwrap();
    v.write_object(SlotId(4), ObjectValue::Paths(Arc::new(paths)))
        .unwrap();
    v.write_object(SlotId(5), ObjectValue::Vec2(Vec2::new(3.0, 4.0)))
        .unwrap();
    v
}

fn instances(position: u32) -> PassSpec {
    PassSpec::Instances2D {
        domain: SlotId(0),
        position: SlotId(position),
        size: SlotId(2),
        color: SlotId(3),
        opacity: None,
        shape: InstanceShape::Square,
    }
}

#[test]
fn instances_pass_broadcasts_signals() {
    let values = store();
    let clear = ClearSpec {
        mode: ClearMode::Color,
        color_rgba: Some([0.0, 0.0, 0.0, 1.0]),
    };
    let frame = assemble_frame(clear, &[instances(1)], &values).unwrap();
    assert_eq!(frame.version, RENDER_FRAME_VERSION);
    let RenderPassIR::Instances2D(p) = &frame.passes[0] else {
        panic!("expected instances pass");
    };
    assert_eq!(p.count, 2);
    assert_eq!(p.shape, InstanceShape::Square);
    assert_eq!(p.size.data, vec![4.0, 4.0]);
    assert_eq!(p.opacity.data, vec![1.0, 1.0]);
    assert_eq!(p.color.r, vec![1.0, 1.0]);
    assert_eq!(p.position.data, vec![0.0, 0.0, 1.0, 1.0]);
    crate::frame::validate::validate_frame(&frame).unwrap();
}

#[test]
fn vec2_signal_positions_are_broadcast() {
    let frame = assemble_frame(ClearSpec::default(), &[instances(5)], &store()).unwrap();
    let RenderPassIR::Instances2D(p) = &frame.passes[0] else {
        panic!("expected instances pass");
    };
    assert_eq!(p.position.data, vec![3.0, 4.0, 3.0, 4.0]);
}

#[test]
fn paths_pass_requires_stroke_width_with_stroke() {
    let values = store();
    let mut spec = PassSpec::Paths2D {
        paths: SlotId(4),
        fill: Some(SlotId(3)),
        stroke: Some(SlotId(3)),
        stroke_width: None,
    };
    assert!(assemble_frame(ClearSpec::default(), &[spec.clone()], &values).is_err());

    if let PassSpec::Paths2D { stroke_width, .. } = &mut spec {
        *stroke_width = Some(SlotId(2));
    }
    let frame = assemble_frame(ClearSpec::default(), &[spec], &values).unwrap();
    let RenderPassIR::Paths2D(p) = &frame.passes[0] else {
        panic!("expected paths pass");
    };
    assert_eq!(p.style.stroke_width, 4.0);
    assert_eq!(p.style.fill_rgba, Some([1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn wrong_slot_contents_are_contract_errors() {
    let values = store();
    // Slot 3 holds a color, not positions.
    let err = assemble_frame(ClearSpec::default(), &[instances(3)], &values).unwrap_err();
    assert!(matches!(err, ReelError::Contract(_)));
}
