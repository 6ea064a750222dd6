use std::sync::Arc;

use super::*;
use crate::ir::frame::{ClearSpec, Instances2DPass, PathStyle, Paths2DPass};
use crate::ir::step::InstanceShape;
use crate::materialize::buffers::ColorChannels;

fn frame(passes: Vec<RenderPassIR>) -> RenderFrameIR {
    RenderFrameIR {
        version: RENDER_FRAME_VERSION,
        clear: ClearSpec::default(),
        passes,
    }
}

fn instances(count: u32, position_len: usize) -> RenderPassIR {
    RenderPassIR::Instances2D(Instances2DPass {
        count,
        shape: InstanceShape::Circle,
        position: Arc::new(FieldBuffer {
            format: BufferFormat::Vec2F32,
            count,
            data: vec![0.0; position_len],
            non_finite: 0,
        }),
        size: Arc::new(FieldBuffer::splat(count, 1.0)),
        color: Arc::new(ColorChannels::broadcast(count, crate::foundation::core::Rgba::BLACK)),
        opacity: Arc::new(FieldBuffer::splat(count, 1.0)),
    })
}

#[test]
fn empty_frame_is_valid_but_version_and_clear_are_checked() {
    validate_frame(&frame(vec![])).unwrap();

    let mut f = frame(vec![]);
    f.version = 2;
    assert!(validate_frame(&f).is_err());

    let mut f = frame(vec![]);
    f.clear.mode = ClearMode::Color;
    assert!(validate_frame(&f).is_err());
}

#[test]
fn instance_buffers_must_match_count() {
    validate_frame(&frame(vec![instances(3, 6)])).unwrap();
    let err = validate_frame(&frame(vec![instances(3, 4)])).unwrap_err();
    assert!(err.to_string().contains("malformed render frame"));
}

#[test]
fn path_tables_must_be_consistent() {
    let good = PathBuffers {
        commands: vec![path_op::MOVE_TO, path_op::QUAD_TO, path_op::CLOSE],
        points: vec![0.0; 6],
        cmd_start: vec![0],
        cmd_len: vec![3],
        point_start: vec![0],
        point_len: vec![3],
        bounds: crate::foundation::core::Rect::ZERO,
    };
    let pass = |p: PathBuffers| {
        RenderPassIR::Paths2D(Paths2DPass {
            paths: Arc::new(p),
            style: PathStyle::default(),
        })
    };
    validate_frame(&frame(vec![pass(good.clone())])).unwrap();

    let mut bad = good.clone();
    bad.point_len = vec![2];
    assert!(validate_frame(&frame(vec![pass(bad)])).is_err());

    let mut bad = good.clone();
    bad.cmd_len = vec![4];
    assert!(validate_frame(&frame(vec![pass(bad)])).is_err());

    let mut bad = good;
    bad.commands[2] = 9;
    assert!(validate_frame(&frame(vec![pass(bad)])).is_err());
}
