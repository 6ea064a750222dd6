use super::*;
use crate::ir::program::{SlotMeta, StorageClass, TypeTag};

fn square() -> PathIR {
    PathIR {
        commands: vec![
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::LineTo { x: 10.0, y: 0.0 },
            PathCommand::LineTo { x: 10.0, y: 10.0 },
            PathCommand::LineTo { x: 0.0, y: 10.0 },
            PathCommand::Close,
        ],
    }
}

fn curve() -> PathIR {
    PathIR {
        commands: vec![
            PathCommand::MoveTo { x: -5.0, y: 0.0 },
            PathCommand::QuadTo {
                x1: 0.0,
                y1: 20.0,
                x: 5.0,
                y: 0.0,
            },
            PathCommand::CubicTo {
                x1: 6.0,
                y1: 1.0,
                x2: 7.0,
                y2: 2.0,
                x: 8.0,
                y: 3.0,
            },
        ],
    }
}

#[test]
fn encodes_opcodes_points_and_tables() {
    let enc = encode_paths(&[square(), curve()]).unwrap();
    assert_eq!(
        enc.commands,
        vec![
            path_op::MOVE_TO,
            path_op::LINE_TO,
            path_op::LINE_TO,
            path_op::LINE_TO,
            path_op::CLOSE,
            path_op::MOVE_TO,
            path_op::QUAD_TO,
            path_op::CUBIC_TO,
        ]
    );
    // 4 + (1 + 2 + 3) points.
    assert_eq!(enc.points.len(), 10 * 2);
    assert_eq!(enc.cmd_start, vec![0, 5]);
    assert_eq!(enc.cmd_len, vec![5, 3]);
    assert_eq!(enc.point_start, vec![0, 4]);
    assert_eq!(enc.point_len, vec![4, 6]);
    assert_eq!(enc.path_count(), 2);
    assert_eq!(enc.bounds, Rect::new(-5.0, 0.0, 10.0, 20.0));
}

#[test]
fn point_count_matches_opcode_arity() {
    let enc = encode_paths(&[curve(), square(), PathIR::default()]).unwrap();
    let expected: usize = enc.commands.iter().map(|&op| path_op::arity(op)).sum();
    assert_eq!(enc.points.len(), expected * 2);
    assert_eq!(enc.cmd_len[2], 0);
}

#[test]
fn path_without_leading_move_is_malformed() {
    let bad = PathIR {
        commands: vec![PathCommand::LineTo { x: 1.0, y: 1.0 }],
    };
    assert!(matches!(
        encode_paths(&[bad]),
        Err(ReelError::Materialize(_))
    ));
}

#[test]
fn domain_limits_encoded_paths() {
    let mut v = ValueStore::new(&[
        SlotMeta::new(StorageClass::Object, TypeTag::PathSource),
        SlotMeta::new(StorageClass::U32, TypeTag::Domain),
        SlotMeta::new(StorageClass::Object, TypeTag::Number),
    ]);
    v.write_object(
        SlotId(0),
        ObjectValue::PathSource(vec![square(), curve()].into()),
    )
    .unwrap();
    v.write_number(SlotId(1), 1.0).unwrap();
    let enc = materialize_path(SlotId(0), Some(SlotId(1)), &v).unwrap();
    assert_eq!(enc.path_count(), 1);
    assert_eq!(materialize_path(SlotId(0), None, &v).unwrap().path_count(), 2);
    assert!(materialize_path(SlotId(2), None, &v).is_err());
}
