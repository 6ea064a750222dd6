use std::sync::Arc;

use crate::foundation::core::{Point, Rect, SlotId};
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::program::{PathCommand, PathIR};
use crate::materialize::buffers::{PathBuffers, path_op};
use crate::materialize::read_domain;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// Encode `paths` into flat command, point and index tables.
///
/// Each non-empty path must start with a move-to.
pub fn encode_paths(paths: &[PathIR]) -> ReelResult<PathBuffers> {
    let mut out = PathBuffers::default();
    let mut bounds: Option<Rect> = None;
    let mut push = |out: &mut PathBuffers, p: Point| {
        out.points.push(p.x as f32);
        out.points.push(p.y as f32);
        bounds = Some(match bounds {
            Some(b) => b.union_pt(p),
            None => Rect::from_points(p, p),
        });
    };

    for (i, path) in paths.iter().enumerate() {
        if let Some(first) = path.commands.first()
            && !matches!(first, PathCommand::MoveTo { .. })
        {
            return Err(ReelError::materialize(format!(
                "path {i} must start with move_to"
            )));
        }
        out.cmd_start.push(out.commands.len() as u32);
        out.point_start.push((out.points.len() / 2) as u32);
        for cmd in &path.commands {
            match *cmd {
                PathCommand::MoveTo { x, y } => {
                    out.commands.push(path_op::MOVE_TO);
                    push(&mut out, Point::new(x, y));
                }
                PathCommand::LineTo { x, y } => {
                    out.commands.push(path_op::LINE_TO);
                    push(&mut out, Point::new(x, y));
                }
                PathCommand::QuadTo { x1, y1, x, y } => {
                    out.commands.push(path_op::QUAD_TO);
                    push(&mut out, Point::new(x1, y1));
                    push(&mut out, Point::new(x, y));
                }
                PathCommand::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    out.commands.push(path_op::CUBIC_TO);
                    push(&mut out, Point::new(x1, y1));
                    push(&mut out, Point::new(x2, y2));
                    push(&mut out, Point::new(x, y));
                }
                PathCommand::Close => out.commands.push(path_op::CLOSE),
            }
        }
        out.cmd_len.push(out.commands.len() as u32 - out.cmd_start[i]);
        out.point_len.push((out.points.len() / 2) as u32 - out.point_start[i]);
    }
    out.bounds = bounds.unwrap_or(Rect::ZERO);
    Ok(out)
}

/// Encode the path source held in `source`, optionally limited to the first `domain` paths.
pub(crate) fn materialize_path(
    source: SlotId,
    domain: Option<SlotId>,
    values: &ValueStore,
) -> ReelResult<Arc<PathBuffers>> {
    let paths = match values.read_object(source)? {
        Some(ObjectValue::PathSource(p)) => p.clone(),
        Some(ObjectValue::Paths(encoded)) => return Ok(encoded.clone()),
        other => {
            return Err(ReelError::materialize(format!(
                "slot {} holds {}, expected a path source",
                source.0,
                other.map_or("nothing", ObjectValue::kind_name)
            )));
        }
    };
    let limit = match domain {
        Some(d) => (read_domain(values, d)? as usize).min(paths.len()),
        None => paths.len(),
    };
    Ok(Arc::new(encode_paths(&paths[..limit])?))
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/path.rs"]
mod tests;
