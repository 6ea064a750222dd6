use std::sync::Arc;

use crate::foundation::core::SlotId;
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::frame::{
    ClearSpec, Instances2DPass, Instances3DPass, PathStyle, Paths2DPass, RENDER_FRAME_VERSION,
    RenderFrameIR, RenderPassIR,
};
use crate::ir::program::StorageClass;
use crate::ir::step::PassSpec;
use crate::materialize::buffers::{BufferFormat, ColorChannels, FieldBuffer};
use crate::materialize::read_domain;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// Gather pass inputs from their slots into a [`RenderFrameIR`].
///
/// Buffers are shared with the value store; per-instance scalars given as signals are
/// broadcast over the pass domain.
pub(crate) fn assemble_frame(
    clear: ClearSpec,
    passes: &[PassSpec],
    values: &ValueStore,
) -> ReelResult<RenderFrameIR> {
    let passes = passes
        .iter()
        .map(|p| assemble_pass(p, values))
        .collect::<ReelResult<Vec<_>>>()?;
    Ok(RenderFrameIR {
        version: RENDER_FRAME_VERSION,
        clear,
        passes,
    })
}

fn assemble_pass(spec: &PassSpec, values: &ValueStore) -> ReelResult<RenderPassIR> {
    Ok(match *spec {
        PassSpec::Instances2D {
            domain,
            position,
            size,
            color,
            opacity,
            shape,
        } => {
            let count = read_domain(values, domain)?;
            RenderPassIR::Instances2D(Instances2DPass {
                count,
                shape,
                position: vec2_buffer(values, position, count)?,
                size: scalar_buffer(values, size, count)?,
                color: color_channels(values, color, count)?,
                opacity: match opacity {
                    Some(slot) => scalar_buffer(values, slot, count)?,
                    None => Arc::new(FieldBuffer::splat(count, 1.0)),
                },
            })
        }
        PassSpec::Paths2D {
            paths,
            fill,
            stroke,
            stroke_width,
        } => {
            let paths = match values.read_object(paths)? {
                Some(ObjectValue::Paths(p)) => p.clone(),
                other => return Err(unexpected(paths, "encoded paths", other)),
            };
            let stroke_rgba = stroke.map(|s| color_signal(values, s)).transpose()?;
            let stroke_width = match (stroke_rgba, stroke_width) {
                (Some(_), None) => {
                    return Err(ReelError::contract("paths pass has a stroke but no stroke width"));
                }
                (_, Some(w)) => values.read_f64(w)? as f32,
                (None, None) => 0.0,
            };
            RenderPassIR::Paths2D(Paths2DPass {
                paths,
                style: PathStyle {
                    fill_rgba: fill.map(|f| color_signal(values, f)).transpose()?,
                    stroke_rgba,
                    stroke_width,
                },
            })
        }
        PassSpec::Instances3D {
            mesh,
            instances,
            camera,
            color,
        } => RenderPassIR::Instances3D(Instances3DPass {
            mesh: match values.read_object(mesh)? {
                Some(ObjectValue::Mesh(m)) => m.clone(),
                other => return Err(unexpected(mesh, "a mesh", other)),
            },
            instances: match values.read_object(instances)? {
                Some(ObjectValue::Instances3D(i)) => i.clone(),
                other => return Err(unexpected(instances, "instances", other)),
            },
            view_proj: match values.read_object(camera)? {
                Some(ObjectValue::Camera(c)) => c.view_proj,
                other => return Err(unexpected(camera, "a camera", other)),
            },
            color_rgba: match color {
                Some(c) => color_signal(values, c)?,
                None => [1.0; 4],
            },
        }),
    })
}

fn unexpected(slot: SlotId, want: &str, got: Option<&ObjectValue>) -> ReelError {
    ReelError::contract(format!(
        "render pass expected {want} in slot {}, found {}",
        slot.0,
        got.map_or("nothing", ObjectValue::kind_name)
    ))
}

fn check_buffer(slot: SlotId, buf: &FieldBuffer, format: BufferFormat, count: u32) -> ReelResult<()> {
    if buf.format != format || buf.count != count {
        return Err(ReelError::contract(format!(
            "slot {} holds {} x {:?}, pass needs {count} x {format:?}",
            slot.0, buf.count, buf.format
        )));
    }
    Ok(())
}

fn vec2_buffer(values: &ValueStore, slot: SlotId, count: u32) -> ReelResult<Arc<FieldBuffer>> {
    match values.read_object(slot)? {
        Some(ObjectValue::FieldBuffer(b)) => {
            check_buffer(slot, b, BufferFormat::Vec2F32, count)?;
            Ok(b.clone())
        }
        Some(ObjectValue::Vec2(v)) => {
            let data = (0..count).flat_map(|_| [v.x as f32, v.y as f32]).collect();
            Ok(Arc::new(FieldBuffer::new(BufferFormat::Vec2F32, count, data)))
        }
        other => Err(unexpected(slot, "vec2 positions", other)),
    }
}

fn scalar_buffer(values: &ValueStore, slot: SlotId, count: u32) -> ReelResult<Arc<FieldBuffer>> {
    if values.storage_of(slot)? != StorageClass::Object {
        return Ok(Arc::new(FieldBuffer::splat(count, values.read_f64(slot)? as f32)));
    }
    match values.read_object(slot)? {
        Some(ObjectValue::FieldBuffer(b)) => {
            check_buffer(slot, b, BufferFormat::F32, count)?;
            Ok(b.clone())
        }
        other => Err(unexpected(slot, "a scalar", other)),
    }
}

fn color_channels(values: &ValueStore, slot: SlotId, count: u32) -> ReelResult<Arc<ColorChannels>> {
    match values.read_object(slot)? {
        Some(ObjectValue::ColorBuffer(c)) if c.count == count => Ok(c.clone()),
        Some(ObjectValue::Color(c)) => Ok(Arc::new(ColorChannels::broadcast(count, *c))),
        Some(ObjectValue::FieldBuffer(b)) => {
            check_buffer(slot, b, BufferFormat::RgbaF32, count)?;
            Ok(Arc::new(ColorChannels::from_rgba(b)?))
        }
        other => Err(unexpected(slot, "colors", other)),
    }
}

fn color_signal(values: &ValueStore, slot: SlotId) -> ReelResult<[f32; 4]> {
    match values.read_object(slot)? {
        Some(ObjectValue::Color(c)) => Ok(c.to_array()),
        other => Err(unexpected(slot, "a color", other)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/assemble.rs"]
mod tests;
