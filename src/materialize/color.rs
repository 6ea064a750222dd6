use std::sync::Arc;

use crate::field::expr::FieldExprIR;
use crate::foundation::core::{Rgba, SlotId};
use crate::foundation::error::{ReelError, ReelResult};
use crate::materialize::buffers::{BufferFormat, ColorChannels, FieldBuffer};
use crate::materialize::field::materialize_field;
use crate::materialize::read_domain;
use crate::store::frame_cache::FrameCache;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

impl ColorChannels {
    /// `count` copies of `c`.
    pub fn broadcast(count: u32, c: Rgba) -> Self {
        let n = count as usize;
        Self {
            count,
            r: vec![c.r; n],
            g: vec![c.g; n],
            b: vec![c.b; n],
            a: vec![c.a; n],
        }
    }

    /// Split an interleaved RGBA buffer into channels.
    pub fn from_rgba(buf: &FieldBuffer) -> ReelResult<Self> {
        if buf.format != BufferFormat::RgbaF32 {
            return Err(ReelError::materialize(format!(
                "color source has format {:?}, expected rgba_f32",
                buf.format
            )));
        }
        let n = buf.count as usize;
        let mut out = Self {
            count: buf.count,
            r: Vec::with_capacity(n),
            g: Vec::with_capacity(n),
            b: Vec::with_capacity(n),
            a: Vec::with_capacity(n),
        };
        for px in buf.data.chunks_exact(4) {
            out.r.push(px[0]);
            out.g.push(px[1]);
            out.b.push(px[2]);
            out.a.push(px[3]);
        }
        Ok(out)
    }
}

/// Produce per-element color channels for the domain in `domain` from `source`.
///
/// `source` may hold a color signal (broadcast), a color field handle, an RGBA field buffer
/// or existing channels; buffers must match the domain count.
pub(crate) fn materialize_color(
    domain: SlotId,
    source: SlotId,
    fields: &[FieldExprIR],
    values: &ValueStore,
    cache: &mut FrameCache,
) -> ReelResult<Arc<ColorChannels>> {
    let count = read_domain(values, domain)?;
    let channels = match values.read_object(source)? {
        Some(ObjectValue::Color(c)) => ColorChannels::broadcast(count, *c),
        Some(ObjectValue::Field(id)) => {
            let buf = materialize_field(*id, domain, BufferFormat::RgbaF32, fields, values, cache)?;
            ColorChannels::from_rgba(&buf)?
        }
        Some(ObjectValue::FieldBuffer(buf)) => {
            check_count(source, buf.count, count)?;
            ColorChannels::from_rgba(buf)?
        }
        Some(ObjectValue::ColorBuffer(ch)) => {
            check_count(source, ch.count, count)?;
            return Ok(ch.clone());
        }
        other => {
            return Err(ReelError::materialize(format!(
                "slot {} cannot be materialized as color (holds {})",
                source.0,
                other.map_or("nothing", ObjectValue::kind_name)
            )));
        }
    };
    Ok(Arc::new(channels))
}

fn check_count(slot: SlotId, have: u32, want: u32) -> ReelResult<()> {
    if have != want {
        return Err(ReelError::materialize(format!(
            "slot {} holds {have} elements, domain has {want}",
            slot.0
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/color.rs"]
mod tests;
