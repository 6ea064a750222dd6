use std::sync::Arc;

use crate::field::eval::FieldEvaluator;
use crate::field::expr::FieldExprIR;
use crate::foundation::core::{FieldExprId, SlotId};
use crate::foundation::error::{ReelError, ReelResult};
use crate::materialize::buffers::{BufferFormat, FieldBuffer};
use crate::materialize::read_domain;
use crate::store::frame_cache::{CacheKey, FrameCache};
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// Evaluate `field` over the count held in `domain` into a `format` buffer.
///
/// Results are memoized in `cache` for the rest of the frame under
/// `(field, domain, format)`.
pub(crate) fn materialize_field(
    field: FieldExprId,
    domain: SlotId,
    format: BufferFormat,
    fields: &[FieldExprIR],
    values: &ValueStore,
    cache: &mut FrameCache,
) -> ReelResult<Arc<FieldBuffer>> {
    let key = CacheKey::Field {
        field,
        domain,
        format,
    };
    if let Some(ObjectValue::FieldBuffer(buf)) = cache.get(&key) {
        tracing::trace!(field = field.0, domain = domain.0, "field cache hit");
        return Ok(buf);
    }

    let count = read_domain(values, domain)?;
    let lanes = FieldEvaluator::new(fields, values, count as usize).eval(field)?;
    if lanes.components != format.components() {
        return Err(ReelError::materialize(format!(
            "field expression {} yields {} components, format {format:?} needs {}",
            field.0,
            lanes.components,
            format.components()
        )));
    }
    let data = lanes.data.into_iter().map(|v| v as f32).collect();
    let buf = Arc::new(FieldBuffer::new(format, count, data));
    cache.insert(key, ObjectValue::FieldBuffer(buf.clone()));
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/field.rs"]
mod tests;
