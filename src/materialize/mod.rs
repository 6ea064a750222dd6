pub(crate) mod buffers;
pub(crate) mod color;
pub(crate) mod field;
pub(crate) mod geometry;
pub(crate) mod mesh;
pub(crate) mod path;

use crate::foundation::core::SlotId;
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::program::StorageClass;
use crate::store::values::ValueStore;

/// Largest element count a single domain may declare.
pub const MAX_DOMAIN: u32 = 1 << 24;

/// Read a domain size from a numeric slot.
///
/// Negative, fractional, non-finite or oversized counts are malformed.
pub(crate) fn read_domain(values: &ValueStore, slot: SlotId) -> ReelResult<u32> {
    if values.storage_of(slot)? == StorageClass::Object {
        return Err(ReelError::materialize(format!(
            "domain slot {} holds an object, expected a count",
            slot.0
        )));
    }
    let n = values.read_f64(slot)?;
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > f64::from(MAX_DOMAIN) {
        return Err(ReelError::materialize(format!(
            "domain slot {} holds {n}, expected a count in 0..={MAX_DOMAIN}",
            slot.0
        )));
    }
    Ok(n as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/domain.rs"]
mod tests;
