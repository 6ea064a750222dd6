use std::sync::Arc;

use crate::bus::combine::{Publisher, debug_assert_sorted};
use crate::foundation::error::{ReelError, ReelResult};
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// A discrete event carried on an event bus.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusEvent {
    /// Model time at which the event fired.
    pub t_ms: f64,
    /// Event payload.
    pub value: f64,
}

/// Concatenate `lists` in order, then stable-sort by time.
///
/// Events with equal timestamps keep publisher order.
pub fn merge_events<'a>(lists: impl IntoIterator<Item = &'a [BusEvent]>) -> Vec<BusEvent> {
    let mut out: Vec<BusEvent> = lists.into_iter().flatten().copied().collect();
    out.sort_by(|a, b| a.t_ms.total_cmp(&b.t_ms));
    out
}

/// Merge the event lists of every enabled publisher. Unwritten sources contribute nothing.
pub(crate) fn eval_event_bus(
    publishers: &[Publisher],
    values: &ValueStore,
) -> ReelResult<Arc<[BusEvent]>> {
    debug_assert_sorted(publishers);

    let mut lists = Vec::with_capacity(publishers.len());
    for p in publishers.iter().filter(|p| p.enabled) {
        match values.read_object(p.source)? {
            None => {}
            Some(ObjectValue::Events(ev)) if p.transforms.is_empty() => lists.push(ev.clone()),
            Some(ObjectValue::Events(ev)) => lists.push(
                ev.iter()
                    .map(|e| BusEvent {
                        t_ms: e.t_ms,
                        value: p.transforms.iter().fold(e.value, |v, t| t.apply(v)),
                    })
                    .collect(),
            ),
            Some(other) => {
                return Err(ReelError::contract(format!(
                    "event publisher {} expected events in slot {}, found {}",
                    p.id,
                    p.source.0,
                    other.kind_name()
                )));
            }
        }
    }
    Ok(merge_events(lists.iter().map(|l| &l[..])).into())
}

#[cfg(test)]
#[path = "../../tests/unit/bus/events.rs"]
mod tests;
