use std::any::Any;

use crate::foundation::core::{ProbeId, SlotId};
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// Snapshot of one probed slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProbeValue {
    /// Not written this frame.
    Unwritten,
    /// Numeric slot.
    Number(f64),
    /// 2D vector.
    Vec2([f64; 2]),
    /// Color.
    Color([f32; 4]),
    /// Any other object, by kind and element count where one applies.
    Object {
        /// Object kind.
        kind: &'static str,
        /// Element count for buffers.
        count: Option<u32>,
    },
}

impl ProbeValue {
    pub(crate) fn capture(values: &ValueStore, slot: SlotId) -> Self {
        if !values.is_written(slot) {
            return Self::Unwritten;
        }
        match values.read(slot) {
            Ok(v) => v.as_f64().map_or(Self::Unwritten, Self::Number),
            Err(_) => match values.read_object(slot) {
                Ok(Some(ObjectValue::Vec2(v))) => Self::Vec2([v.x, v.y]),
                Ok(Some(ObjectValue::Color(c))) => Self::Color(c.to_array()),
                Ok(Some(obj)) => Self::Object {
                    kind: obj.kind_name(),
                    count: object_count(obj),
                },
                Ok(None) | Err(_) => Self::Unwritten,
            },
        }
    }
}

fn object_count(obj: &ObjectValue) -> Option<u32> {
    match obj {
        ObjectValue::FieldBuffer(b) => Some(b.count),
        ObjectValue::ColorBuffer(c) => Some(c.count),
        ObjectValue::Paths(p) => Some(p.path_count() as u32),
        ObjectValue::Mesh(m) => Some(m.vertex_count),
        ObjectValue::Instances3D(i) => Some(i.count),
        ObjectValue::Events(e) => Some(e.len() as u32),
        ObjectValue::PathSource(p) => Some(p.len() as u32),
        ObjectValue::Frame(f) => Some(f.passes.len() as u32),
        ObjectValue::Vec2(_) | ObjectValue::Color(_) | ObjectValue::Field(_) | ObjectValue::Camera(_) => {
            None
        }
    }
}

/// What a probe point observed in one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ProbeRecord {
    /// Frame that executed the probe step.
    pub frame_id: u64,
    /// Probe point.
    pub probe: ProbeId,
    /// Model time of the frame.
    pub t_model_ms: f64,
    /// Probed slots in step order.
    pub values: Vec<(SlotId, ProbeValue)>,
}

/// Receiver for debug probe records (inspectors, debug panels, tests).
///
/// Sinks observe; they cannot fail or alter a frame.
pub trait ProbeSink: Any {
    /// Called once per executed probe step.
    fn record(&mut self, record: ProbeRecord);
}

/// In-memory probe sink.
#[derive(Debug, Default)]
pub struct RecordingProbe {
    /// Records in arrival order.
    pub records: Vec<ProbeRecord>,
}

impl RecordingProbe {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProbeSink for RecordingProbe {
    fn record(&mut self, record: ProbeRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/probe.rs"]
mod tests;
