use std::collections::HashMap;

use crate::foundation::core::{FieldExprId, SlotId};
use crate::materialize::buffers::BufferFormat;
use crate::store::value::ObjectValue;

/// Identity of a per-frame materialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Field expression evaluated over the count held in `domain`.
    Field {
        /// Expression.
        field: FieldExprId,
        /// Slot holding the element count.
        domain: SlotId,
        /// Output layout.
        format: BufferFormat,
    },
}

/// Per-frame memo of materialized buffers.
///
/// Entries never outlive their frame: [`FrameCache::begin_frame`] wipes them before the first
/// step runs, so a stale buffer can never be served.
#[derive(Debug, Default)]
pub struct FrameCache {
    frame_id: u64,
    entries: HashMap<CacheKey, ObjectValue>,
    hits: u64,
    misses: u64,
}

impl FrameCache {
    /// Empty cache at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame this cache currently belongs to.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Drop every entry and adopt `frame_id`.
    pub fn begin_frame(&mut self, frame_id: u64) {
        self.entries.clear();
        self.frame_id = frame_id;
        self.hits = 0;
        self.misses = 0;
    }

    /// Only carries the frame id; used when a runtime is rebuilt for a new program.
    pub(crate) fn with_frame_id(frame_id: u64) -> Self {
        Self {
            frame_id,
            ..Self::default()
        }
    }

    /// Cached value for `key`, counting the hit or miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<ObjectValue> {
        match self.entries.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key`.
    pub fn insert(&mut self, key: CacheKey, value: ObjectValue) {
        self.entries.insert(key, value);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hits since the frame began.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Misses since the frame began.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/frame_cache.rs"]
mod tests;
