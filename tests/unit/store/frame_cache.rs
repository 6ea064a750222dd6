use std::sync::Arc;

use super::*;
use crate::materialize::buffers::FieldBuffer;

fn key(field: u32) -> CacheKey {
    CacheKey::Field {
        field: FieldExprId(field),
        domain: SlotId(0),
        format: BufferFormat::F32,
    }
}

fn buffer() -> ObjectValue {
    ObjectValue::FieldBuffer(Arc::new(FieldBuffer::new(BufferFormat::F32, 2, vec![1.0, 2.0])))
}

#[test]
fn hit_after_insert_miss_before() {
    let mut cache = FrameCache::new();
    assert!(cache.get(&key(0)).is_none());
    cache.insert(key(0), buffer());
    assert_eq!(cache.get(&key(0)), Some(buffer()));
    assert!(cache.get(&key(1)).is_none());
    assert_eq!((cache.hits(), cache.misses()), (1, 2));
}

#[test]
fn begin_frame_wipes_entries_and_tracks_frame_id() {
    let mut cache = FrameCache::new();
    cache.insert(key(0), buffer());
    cache.begin_frame(7);
    assert_eq!(cache.frame_id(), 7);
    assert!(cache.is_empty());
    assert!(cache.get(&key(0)).is_none());
}

#[test]
fn format_is_part_of_the_key() {
    let mut cache = FrameCache::new();
    cache.insert(key(0), buffer());
    let other = CacheKey::Field {
        field: FieldExprId(0),
        domain: SlotId(0),
        format: BufferFormat::Vec2F32,
    };
    assert!(cache.get(&other).is_none());
}
