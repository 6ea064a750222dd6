use crate::foundation::core::SlotId;
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::program::{SlotMeta, StorageClass, TypeTag};
use crate::store::value::{ObjectValue, Value};

#[derive(Clone, Copy, Debug)]
struct SlotLoc {
    storage: StorageClass,
    ty: TypeTag,
    offset: u32,
}

/// Per-frame, single-writer-per-slot typed storage.
///
/// Slots are packed into one dense column per storage class. A bitmap records which slots
/// have been written in the current frame; a second write before [`ValueStore::clear`] is a
/// [`ReelError::DoubleWrite`].
///
/// Reads consult the bitmap, so a slot that was not written this frame always reads as its
/// storage default even though the column still holds last frame's value.
#[derive(Debug)]
pub struct ValueStore {
    locs: Vec<SlotLoc>,
    f64s: Vec<f64>,
    f32s: Vec<f32>,
    i32s: Vec<i32>,
    u32s: Vec<u32>,
    objects: Vec<Option<ObjectValue>>,
    written: Vec<u64>,
    frame_id: u64,
    tally: NonFiniteTally,
}

/// Non-finite scalar writes observed since the last clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NonFiniteTally {
    /// NaN writes.
    pub nan: u64,
    /// ±Infinity writes.
    pub inf: u64,
}

impl NonFiniteTally {
    pub(crate) fn observe(&mut self, v: f64) {
        if v.is_nan() {
            self.nan += 1;
        } else if v.is_infinite() {
            self.inf += 1;
        }
    }

    /// Any non-finite value observed.
    pub fn any(self) -> bool {
        self.nan + self.inf > 0
    }
}

impl ValueStore {
    /// Lay out storage for `meta`.
    pub fn new(meta: &[SlotMeta]) -> Self {
        let mut counts = [0u32; 5];
        let locs = meta
            .iter()
            .map(|m| {
                let c = &mut counts[class_index(m.storage)];
                let offset = *c;
                *c += 1;
                SlotLoc {
                    storage: m.storage,
                    ty: m.ty,
                    offset,
                }
            })
            .collect::<Vec<_>>();

        Self {
            f64s: vec![0.0; counts[0] as usize],
            f32s: vec![0.0; counts[1] as usize],
            i32s: vec![0; counts[2] as usize],
            u32s: vec![0; counts[3] as usize],
            objects: vec![None; counts[4] as usize],
            written: vec![0; locs.len().div_ceil(64)],
            locs,
            frame_id: 0,
            tally: NonFiniteTally::default(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    /// `true` when the program declares no slots.
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }

    /// Frame the write-tracking currently belongs to.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Start a new frame: reset write tracking and the non-finite tally.
    ///
    /// Object payloads are released so large buffers do not outlive their frame; scalar
    /// columns are left as-is (reads gate on write tracking).
    pub fn clear(&mut self, frame_id: u64) {
        self.written.fill(0);
        self.objects.fill(None);
        self.frame_id = frame_id;
        self.tally = NonFiniteTally::default();
    }

    /// Non-finite scalar writes this frame.
    pub fn non_finite(&self) -> NonFiniteTally {
        self.tally
    }

    /// Whether `slot` has been written this frame.
    pub fn is_written(&self, slot: SlotId) -> bool {
        let i = slot.index();
        i < self.locs.len() && self.written[i / 64] & (1u64 << (i % 64)) != 0
    }

    /// Type tag declared for `slot`.
    pub fn type_of(&self, slot: SlotId) -> ReelResult<TypeTag> {
        Ok(self.loc(slot)?.ty)
    }

    /// Storage class declared for `slot`.
    pub fn storage_of(&self, slot: SlotId) -> ReelResult<StorageClass> {
        Ok(self.loc(slot)?.storage)
    }

    /// Write `value` into `slot`; fails on a second write this frame or on a storage mismatch.
    pub fn write(&mut self, slot: SlotId, value: Value) -> ReelResult<()> {
        let loc = self.loc(slot)?;
        if self.is_written(slot) {
            return Err(ReelError::DoubleWrite {
                slot: slot.0,
                frame_id: self.frame_id,
            });
        }
        if value.storage_class() != loc.storage {
            return Err(ReelError::contract(format!(
                "slot {} has storage {:?} but received {:?}",
                slot.0,
                loc.storage,
                value.storage_class()
            )));
        }
        debug_assert!(
            loc.ty.accepts(&value),
            "slot {} typed {:?} received {:?}",
            slot.0,
            loc.ty,
            value
        );

        let o = loc.offset as usize;
        match value {
            Value::F64(v) => {
                self.tally.observe(v);
                self.f64s[o] = v;
            }
            Value::F32(v) => {
                self.tally.observe(f64::from(v));
                self.f32s[o] = v;
            }
            Value::I32(v) => self.i32s[o] = v,
            Value::U32(v) => self.u32s[o] = v,
            Value::Object(v) => self.objects[o] = Some(v),
        }
        let i = slot.index();
        self.written[i / 64] |= 1u64 << (i % 64);
        Ok(())
    }

    /// Write a scalar, converting it to the slot's numeric storage class.
    pub fn write_number(&mut self, slot: SlotId, v: f64) -> ReelResult<()> {
        let storage = self.loc(slot)?.storage;
        let value = Value::numeric_for(storage, v).ok_or_else(|| {
            ReelError::contract(format!("slot {} is an object slot, expected numeric", slot.0))
        })?;
        self.write(slot, value)
    }

    /// Write a boolean as `0`/`1` in the slot's numeric storage class.
    pub fn write_bool(&mut self, slot: SlotId, v: bool) -> ReelResult<()> {
        self.write_number(slot, if v { 1.0 } else { 0.0 })
    }

    /// Write an object payload.
    pub fn write_object(&mut self, slot: SlotId, v: ObjectValue) -> ReelResult<()> {
        self.write(slot, Value::Object(v))
    }

    /// Read a numeric slot by value. Unwritten slots read as `0`.
    ///
    /// Object slots are borrowed through [`ValueStore::read_object`] instead; reading one here
    /// is a contract error whether or not it has been written.
    pub fn read(&self, slot: SlotId) -> ReelResult<Value> {
        let loc = self.loc(slot)?;
        let live = self.is_written(slot);
        let o = loc.offset as usize;
        Ok(match loc.storage {
            StorageClass::F64 => Value::F64(if live { self.f64s[o] } else { 0.0 }),
            StorageClass::F32 => Value::F32(if live { self.f32s[o] } else { 0.0 }),
            StorageClass::I32 => Value::I32(if live { self.i32s[o] } else { 0 }),
            StorageClass::U32 => Value::U32(if live { self.u32s[o] } else { 0 }),
            StorageClass::Object => {
                return Err(ReelError::contract(format!(
                    "slot {} is an object slot; use read_object",
                    slot.0
                )));
            }
        })
    }

    /// Read a numeric slot as `f64`.
    pub fn read_f64(&self, slot: SlotId) -> ReelResult<f64> {
        self.read(slot)?
            .as_f64()
            .ok_or_else(|| ReelError::contract(format!("slot {} is not numeric", slot.0)))
    }

    /// Read a numeric slot as a trigger (`!= 0`).
    pub fn read_bool(&self, slot: SlotId) -> ReelResult<bool> {
        Ok(self.read_f64(slot)? != 0.0)
    }

    /// Read an object slot; `None` when unwritten this frame.
    pub fn read_object(&self, slot: SlotId) -> ReelResult<Option<&ObjectValue>> {
        let loc = self.loc(slot)?;
        if loc.storage != StorageClass::Object {
            return Err(ReelError::contract(format!(
                "slot {} has storage {:?}, expected object",
                slot.0, loc.storage
            )));
        }
        if !self.is_written(slot) {
            return Ok(None);
        }
        Ok(self.objects[loc.offset as usize].as_ref())
    }

    fn loc(&self, slot: SlotId) -> ReelResult<SlotLoc> {
        self.locs
            .get(slot.index())
            .copied()
            .ok_or_else(|| ReelError::contract(format!("slot {} has no slot meta", slot.0)))
    }
}

fn class_index(c: StorageClass) -> usize {
    match c {
        StorageClass::F64 => 0,
        StorageClass::F32 => 1,
        StorageClass::I32 => 2,
        StorageClass::U32 => 3,
        StorageClass::Object => 4,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/values.rs"]
mod tests;
