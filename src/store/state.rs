use std::collections::HashMap;

use crate::foundation::core::{StateCellIdx, StateKey};
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::program::{ConstValue, StateLayout, StorageClass, lookup_constant};

#[derive(Clone, Debug)]
struct CellLoc {
    key: StateKey,
    storage: StorageClass,
    offset: usize,
    len: usize,
}

/// Borrowed view of one state cell's lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellValues<'a> {
    /// `f64` lanes.
    F64(&'a [f64]),
    /// `f32` lanes.
    F32(&'a [f32]),
    /// `i32` lanes.
    I32(&'a [i32]),
    /// `u32` lanes.
    U32(&'a [u32]),
}

/// Outcome of carrying state across a hot-swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Cells whose identity matched and whose values were copied.
    pub preserved: usize,
    /// New cells initialized from constants or zero.
    pub initialized: usize,
    /// Old cells with no counterpart in the new layout.
    pub dropped: usize,
}

/// Persistent typed storage for stateful operators.
///
/// Laid out once per program from its [`StateLayout`]. Unlike the value store, contents
/// survive frame boundaries, and cells are carried across hot-swaps by `(node_id, role)`.
#[derive(Debug, Default)]
pub struct StateBuffer {
    cells: Vec<CellLoc>,
    by_key: HashMap<StateKey, StateCellIdx>,
    f64s: Vec<f64>,
    f32s: Vec<f32>,
    i32s: Vec<i32>,
    u32s: Vec<u32>,
}

impl StateBuffer {
    /// Allocate and initialize every cell of `layout`.
    pub fn new(layout: &StateLayout, constants: &[ConstValue]) -> ReelResult<Self> {
        let mut buf = Self::default();
        for (i, spec) in layout.cells.iter().enumerate() {
            let len = spec.len as usize;
            let offset = match spec.storage {
                StorageClass::F64 => grow(&mut buf.f64s, len),
                StorageClass::F32 => grow(&mut buf.f32s, len),
                StorageClass::I32 => grow(&mut buf.i32s, len),
                StorageClass::U32 => grow(&mut buf.u32s, len),
                StorageClass::Object => {
                    return Err(ReelError::contract(format!(
                        "state cell {}/{} cannot use object storage",
                        spec.key.node_id, spec.key.role
                    )));
                }
            };
            let idx = StateCellIdx(i as u32);
            if buf.by_key.insert(spec.key.clone(), idx).is_some() {
                return Err(ReelError::contract(format!(
                    "duplicate state cell {}/{}",
                    spec.key.node_id, spec.key.role
                )));
            }
            buf.cells.push(CellLoc {
                key: spec.key.clone(),
                storage: spec.storage,
                offset,
                len,
            });

            if let Some(id) = spec.init {
                let v = lookup_constant(constants, id)?.as_f64().ok_or_else(|| {
                    ReelError::contract(format!(
                        "state cell {}/{} init constant {} is not numeric",
                        spec.key.node_id, spec.key.role, id.0
                    ))
                })?;
                buf.fill(idx, v);
            }
        }
        Ok(buf)
    }

    /// Build the state for `layout`, copying every cell whose identity, storage class and
    /// length also exist in `old`. Everything else starts from its default.
    pub fn migrate(
        old: &StateBuffer,
        layout: &StateLayout,
        constants: &[ConstValue],
    ) -> ReelResult<(Self, MigrationReport)> {
        let mut new = Self::new(layout, constants)?;
        let mut report = MigrationReport::default();
        for i in 0..new.cells.len() {
            let (key, storage, len) = {
                let c = &new.cells[i];
                (c.key.clone(), c.storage, c.len)
            };
            let matched = old
                .by_key
                .get(&key)
                .map(|&oi| &old.cells[oi.0 as usize])
                .filter(|oc| oc.storage == storage && oc.len == len);
            match matched {
                Some(oc) => {
                    new.copy_lanes_from(i, old, oc);
                    report.preserved += 1;
                }
                None => report.initialized += 1,
            }
        }
        report.dropped = old.cells.len() - report.preserved;
        Ok((new, report))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` when the layout declares no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the cell with identity `key`.
    pub fn index_of(&self, key: &StateKey) -> Option<StateCellIdx> {
        self.by_key.get(key).copied()
    }

    /// Lanes of the cell with identity `key`.
    pub fn get(&self, key: &StateKey) -> Option<CellValues<'_>> {
        self.index_of(key).and_then(|i| self.values(i).ok())
    }

    /// Lanes of cell `idx`.
    pub fn values(&self, idx: StateCellIdx) -> ReelResult<CellValues<'_>> {
        let c = self.cell(idx)?;
        let r = c.offset..c.offset + c.len;
        Ok(match c.storage {
            StorageClass::F64 => CellValues::F64(&self.f64s[r]),
            StorageClass::F32 => CellValues::F32(&self.f32s[r]),
            StorageClass::I32 => CellValues::I32(&self.i32s[r]),
            StorageClass::U32 => CellValues::U32(&self.u32s[r]),
            StorageClass::Object => {
                return Err(ReelError::contract("object state cells are not supported"));
            }
        })
    }

    /// Mutable `f64` lanes of cell `idx`; other storage classes are a contract violation.
    pub fn f64_mut(&mut self, idx: StateCellIdx) -> ReelResult<&mut [f64]> {
        let c = self.cell(idx)?;
        if c.storage != StorageClass::F64 {
            return Err(ReelError::contract(format!(
                "state cell {}/{} has storage {:?}, expected f64",
                c.key.node_id, c.key.role, c.storage
            )));
        }
        let r = c.offset..c.offset + c.len;
        Ok(&mut self.f64s[r])
    }

    fn cell(&self, idx: StateCellIdx) -> ReelResult<&CellLoc> {
        self.cells
            .get(idx.0 as usize)
            .ok_or_else(|| ReelError::contract(format!("unknown state cell {}", idx.0)))
    }

    fn fill(&mut self, idx: StateCellIdx, v: f64) {
        let c = &self.cells[idx.0 as usize];
        let r = c.offset..c.offset + c.len;
        match c.storage {
            StorageClass::F64 => self.f64s[r].fill(v),
            StorageClass::F32 => self.f32s[r].fill(v as f32),
            StorageClass::I32 => self.i32s[r].fill(v as i32),
            StorageClass::U32 => self.u32s[r].fill(v as u32),
            StorageClass::Object => {}
        }
    }

    fn copy_lanes_from(&mut self, i: usize, old: &StateBuffer, oc: &CellLoc) {
        let c = &self.cells[i];
        let dst = c.offset..c.offset + c.len;
        let src = oc.offset..oc.offset + oc.len;
        match c.storage {
            StorageClass::F64 => self.f64s[dst].copy_from_slice(&old.f64s[src]),
            StorageClass::F32 => self.f32s[dst].copy_from_slice(&old.f32s[src]),
            StorageClass::I32 => self.i32s[dst].copy_from_slice(&old.i32s[src]),
            StorageClass::U32 => self.u32s[dst].copy_from_slice(&old.u32s[src]),
            StorageClass::Object => {}
        }
    }
}

fn grow<T: Default + Clone>(v: &mut Vec<T>, len: usize) -> usize {
    let offset = v.len();
    v.resize(offset + len, T::default());
    offset
}

#[cfg(test)]
#[path = "../../tests/unit/store/state.rs"]
mod tests;
