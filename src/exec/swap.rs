use std::mem;

use crate::exec::runtime::{FrameStats, RuntimeState};
use crate::foundation::error::ReelResult;
use crate::ir::program::CompiledProgramIR;
use crate::store::frame_cache::FrameCache;
use crate::store::state::{MigrationReport, StateBuffer};
use crate::store::values::ValueStore;

/// Replace the running program between frames.
///
/// Carries over the frame id, the frame cache's frame id, time bookkeeping, the mesh store,
/// numeric health, options and any installed probe. State cells whose `(node_id, role)`,
/// storage class and length match are copied by value; new cells start from their initial
/// value and cells absent from `new_program` are dropped. Slot values and frame-cache entries
/// are not carried: the next frame recomputes them.
pub fn swap_program(new_program: &CompiledProgramIR, mut old: RuntimeState) -> ReelResult<RuntimeState> {
    rebuild(new_program, &mut old)
}

/// [`swap_program`] in place. On error `runtime` is left untouched, so the host can keep
/// running the old program.
pub fn swap_program_in_place(
    new_program: &CompiledProgramIR,
    runtime: &mut RuntimeState,
) -> ReelResult<MigrationReport> {
    let next = rebuild(new_program, runtime)?;
    let report = next.last_migration.unwrap_or_default();
    *runtime = next;
    Ok(report)
}

#[tracing::instrument(skip_all, fields(frame_id = old.frame_id))]
fn rebuild(new_program: &CompiledProgramIR, old: &mut RuntimeState) -> ReelResult<RuntimeState> {
    // Everything fallible happens before `old` is touched.
    new_program.time_model.validate()?;
    let (state, report) = StateBuffer::migrate(
        &old.state,
        &new_program.state_layout,
        &new_program.constants,
    )?;
    let values = ValueStore::new(&new_program.slot_meta);

    tracing::debug!(
        preserved = report.preserved,
        initialized = report.initialized,
        dropped = report.dropped,
        "program swapped"
    );

    Ok(RuntimeState {
        frame_id: old.frame_id,
        values,
        state,
        frame_cache: FrameCache::with_frame_id(old.frame_cache.frame_id()),
        mesh_store: mem::take(&mut old.mesh_store),
        time_state: old.time_state,
        effective_time: old.effective_time,
        numeric: old.numeric,
        stats: FrameStats::default(),
        probe: old.probe.take(),
        last_migration: Some(report),
        opts: old.opts.clone(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/exec/swap.rs"]
mod tests;
