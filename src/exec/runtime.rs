use std::any::Any;
use std::fmt;

use crate::exec::probe::ProbeSink;
use crate::foundation::error::ReelResult;
use crate::ir::program::CompiledProgramIR;
use crate::materialize::mesh::{DEFAULT_MESH_CACHE_CAPACITY, MeshStore};
use crate::store::frame_cache::FrameCache;
use crate::store::state::{MigrationReport, StateBuffer};
use crate::store::values::ValueStore;
use crate::time::resolver::{DEFAULT_SCRUB_THRESHOLD_MS, EffectiveTime, TimeState};

/// Options controlling runtime behavior.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeOpts {
    /// Forward jump (ms) above which a sample counts as a seek.
    pub scrub_threshold_ms: f64,
    /// Maximum number of generated meshes kept across frames.
    pub mesh_cache_capacity: usize,
    /// Log a warning for frames that produced NaN or infinite values.
    pub warn_on_non_finite: bool,
}

impl Default for RuntimeOpts {
    fn default() -> Self {
        Self {
            scrub_threshold_ms: DEFAULT_SCRUB_THRESHOLD_MS,
            mesh_cache_capacity: DEFAULT_MESH_CACHE_CAPACITY,
            warn_on_non_finite: true,
        }
    }
}

impl RuntimeOpts {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> ReelResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Running tally of non-finite values. Never an error, only a signal for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct NumericHealth {
    /// NaN scalars seen so far.
    pub nan_count: u64,
    /// Infinite scalars seen so far.
    pub inf_count: u64,
    /// Non-finite buffer components seen so far.
    pub buffer_non_finite: u64,
    /// Frames that produced at least one non-finite value.
    pub frames_with_non_finite: u64,
    /// Whether the most recent frame produced any.
    pub last_frame_non_finite: bool,
}

/// Per-frame execution counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameStats {
    /// Frame these counters describe.
    pub frame_id: u64,
    /// Steps dispatched.
    pub steps_executed: u32,
    /// Field materializations served from the frame cache.
    pub field_cache_hits: u64,
    /// Field materializations evaluated.
    pub field_cache_misses: u64,
    /// Mesh requests served from the mesh store.
    pub mesh_cache_hits: u64,
    /// Meshes generated.
    pub mesh_cache_misses: u64,
    /// Non-finite scalars and buffer components produced.
    pub non_finite: u64,
}

/// All mutable state of a running program.
///
/// Owned by the host and passed by `&mut` to every frame, which makes concurrent or
/// reentrant execution unrepresentable. Every cache lives here.
pub struct RuntimeState {
    pub(crate) frame_id: u64,
    pub(crate) values: ValueStore,
    pub(crate) state: StateBuffer,
    pub(crate) frame_cache: FrameCache,
    pub(crate) mesh_store: MeshStore,
    pub(crate) time_state: TimeState,
    pub(crate) effective_time: EffectiveTime,
    pub(crate) numeric: NumericHealth,
    pub(crate) stats: FrameStats,
    pub(crate) probe: Option<Box<dyn ProbeSink>>,
    pub(crate) last_migration: Option<MigrationReport>,
    pub(crate) opts: RuntimeOpts,
}

impl RuntimeState {
    /// Fresh runtime for `program` at frame 0.
    pub fn new(program: &CompiledProgramIR, opts: RuntimeOpts) -> ReelResult<Self> {
        program.time_model.validate()?;
        Ok(Self {
            frame_id: 0,
            values: ValueStore::new(&program.slot_meta),
            state: StateBuffer::new(&program.state_layout, &program.constants)?,
            frame_cache: FrameCache::new(),
            mesh_store: MeshStore::new(opts.mesh_cache_capacity),
            time_state: TimeState::default(),
            effective_time: EffectiveTime::default(),
            numeric: NumericHealth::default(),
            stats: FrameStats::default(),
            probe: None,
            last_migration: None,
            opts,
        })
    }

    /// Id of the most recently started frame (0 before the first).
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// This frame's slot values.
    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    /// Persistent operator state.
    pub fn state(&self) -> &StateBuffer {
        &self.state
    }

    /// Per-frame materialization cache.
    pub fn frame_cache(&self) -> &FrameCache {
        &self.frame_cache
    }

    /// Cross-frame mesh store.
    pub fn mesh_store(&self) -> &MeshStore {
        &self.mesh_store
    }

    /// Time bookkeeping carried between frames.
    pub fn time_state(&self) -> &TimeState {
        &self.time_state
    }

    /// Resolved time of the most recent frame.
    pub fn effective_time(&self) -> &EffectiveTime {
        &self.effective_time
    }

    /// Accumulated non-finite value counts.
    pub fn numeric_health(&self) -> &NumericHealth {
        &self.numeric
    }

    /// Counters of the most recent frame.
    pub fn last_stats(&self) -> &FrameStats {
        &self.stats
    }

    /// State migration outcome of the swap that produced this runtime, if any.
    pub fn last_migration(&self) -> Option<MigrationReport> {
        self.last_migration
    }

    /// Active options.
    pub fn opts(&self) -> &RuntimeOpts {
        &self.opts
    }

    /// Install a probe sink, returning the previous one.
    pub fn set_probe(&mut self, sink: Box<dyn ProbeSink>) -> Option<Box<dyn ProbeSink>> {
        self.probe.replace(sink)
    }

    /// Remove the installed probe sink.
    pub fn take_probe(&mut self) -> Option<Box<dyn ProbeSink>> {
        self.probe.take()
    }

    /// Installed probe sink, if it is a `T`.
    pub fn probe<T: ProbeSink>(&self) -> Option<&T> {
        let sink: &dyn Any = self.probe.as_deref()?;
        sink.downcast_ref::<T>()
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("frame_id", &self.frame_id)
            .field("slots", &self.values.len())
            .field("state_cells", &self.state.len())
            .field("meshes", &self.mesh_store.len())
            .field("time_state", &self.time_state)
            .field("probe", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/runtime.rs"]
mod tests;
