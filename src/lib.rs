//! Reel is the frame runtime of a node-graph animation system.
//!
//! A graph compiler (outside this crate) lowers an authored patch into a
//! [`CompiledProgramIR`]: a flat, typed, pre-ordered schedule over numbered value slots. Reel
//! executes that schedule once per frame and hands back a [`RenderFrameIR`] for an external
//! rendering backend.
//!
//! # Frame pipeline
//!
//! 1. **Lifecycle**: bump the frame id, clear per-frame slot values, empty the frame cache.
//! 2. **Time**: map host time onto the program's [`TimeModel`] (finite, cyclic, infinite).
//! 3. **Steps**: run every [`Step`] in stored order (operators, buses, materializers).
//! 4. **Output**: extract the render frame slot and validate its buffers.
//!
//! # Design constraints
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: the same program, inputs and time sequence produce identical frames.
//! - **Write once**: a slot written twice in one frame aborts the frame
//!   ([`ReelError::DoubleWrite`]).
//! - **Hot-swappable**: [`swap_program`] replaces the program between frames while keeping
//!   operator state, time bookkeeping and the mesh cache.
//!
//! # Getting started
//!
//! [`Session`] pairs a program with its [`RuntimeState`]; call [`Session::render`] once per
//! frame and [`Session::swap`] whenever the compiler emits a new program.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod bus;
mod exec;
mod field;
mod foundation;
mod frame;
mod ir;
mod materialize;
mod session;
mod store;
mod time;

pub use animation::ease::{Ease, Waveform};
pub use bus::combine::{
    BusSpec, BusValue, BusValueType, CombineMode, Publisher, PublisherTransform, SilentValue,
    apply_transforms, combine, resolve_silent,
};
pub use bus::events::{BusEvent, merge_events};
pub use exec::executor::{execute_frame, execute_frame_with_mode};
pub use exec::probe::{ProbeRecord, ProbeSink, ProbeValue, RecordingProbe};
pub use exec::runtime::{FrameStats, NumericHealth, RuntimeOpts, RuntimeState};
pub use exec::swap::{swap_program, swap_program_in_place};
pub use field::expr::{BinaryFn, FieldExprIR, UnaryFn};
pub use foundation::core::{
    BezPath, BusId, ConstId, FieldExprId, PathEl, Point, ProbeId, Rect, Rgba, SlotId,
    StateCellIdx, StateKey, Vec2,
};
pub use foundation::error::{ReelError, ReelResult};
pub use foundation::math::Fingerprint;
pub use frame::validate::validate_frame;
pub use ir::frame::{
    ClearMode, ClearSpec, Instances2DPass, Instances3DPass, Paths2DPass, PathStyle,
    RENDER_FRAME_VERSION, RenderFrameIR, RenderPassIR,
};
pub use ir::program::{
    CompiledProgramIR, ConstValue, OutputKind, OutputSpec, PathCommand, PathIR, Schedule,
    SlotMeta, StateCellSpec, StateLayout, StorageClass, TypeTag,
};
pub use ir::step::{
    BusEvalStep, CameraEvalStep, DebugProbeStep, EventBusEvalStep, InstanceShape,
    MaterializeColorStep, MaterializeInstances3DStep, MaterializeMeshStep, MaterializePathStep,
    MaterializeStep, MaterializeTestGeometryStep, NodeEvalStep, NodeOp, PassSpec,
    RenderAssembleStep, Step, TimeDeriveStep,
};
pub use materialize::MAX_DOMAIN;
pub use materialize::buffers::{
    Aabb, BufferFormat, Camera, ColorChannels, FieldBuffer, Instances3D, MeshBuffers,
    MeshIndices, PathBuffers, path_op,
};
pub use materialize::geometry::{
    CameraSpec, TestLayout, instances_from_positions, layout_positions,
};
pub use materialize::mesh::{
    Bevel, DEFAULT_MESH_CACHE_CAPACITY, Extrude, IndexType, MAX_OUTLINE_POINTS, MeshAttributes,
    MeshRecipe, MeshStore, Profile, Winding, generate_mesh, profile_outline,
};
pub use materialize::path::encode_paths;
pub use session::Session;
pub use store::frame_cache::{CacheKey, FrameCache};
pub use store::state::{CellValues, MigrationReport, StateBuffer};
pub use store::value::{ObjectValue, Value};
pub use store::values::{NonFiniteTally, ValueStore};
pub use time::resolver::{
    CyclicMode, DEFAULT_SCRUB_THRESHOLD_MS, EffectiveTime, TimeMode, TimeModel, TimeState,
    resolve_time, resolve_time_with_threshold,
};
