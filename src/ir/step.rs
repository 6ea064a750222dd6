use smallvec::SmallVec;

use crate::animation::ease::{Ease, Waveform};
use crate::bus::combine::{BusSpec, Publisher};
use crate::foundation::core::{BusId, ConstId, FieldExprId, ProbeId, SlotId, StateCellIdx};
use crate::ir::frame::ClearSpec;
use crate::materialize::buffers::BufferFormat;
use crate::materialize::geometry::{CameraSpec, TestLayout};
use crate::materialize::mesh::MeshRecipe;

/// One scheduled unit of work.
///
/// The set is closed: the executor matches it exhaustively, so adding a variant without a
/// handler fails to compile.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Copy resolved time signals into slots.
    TimeDerive(TimeDeriveStep),
    /// Evaluate one operator.
    NodeEval(NodeEvalStep),
    /// Combine publisher values into one bus value.
    BusEval(BusEvalStep),
    /// Merge publisher event lists into one bus event list.
    EventBusEval(EventBusEvalStep),
    /// Materialize a field expression into a typed buffer.
    Materialize(MaterializeStep),
    /// Materialize a color signal or color field into parallel RGBA channels.
    MaterializeColor(MaterializeColorStep),
    /// Encode a path source into command/point/index buffers.
    MaterializePath(MaterializePathStep),
    /// Generate (or fetch from cache) a mesh from a recipe.
    MaterializeMesh(MaterializeMeshStep),
    /// Lay a domain out as simple reference geometry.
    MaterializeTestGeometry(MaterializeTestGeometryStep),
    /// Evaluate a 3D orbit camera.
    CameraEval(CameraEvalStep),
    /// Expand a 3D position field into per-instance transforms.
    #[serde(rename = "materialize_instances3d")]
    MaterializeInstances3D(MaterializeInstances3DStep),
    /// Assemble the frame's render description.
    RenderAssemble(RenderAssembleStep),
    /// Report slot values to the installed probe sink.
    DebugProbe(DebugProbeStep),
}

impl Step {
    /// Stable snake_case name of the step kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::TimeDerive(_) => "time_derive",
            Self::NodeEval(_) => "node_eval",
            Self::BusEval(_) => "bus_eval",
            Self::EventBusEval(_) => "event_bus_eval",
            Self::Materialize(_) => "materialize",
            Self::MaterializeColor(_) => "materialize_color",
            Self::MaterializePath(_) => "materialize_path",
            Self::MaterializeMesh(_) => "materialize_mesh",
            Self::MaterializeTestGeometry(_) => "materialize_test_geometry",
            Self::CameraEval(_) => "camera_eval",
            Self::MaterializeInstances3D(_) => "materialize_instances3d",
            Self::RenderAssemble(_) => "render_assemble",
            Self::DebugProbe(_) => "debug_probe",
        }
    }
}

/// Destination slots for resolved time signals. Absent slots are skipped.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimeDeriveStep {
    /// Absolute time (ms).
    pub t_abs: Option<SlotId>,
    /// Model time (ms).
    pub t_model: Option<SlotId>,
    /// Frame delta (ms).
    pub delta: Option<SlotId>,
    /// Cyclic phase.
    pub phase: Option<SlotId>,
    /// Finite progress.
    pub progress: Option<SlotId>,
    /// Wrap trigger.
    pub wrap_event: Option<SlotId>,
    /// Ping-pong bounce trigger.
    pub bounce_event: Option<SlotId>,
    /// Running wrap count.
    pub wrap_count: Option<SlotId>,
    /// Scrub flag.
    pub is_scrub: Option<SlotId>,
}

/// Operator evaluation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeEvalStep {
    /// Authoring node id, for diagnostics.
    pub node_id: String,
    /// Operator.
    pub op: NodeOp,
    /// Input slots, positional per operator.
    #[serde(default)]
    pub inputs: SmallVec<[SlotId; 4]>,
    /// Output slots, positional per operator.
    pub outputs: SmallVec<[SlotId; 2]>,
    /// State cells used by stateful operators.
    #[serde(default)]
    pub state: SmallVec<[StateCellIdx; 2]>,
}

/// Closed operator set.
///
/// Stateful operators (`integrate`, `smooth`, `delay`, `sample_hold`, `counter`, `spring`)
/// keep their memory in `f64` state cells so it survives frames and hot-swaps.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NodeOp {
    /// `out = constants[id]`.
    Const {
        /// Constant to emit.
        id: ConstId,
    },
    /// `a + b`.
    Add,
    /// `a - b`.
    Sub,
    /// `a * b`.
    Mul,
    /// `a / b`.
    Div,
    /// `min(a, b)`.
    Min,
    /// `max(a, b)`.
    Max,
    /// `sin(x)`.
    Sin,
    /// `cos(x)`.
    Cos,
    /// `|x|`.
    Abs,
    /// `clamp(x, lo, hi)`.
    Clamp,
    /// `a + (b - a) * t`.
    Lerp,
    /// Waveform sampled at phase `x`.
    Oscillator {
        /// Waveform shape.
        wave: Waveform,
    },
    /// Easing curve applied to `t`.
    Ease {
        /// Curve.
        ease: Ease,
    },
    /// Emit a field handle.
    FieldRef {
        /// Referenced expression.
        field: FieldExprId,
    },
    /// Pack `r, g, b, a` into a color.
    ColorRgba,
    /// Pack `x, y` into a vector.
    Vec2,
    /// Emit a fixed domain size.
    Domain {
        /// Element count.
        count: u32,
    },
    /// Emit a one-event list when the trigger input is set (value from optional second input).
    EmitOnTrigger,
    /// Running integral of the input over playback time.
    Integrate,
    /// Exponential smoothing towards the input.
    Smooth {
        /// Convergence rate in 1/s.
        rate: f64,
    },
    /// Previous frame's input.
    Delay,
    /// Latch the input while the trigger is set.
    SampleHold,
    /// Count triggers; optional second input resets.
    Counter,
    /// Damped spring following the input.
    Spring {
        /// Spring constant.
        stiffness: f64,
        /// Velocity damping.
        damping: f64,
    },
}

/// Numeric/vector/color bus evaluation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BusEvalStep {
    /// Bus configuration.
    pub bus: BusSpec,
    /// Publishers, pre-sorted by `(sort_key, id)`.
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    /// Destination slot.
    pub out: SlotId,
}

/// Event bus evaluation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EventBusEvalStep {
    /// Bus id.
    pub bus: BusId,
    /// Publishers, pre-sorted by `(sort_key, id)`.
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    /// Destination slot.
    pub out: SlotId,
}

/// Field materialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializeStep {
    /// Expression to evaluate.
    pub field: FieldExprId,
    /// Slot holding the element count.
    pub domain: SlotId,
    /// Output layout.
    pub format: BufferFormat,
    /// Destination slot.
    pub out: SlotId,
}

/// Color materialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializeColorStep {
    /// Slot holding the element count.
    pub domain: SlotId,
    /// Color signal, color field handle, or RGBA field buffer.
    pub source: SlotId,
    /// Destination slot.
    pub out: SlotId,
}

/// Path materialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializePathStep {
    /// Slot holding a path source.
    pub source: SlotId,
    /// Optional slot limiting how many paths are encoded.
    #[serde(default)]
    pub domain: Option<SlotId>,
    /// Destination slot.
    pub out: SlotId,
}

/// Mesh materialization.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializeMeshStep {
    /// Generation recipe; also the cache identity.
    pub recipe: MeshRecipe,
    /// Destination slot.
    pub out: SlotId,
}

/// Reference geometry materialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializeTestGeometryStep {
    /// Slot holding the element count.
    pub domain: SlotId,
    /// Layout shape.
    pub layout: TestLayout,
    /// Destination slot (Vec2 field buffer).
    pub out: SlotId,
}

/// Orbit camera evaluation.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct CameraEvalStep {
    /// Static camera parameters.
    pub camera: CameraSpec,
    /// Optional azimuth override in turns (e.g. a phase signal).
    #[serde(default)]
    pub azimuth: Option<SlotId>,
    /// Optional elevation override in turns.
    #[serde(default)]
    pub elevation: Option<SlotId>,
    /// Destination slot.
    pub out: SlotId,
}

/// 3D instance materialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterializeInstances3DStep {
    /// Slot holding the element count.
    pub domain: SlotId,
    /// Vec3 field buffer of instance positions.
    pub positions: SlotId,
    /// Optional uniform scale signal.
    #[serde(default)]
    pub scale: Option<SlotId>,
    /// Destination slot.
    pub out: SlotId,
}

/// Frame assembly.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderAssembleStep {
    /// Clear behavior.
    pub clear: ClearSpec,
    /// Passes in draw order.
    pub passes: Vec<PassSpec>,
    /// Destination slot.
    pub out: SlotId,
}

/// Shape drawn for each 2D instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceShape {
    /// Filled circle of diameter `size`.
    #[default]
    Circle,
    /// Axis-aligned square of side `size`.
    Square,
}

/// Slot wiring of one render pass.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassSpec {
    /// Instanced 2D shapes.
    #[serde(rename = "instances2d")]
    Instances2D {
        /// Element count.
        domain: SlotId,
        /// Vec2 field buffer.
        position: SlotId,
        /// Scalar signal or F32 field buffer.
        size: SlotId,
        /// Color signal or color buffer.
        color: SlotId,
        /// Optional scalar signal or F32 field buffer; defaults to 1.
        #[serde(default)]
        opacity: Option<SlotId>,
        /// Shape.
        #[serde(default)]
        shape: InstanceShape,
    },
    /// Encoded paths.
    #[serde(rename = "paths2d")]
    Paths2D {
        /// Path buffers.
        paths: SlotId,
        /// Optional fill color signal.
        #[serde(default)]
        fill: Option<SlotId>,
        /// Optional stroke color signal.
        #[serde(default)]
        stroke: Option<SlotId>,
        /// Stroke width signal (required with `stroke`).
        #[serde(default)]
        stroke_width: Option<SlotId>,
    },
    /// Instanced meshes.
    #[serde(rename = "instances3d")]
    Instances3D {
        /// Mesh buffers.
        mesh: SlotId,
        /// Instance transforms.
        instances: SlotId,
        /// Camera.
        camera: SlotId,
        /// Optional color signal; defaults to opaque white.
        #[serde(default)]
        color: Option<SlotId>,
    },
}

/// Probe point.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DebugProbeStep {
    /// Probe identifier reported to the sink.
    pub probe: ProbeId,
    /// Slots to report.
    pub slots: Vec<SlotId>,
}
