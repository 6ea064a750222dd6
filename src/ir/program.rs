use std::sync::Arc;

use crate::field::expr::FieldExprIR;
use crate::foundation::core::{
    BezPath, ConstId, FieldExprId, PathEl, Rgba, SlotId, StateKey, Vec2,
};
use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::step::Step;
use crate::store::value::{ObjectValue, Value};
use crate::time::resolver::TimeModel;

/// Immutable artifact produced by the graph compiler.
///
/// The runtime trusts it as type-checked: slot storage classes, step wiring and publisher
/// ordering are not re-verified. Editing always produces a new program; the running one is
/// replaced via [`swap_program`](crate::swap_program).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompiledProgramIR {
    /// Ordered step list.
    pub schedule: Schedule,
    /// Time-domain model for the whole program.
    pub time_model: TimeModel,
    /// Persistent state cells required by stateful operators.
    #[serde(default)]
    pub state_layout: StateLayout,
    /// Storage class and semantic type for every slot, indexed by [`SlotId`].
    pub slot_meta: Vec<SlotMeta>,
    /// Constant pool, indexed by [`ConstId`].
    #[serde(default)]
    pub constants: Vec<ConstValue>,
    /// Field expression table, indexed by [`FieldExprId`].
    #[serde(default)]
    pub fields: Vec<FieldExprIR>,
    /// Output slots; the first render-frame output is the frame result.
    pub outputs: Vec<OutputSpec>,
}

impl CompiledProgramIR {
    /// Parse a program from its JSON interchange form.
    pub fn from_json(s: &str) -> ReelResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Look up a constant; an out-of-range id is a contract violation.
    pub fn constant(&self, id: ConstId) -> ReelResult<&ConstValue> {
        lookup_constant(&self.constants, id)
    }

    /// Look up a field expression; an out-of-range id is a contract violation.
    pub fn field(&self, id: FieldExprId) -> ReelResult<&FieldExprIR> {
        self.fields
            .get(id.0 as usize)
            .ok_or_else(|| ReelError::contract(format!("unknown field expression {}", id.0)))
    }

    /// Look up slot metadata; a slot without metadata is a contract violation.
    pub fn slot_meta(&self, slot: SlotId) -> ReelResult<&SlotMeta> {
        self.slot_meta
            .get(slot.index())
            .ok_or_else(|| ReelError::contract(format!("slot {} has no slot meta", slot.0)))
    }

    /// Slot holding the frame's [`RenderFrameIR`](crate::RenderFrameIR).
    pub fn render_output(&self) -> ReelResult<SlotId> {
        self.outputs
            .iter()
            .find(|o| o.kind == OutputKind::RenderFrame)
            .map(|o| o.slot)
            .ok_or_else(|| ReelError::contract("program declares no render_frame output"))
    }
}

pub(crate) fn lookup_constant(constants: &[ConstValue], id: ConstId) -> ReelResult<&ConstValue> {
    constants
        .get(id.0 as usize)
        .ok_or_else(|| ReelError::contract(format!("invalid constant id {}", id.0)))
}

/// Ordered list of steps for one frame.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Schedule {
    /// Steps in execution order. Never reordered at runtime.
    pub steps: Vec<Step>,
}

/// Backing storage class of a slot or state cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    /// 64-bit float.
    F64,
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer (also booleans and domain counts).
    U32,
    /// Heap value ([`ObjectValue`]).
    Object,
}

/// Semantic type assigned to a slot by the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Scalar signal.
    Number,
    /// Integer signal.
    Int,
    /// Boolean/trigger signal (0 or 1).
    Bool,
    /// Phase in `[0, 1]`.
    Phase,
    /// Element count of a field domain.
    Domain,
    /// 2D vector signal.
    Vec2,
    /// Color signal.
    Color,
    /// Lazy field expression handle.
    Field,
    /// Materialized field buffer.
    FieldBuffer,
    /// Materialized parallel color channels.
    ColorBuffer,
    /// Path command source.
    PathSource,
    /// Encoded path buffers.
    PathBuffer,
    /// Mesh buffers.
    Mesh,
    /// 3D instance transforms.
    #[serde(rename = "instances3d")]
    Instances3D,
    /// Camera matrices.
    Camera,
    /// Event list.
    Events,
    /// Assembled render frame.
    RenderFrame,
}

impl TypeTag {
    /// Whether `value` is an acceptable payload for a slot of this type.
    ///
    /// Numeric tags accept any numeric storage; object tags require the matching object kind.
    pub fn accepts(self, value: &Value) -> bool {
        let Value::Object(obj) = value else {
            return matches!(
                self,
                Self::Number | Self::Int | Self::Bool | Self::Phase | Self::Domain
            );
        };
        matches!(
            (self, obj),
            (Self::Vec2, ObjectValue::Vec2(_))
                | (Self::Color, ObjectValue::Color(_))
                | (Self::Field, ObjectValue::Field(_))
                | (Self::FieldBuffer, ObjectValue::FieldBuffer(_))
                | (Self::ColorBuffer, ObjectValue::ColorBuffer(_))
                | (Self::PathSource, ObjectValue::PathSource(_))
                | (Self::PathBuffer, ObjectValue::Paths(_))
                | (Self::Mesh, ObjectValue::Mesh(_))
                | (Self::Instances3D, ObjectValue::Instances3D(_))
                | (Self::Camera, ObjectValue::Camera(_))
                | (Self::Events, ObjectValue::Events(_))
                | (Self::RenderFrame, ObjectValue::Frame(_))
        )
    }
}

/// Per-slot metadata.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotMeta {
    /// Backing storage class.
    pub storage: StorageClass,
    /// Semantic type.
    #[serde(rename = "type")]
    pub ty: TypeTag,
    /// Optional human-readable name for probes and error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_name: Option<String>,
}

impl SlotMeta {
    /// Metadata without a debug name.
    pub fn new(storage: StorageClass, ty: TypeTag) -> Self {
        Self {
            storage,
            ty,
            debug_name: None,
        }
    }
}

/// One entry of the constant pool.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstValue {
    /// Scalar.
    Number(f64),
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// 2D vector `[x, y]`.
    Vec2([f64; 2]),
    /// Color `[r, g, b, a]`.
    Color([f32; 4]),
    /// Path list consumed by path materialization.
    Paths(Arc<[PathIR]>),
}

impl ConstValue {
    /// Numeric view of scalar constants.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Number(v) => Some(v),
            Self::Int(v) => Some(v as f64),
            Self::Bool(v) => Some(if v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Object payload for non-scalar constants.
    pub fn to_object(&self) -> Option<ObjectValue> {
        match self {
            Self::Vec2([x, y]) => Some(ObjectValue::Vec2(Vec2::new(*x, *y))),
            Self::Color(c) => Some(ObjectValue::Color(Rgba::from_array(*c))),
            Self::Paths(p) => Some(ObjectValue::PathSource(p.clone())),
            Self::Number(_) | Self::Int(_) | Self::Bool(_) => None,
        }
    }
}

/// A single path as an ordered command list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathIR {
    /// Commands in drawing order.
    pub commands: Vec<PathCommand>,
}

impl PathIR {
    /// Build a path from kurbo elements.
    pub fn from_bez_path(path: &BezPath) -> Self {
        let commands = path
            .elements()
            .iter()
            .map(|el| match *el {
                PathEl::MoveTo(p) => PathCommand::MoveTo { x: p.x, y: p.y },
                PathEl::LineTo(p) => PathCommand::LineTo { x: p.x, y: p.y },
                PathEl::QuadTo(c, p) => PathCommand::QuadTo {
                    x1: c.x,
                    y1: c.y,
                    x: p.x,
                    y: p.y,
                },
                PathEl::CurveTo(c1, c2, p) => PathCommand::CubicTo {
                    x1: c1.x,
                    y1: c1.y,
                    x2: c2.x,
                    y2: c2.y,
                    x: p.x,
                    y: p.y,
                },
                PathEl::ClosePath => PathCommand::Close,
            })
            .collect();
        Self { commands }
    }

    /// Convert to a kurbo path, e.g. for hit testing or a vector backend.
    pub fn to_bez_path(&self) -> BezPath {
        let mut out = BezPath::new();
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { x, y } => out.move_to((x, y)),
                PathCommand::LineTo { x, y } => out.line_to((x, y)),
                PathCommand::QuadTo { x1, y1, x, y } => out.quad_to((x1, y1), (x, y)),
                PathCommand::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => out.curve_to((x1, y1), (x2, y2), (x, y)),
                PathCommand::Close => out.close_path(),
            }
        }
        out
    }
}

/// Path drawing command.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PathCommand {
    /// Start a subpath.
    MoveTo {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Straight segment.
    LineTo {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Quadratic Bézier segment.
    QuadTo {
        /// Control x.
        x1: f64,
        /// Control y.
        y1: f64,
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Cubic Bézier segment.
    CubicTo {
        /// First control x.
        x1: f64,
        /// First control y.
        y1: f64,
        /// Second control x.
        x2: f64,
        /// Second control y.
        y2: f64,
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Close the current subpath.
    Close,
}

/// Persistent cell layout of a program.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateLayout {
    /// Cells indexed by [`StateCellIdx`](crate::StateCellIdx).
    pub cells: Vec<StateCellSpec>,
}

/// Declaration of one persistent state cell.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateCellSpec {
    /// Identity used to carry the cell across hot-swaps.
    #[serde(flatten)]
    pub key: StateKey,
    /// Numeric storage class (object storage is not allowed).
    pub storage: StorageClass,
    /// Number of lanes in the cell.
    #[serde(default = "default_cell_len")]
    pub len: u32,
    /// Initial value; zero when absent.
    #[serde(default)]
    pub init: Option<ConstId>,
}

fn default_cell_len() -> u32 {
    1
}

/// Kind of a declared program output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// The frame's render description.
    RenderFrame,
}

/// A declared program output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputSpec {
    /// Slot holding the output.
    pub slot: SlotId,
    /// What the slot holds.
    pub kind: OutputKind,
}

#[cfg(test)]
#[path = "../../tests/unit/ir/program.rs"]
mod tests;
