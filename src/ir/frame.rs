use std::sync::Arc;

use crate::ir::step::InstanceShape;
use crate::materialize::buffers::{ColorChannels, FieldBuffer, Instances3D, MeshBuffers, PathBuffers};

/// Current [`RenderFrameIR`] schema version.
pub const RENDER_FRAME_VERSION: u32 = 1;

/// Terminal output of one frame, consumed by an external rendering backend.
///
/// Buffers are shared (`Arc`) with the value store they were materialized into, so producing a
/// frame never copies element data.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderFrameIR {
    /// Schema version, always [`RENDER_FRAME_VERSION`].
    pub version: u32,
    /// How the target is cleared before drawing.
    pub clear: ClearSpec,
    /// Passes in draw order.
    pub passes: Vec<RenderPassIR>,
}

/// Clear behavior at the start of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClearSpec {
    /// Clear mode.
    pub mode: ClearMode,
    /// Clear color, required for [`ClearMode::Color`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_rgba: Option<[f32; 4]>,
}

/// Clear mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearMode {
    /// Keep previous contents.
    #[default]
    None,
    /// Fill with `color_rgba`.
    Color,
}

/// One render pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderPassIR {
    /// Instanced 2D shapes.
    #[serde(rename = "instances2d")]
    Instances2D(Instances2DPass),
    /// Encoded 2D paths.
    #[serde(rename = "paths2d")]
    Paths2D(Paths2DPass),
    /// Instanced 3D meshes.
    #[serde(rename = "instances3d")]
    Instances3D(Instances3DPass),
}

/// Instanced 2D shapes as parallel per-instance buffers sharing one domain count.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Instances2DPass {
    /// Domain count shared by every buffer.
    pub count: u32,
    /// Shape drawn per instance.
    pub shape: InstanceShape,
    /// Interleaved `x, y` positions (`Vec2F32`).
    pub position: Arc<FieldBuffer>,
    /// Per-instance size (`F32`).
    pub size: Arc<FieldBuffer>,
    /// Per-instance color channels.
    pub color: Arc<ColorChannels>,
    /// Per-instance opacity (`F32`).
    pub opacity: Arc<FieldBuffer>,
}

/// Encoded paths plus style.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Paths2DPass {
    /// Command/point/index buffers.
    pub paths: Arc<PathBuffers>,
    /// Fill and stroke.
    pub style: PathStyle,
}

/// Path paint style.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct PathStyle {
    /// Fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_rgba: Option<[f32; 4]>,
    /// Stroke color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_rgba: Option<[f32; 4]>,
    /// Stroke width in pixels.
    pub stroke_width: f32,
}

/// Instanced mesh pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Instances3DPass {
    /// Mesh geometry.
    pub mesh: Arc<MeshBuffers>,
    /// Per-instance transforms.
    pub instances: Arc<Instances3D>,
    /// Column-major view-projection matrix.
    pub view_proj: [f32; 16],
    /// Uniform color.
    pub color_rgba: [f32; 4],
}
