use crate::foundation::core::Rect;

/// Element layout of a materialized field buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferFormat {
    /// One `f32` per element.
    F32,
    /// Interleaved `x, y`.
    Vec2F32,
    /// Interleaved `x, y, z`.
    Vec3F32,
    /// Interleaved `r, g, b, a`.
    RgbaF32,
}

impl BufferFormat {
    /// `f32` components per element.
    pub fn components(self) -> usize {
        match self {
            Self::F32 => 1,
            Self::Vec2F32 => 2,
            Self::Vec3F32 => 3,
            Self::RgbaF32 => 4,
        }
    }
}

/// Dense per-element buffer produced by field materialization.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FieldBuffer {
    /// Layout.
    pub format: BufferFormat,
    /// Element count.
    pub count: u32,
    /// `count * format.components()` interleaved values.
    pub data: Vec<f32>,
    /// NaN/Inf components found in `data`.
    pub non_finite: u32,
}

impl FieldBuffer {
    /// Wrap `data`, counting non-finite components.
    pub fn new(format: BufferFormat, count: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), count as usize * format.components());
        let non_finite = data.iter().filter(|v| !v.is_finite()).count() as u32;
        Self {
            format,
            count,
            data,
            non_finite,
        }
    }

    /// `count` copies of one scalar.
    pub fn splat(count: u32, v: f32) -> Self {
        Self::new(BufferFormat::F32, count, vec![v; count as usize])
    }

    /// Components of element `i`.
    pub fn element(&self, i: usize) -> &[f32] {
        let c = self.format.components();
        &self.data[i * c..(i + 1) * c]
    }
}

/// Per-element color as four parallel channels.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ColorChannels {
    /// Element count.
    pub count: u32,
    /// Red channel.
    pub r: Vec<f32>,
    /// Green channel.
    pub g: Vec<f32>,
    /// Blue channel.
    pub b: Vec<f32>,
    /// Alpha channel.
    pub a: Vec<f32>,
}

/// Opcode of an encoded path command.
pub mod path_op {
    /// Start a subpath (1 point).
    pub const MOVE_TO: u16 = 0;
    /// Line (1 point).
    pub const LINE_TO: u16 = 1;
    /// Quadratic (2 points).
    pub const QUAD_TO: u16 = 2;
    /// Cubic (3 points).
    pub const CUBIC_TO: u16 = 3;
    /// Close (no points).
    pub const CLOSE: u16 = 4;

    /// Points consumed by `op`.
    pub fn arity(op: u16) -> usize {
        match op {
            MOVE_TO | LINE_TO => 1,
            QUAD_TO => 2,
            CUBIC_TO => 3,
            _ => 0,
        }
    }
}

/// Flat encoding of a list of paths.
///
/// Path `i` owns `commands[cmd_start[i]..][..cmd_len[i]]` and, counted in points (pairs of
/// `f32`), `points[2 * point_start[i]..][..2 * point_len[i]]`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PathBuffers {
    /// Opcode stream (see [`path_op`]).
    pub commands: Vec<u16>,
    /// Interleaved `x, y` points.
    pub points: Vec<f32>,
    /// First command of each path.
    pub cmd_start: Vec<u32>,
    /// Command count of each path.
    pub cmd_len: Vec<u32>,
    /// First point of each path.
    pub point_start: Vec<u32>,
    /// Point count of each path.
    pub point_len: Vec<u32>,
    /// Bounds of every control point.
    pub bounds: Rect,
}

impl PathBuffers {
    /// Number of encoded paths.
    pub fn path_count(&self) -> usize {
        self.cmd_start.len()
    }
}

/// Axis-aligned 3D bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Tight bounds of interleaved `x, y, z` positions; default for an empty slice.
    pub fn from_positions(p: &[f32]) -> Self {
        let mut it = p.chunks_exact(3);
        let Some(first) = it.next() else {
            return Self::default();
        };
        let mut b = Self {
            min: [first[0], first[1], first[2]],
            max: [first[0], first[1], first[2]],
        };
        for v in it {
            for k in 0..3 {
                b.min[k] = b.min[k].min(v[k]);
                b.max[k] = b.max[k].max(v[k]);
            }
        }
        b
    }
}

/// Mesh index buffer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MeshIndices {
    /// 16-bit indices (at most 65,535 vertices).
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl MeshIndices {
    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// `true` when there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `i` widened to `u32`.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(v) => v.get(i).map(|&x| u32::from(x)),
            Self::U32(v) => v.get(i).copied(),
        }
    }
}

/// Generated triangle mesh.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MeshBuffers {
    /// Vertex count.
    pub vertex_count: u32,
    /// Interleaved `x, y, z` positions.
    pub positions: Vec<f32>,
    /// Interleaved normals, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    /// Interleaved `u, v`, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<f32>>,
    /// Triangle list.
    pub indices: MeshIndices,
    /// Bounds of `positions`.
    pub bounds: Aabb,
}

/// Per-instance transforms for instanced meshes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Instances3D {
    /// Instance count.
    pub count: u32,
    /// `count` column-major 4x4 matrices.
    pub transforms: Vec<f32>,
}

/// Evaluated camera.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Camera {
    /// Column-major view-projection matrix.
    pub view_proj: [f32; 16],
    /// Eye position in world space.
    pub eye: [f32; 3],
}
