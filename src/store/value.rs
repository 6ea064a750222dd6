use std::sync::Arc;

use crate::bus::events::BusEvent;
use crate::foundation::core::{FieldExprId, Rgba, Vec2};
use crate::ir::frame::RenderFrameIR;
use crate::ir::program::{PathIR, StorageClass};
use crate::materialize::buffers::{
    Camera, ColorChannels, FieldBuffer, Instances3D, MeshBuffers, PathBuffers,
};

/// A slot payload, tagged by storage class.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `f64` storage.
    F64(f64),
    /// `f32` storage.
    F32(f32),
    /// `i32` storage.
    I32(i32),
    /// `u32` storage.
    U32(u32),
    /// Object storage.
    Object(ObjectValue),
}

impl Value {
    /// Storage class this payload must be written to.
    pub fn storage_class(&self) -> StorageClass {
        match self {
            Self::F64(_) => StorageClass::F64,
            Self::F32(_) => StorageClass::F32,
            Self::I32(_) => StorageClass::I32,
            Self::U32(_) => StorageClass::U32,
            Self::Object(_) => StorageClass::Object,
        }
    }

    /// Numeric view; `None` for objects.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            Self::F32(v) => Some(f64::from(v)),
            Self::I32(v) => Some(f64::from(v)),
            Self::U32(v) => Some(f64::from(v)),
            Self::Object(_) => None,
        }
    }

    /// Convert a scalar into the representation of `storage`.
    ///
    /// Integer classes truncate toward zero and saturate; `u32` maps negatives to 0.
    /// Returns `None` for [`StorageClass::Object`].
    pub fn numeric_for(storage: StorageClass, v: f64) -> Option<Self> {
        Some(match storage {
            StorageClass::F64 => Self::F64(v),
            StorageClass::F32 => Self::F32(v as f32),
            StorageClass::I32 => Self::I32(v as i32),
            StorageClass::U32 => Self::U32(v as u32),
            StorageClass::Object => return None,
        })
    }
}

/// Heap-allocated slot payloads.
///
/// Large buffers are reference counted so the frame cache, the value store and the emitted
/// [`RenderFrameIR`] share one allocation.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectValue {
    /// 2D vector signal.
    Vec2(Vec2),
    /// Color signal.
    Color(Rgba),
    /// Lazy field expression handle.
    Field(FieldExprId),
    /// Materialized field buffer.
    FieldBuffer(Arc<FieldBuffer>),
    /// Parallel color channels.
    ColorBuffer(Arc<ColorChannels>),
    /// Path source.
    PathSource(Arc<[PathIR]>),
    /// Encoded path buffers.
    Paths(Arc<PathBuffers>),
    /// Mesh buffers.
    Mesh(Arc<MeshBuffers>),
    /// 3D instance transforms.
    Instances3D(Arc<Instances3D>),
    /// Camera matrices.
    Camera(Arc<Camera>),
    /// Event list.
    Events(Arc<[BusEvent]>),
    /// Assembled frame.
    Frame(Arc<RenderFrameIR>),
}

impl ObjectValue {
    /// Short kind name for diagnostics and probes.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Vec2(_) => "vec2",
            Self::Color(_) => "color",
            Self::Field(_) => "field",
            Self::FieldBuffer(_) => "field_buffer",
            Self::ColorBuffer(_) => "color_buffer",
            Self::PathSource(_) => "path_source",
            Self::Paths(_) => "paths",
            Self::Mesh(_) => "mesh",
            Self::Instances3D(_) => "instances3d",
            Self::Camera(_) => "camera",
            Self::Events(_) => "events",
            Self::Frame(_) => "frame",
        }
    }
}
