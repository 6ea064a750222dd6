use std::f64::consts::TAU;

use crate::foundation::error::{ReelError, ReelResult};
use crate::materialize::buffers::{BufferFormat, Camera, FieldBuffer, Instances3D};

/// Reference layouts for laying a domain out without authoring a position field.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestLayout {
    /// Row-major grid.
    Grid {
        /// Columns; 0 picks `ceil(sqrt(n))`.
        #[serde(default)]
        columns: u32,
        /// Distance between neighbors.
        spacing: f64,
        /// Position of element 0.
        #[serde(default)]
        origin: [f64; 2],
    },
    /// Evenly spaced on a circle, starting at angle 0.
    Ring {
        /// Radius.
        radius: f64,
        /// Center.
        #[serde(default)]
        center: [f64; 2],
    },
    /// Evenly spaced from `start` to `end` inclusive.
    Line {
        /// First position.
        start: [f64; 2],
        /// Last position.
        end: [f64; 2],
    },
}

/// Positions of `count` elements under `layout`, as a `Vec2F32` buffer.
pub fn layout_positions(layout: &TestLayout, count: u32) -> FieldBuffer {
    let n = count as usize;
    let mut data = Vec::with_capacity(n * 2);
    match *layout {
        TestLayout::Grid {
            columns,
            spacing,
            origin,
        } => {
            let cols = if columns == 0 {
                ((n as f64).sqrt().ceil() as usize).max(1)
            } else {
                columns as usize
            };
            for i in 0..n {
                let (row, col) = (i / cols, i % cols);
                data.push((origin[0] + col as f64 * spacing) as f32);
                data.push((origin[1] + row as f64 * spacing) as f32);
            }
        }
        TestLayout::Ring { radius, center } => {
            for i in 0..n {
                let (s, c) = (TAU * i as f64 / n as f64).sin_cos();
                data.push((center[0] + radius * c) as f32);
                data.push((center[1] + radius * s) as f32);
            }
        }
        TestLayout::Line { start, end } => {
            let denom = n.saturating_sub(1).max(1) as f64;
            for i in 0..n {
                let t = i as f64 / denom;
                data.push((start[0] + (end[0] - start[0]) * t) as f32);
                data.push((start[1] + (end[1] - start[1]) * t) as f32);
            }
        }
    }
    FieldBuffer::new(BufferFormat::Vec2F32, count, data)
}

/// Orbit camera around a target, Y up.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraSpec {
    /// Point looked at.
    #[serde(default)]
    pub target: [f64; 3],
    /// Eye distance from the target.
    pub distance: f64,
    /// Rotation around Y in turns; 0 looks down -Z.
    #[serde(default)]
    pub azimuth: f64,
    /// Rotation above the XZ plane in turns.
    #[serde(default)]
    pub elevation: f64,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_y_deg: f64,
    /// Viewport width / height.
    #[serde(default = "default_aspect")]
    pub aspect: f64,
    /// Near plane.
    #[serde(default = "default_near")]
    pub near: f64,
    /// Far plane.
    #[serde(default = "default_far")]
    pub far: f64,
}

fn default_fov() -> f64 {
    50.0
}

fn default_aspect() -> f64 {
    16.0 / 9.0
}

fn default_near() -> f64 {
    0.1
}

fn default_far() -> f64 {
    1000.0
}

type Mat4 = [f64; 16];

fn mat_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for c in 0..4 {
        for r in 0..4 {
            out[c * 4 + r] = (0..4).map(|k| a[k * 4 + r] * b[c * 4 + k]).sum();
        }
    }
    out
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let l = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / l, v[1] / l, v[2] / l]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

impl CameraSpec {
    /// Evaluate with the given orientation (turns).
    pub fn evaluate(&self, azimuth: f64, elevation: f64) -> ReelResult<Camera> {
        let valid = self.distance.is_finite()
            && self.distance > 0.0
            && self.aspect.is_finite()
            && self.aspect > 0.0
            && self.near > 0.0
            && self.far > self.near
            && self.fov_y_deg > 0.0
            && self.fov_y_deg < 180.0;
        if !valid {
            return Err(ReelError::materialize(format!(
                "invalid camera parameters: {self:?}"
            )));
        }

        // Keep just shy of the poles so the Y-up basis stays defined.
        let el = (elevation * TAU).clamp(-1.5607, 1.5607);
        let az = azimuth * TAU;
        let t = self.target;
        let eye = [
            t[0] + self.distance * el.cos() * az.sin(),
            t[1] + self.distance * el.sin(),
            t[2] + self.distance * el.cos() * az.cos(),
        ];

        let f = normalize([t[0] - eye[0], t[1] - eye[1], t[2] - eye[2]]);
        let s = normalize(cross(f, [0.0, 1.0, 0.0]));
        let u = cross(s, f);
        #[rustfmt::skip]
        let view: Mat4 = [
            s[0], u[0], -f[0], 0.0,
            s[1], u[1], -f[1], 0.0,
            s[2], u[2], -f[2], 0.0,
            -dot(s, eye), -dot(u, eye), dot(f, eye), 1.0,
        ];

        let g = 1.0 / (self.fov_y_deg.to_radians() / 2.0).tan();
        let (n, fa) = (self.near, self.far);
        #[rustfmt::skip]
        let proj: Mat4 = [
            g / self.aspect, 0.0, 0.0, 0.0,
            0.0, g, 0.0, 0.0,
            0.0, 0.0, fa / (n - fa), -1.0,
            0.0, 0.0, n * fa / (n - fa), 0.0,
        ];

        Ok(Camera {
            view_proj: mat_mul(&proj, &view).map(|v| v as f32),
            eye: eye.map(|v| v as f32),
        })
    }
}

/// Uniform-scale translation matrices for each `Vec3F32` position.
pub fn instances_from_positions(positions: &FieldBuffer, scale: f64) -> ReelResult<Instances3D> {
    if positions.format != BufferFormat::Vec3F32 {
        return Err(ReelError::materialize(format!(
            "instance positions have format {:?}, expected vec3_f32",
            positions.format
        )));
    }
    let s = scale as f32;
    let mut transforms = Vec::with_capacity(positions.count as usize * 16);
    for p in positions.data.chunks_exact(3) {
        #[rustfmt::skip]
        let m = [
            s, 0.0, 0.0, 0.0,
            0.0, s, 0.0, 0.0,
            0.0, 0.0, s, 0.0,
            p[0], p[1], p[2], 1.0,
        ];
        transforms.extend_from_slice(&m);
    }
    Ok(Instances3D {
        count: positions.count,
        transforms,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/geometry.rs"]
mod tests;
