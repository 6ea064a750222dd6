use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{Fingerprint, StableHasher};
use crate::materialize::buffers::{Aabb, MeshBuffers, MeshIndices};

/// Default number of meshes kept by a [`MeshStore`].
pub const DEFAULT_MESH_CACHE_CAPACITY: usize = 64;

/// Upper bound on profile outline points; larger recipes are rejected before allocation.
pub const MAX_OUTLINE_POINTS: u32 = 1 << 20;

/// Content-addressed description of a generated mesh.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshRecipe {
    /// 2D outline in the XY plane.
    pub profile: Profile,
    /// Extrusion along Z.
    #[serde(default)]
    pub extrude: Extrude,
    /// Rounded edge between caps and sides.
    #[serde(default)]
    pub bevel: Option<Bevel>,
    /// Optional vertex attributes.
    #[serde(default)]
    pub attributes: MeshAttributes,
    /// Front-face orientation.
    #[serde(default)]
    pub winding: Winding,
    /// Index width.
    #[serde(default)]
    pub index_type: IndexType,
}

/// Built-in outline generators. Every outline is counter-clockwise and star-shaped about
/// the origin.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    /// Regular polygon with a vertex pointing up.
    RegularPolygon {
        /// Side count (>= 3).
        sides: u32,
        /// Circumradius.
        radius: f64,
    },
    /// Star alternating outer and inner vertices.
    Star {
        /// Point count (>= 2).
        points: u32,
        /// Tip radius.
        outer_radius: f64,
        /// Notch radius.
        inner_radius: f64,
    },
    /// Axis-aligned rectangle centered on the origin.
    Rect {
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Circle approximated by `segments` edges.
    Circle {
        /// Radius.
        radius: f64,
        /// Edge count (>= 3).
        #[serde(default = "default_circle_segments")]
        segments: u32,
    },
}

fn default_circle_segments() -> u32 {
    32
}

/// Extrusion settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Extrude {
    /// Depth along Z, centered on `z = 0`. Zero produces a single flat face.
    pub depth: f64,
    /// Close both ends.
    pub caps: bool,
}

impl Default for Extrude {
    fn default() -> Self {
        Self {
            depth: 0.0,
            caps: true,
        }
    }
}

/// Quarter-round bevel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bevel {
    /// Radius, clamped to half the depth.
    pub size: f64,
    /// Arc subdivisions (>= 1).
    pub segments: u32,
}

/// Optional vertex attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MeshAttributes {
    /// Emit per-vertex normals.
    pub normals: bool,
    /// Emit per-vertex UVs.
    pub uvs: bool,
}

/// Front-face winding seen from outside the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// Index buffer width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// 16-bit; caps the vertex count at 65,535.
    #[default]
    U16,
    /// 32-bit.
    U32,
}

impl MeshRecipe {
    /// Stable identity over every field that affects the generated buffers.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        match self.profile {
            Profile::RegularPolygon { sides, radius } => {
                h.write_u8(0);
                h.write_u32(sides);
                h.write_f64(radius);
            }
            Profile::Star {
                points,
                outer_radius,
                inner_radius,
            } => {
                h.write_u8(1);
                h.write_u32(points);
                h.write_f64(outer_radius);
                h.write_f64(inner_radius);
            }
            Profile::Rect { width, height } => {
                h.write_u8(2);
                h.write_f64(width);
                h.write_f64(height);
            }
            Profile::Circle { radius, segments } => {
                h.write_u8(3);
                h.write_f64(radius);
                h.write_u32(segments);
            }
        }
        h.write_f64(self.extrude.depth);
        h.write_bool(self.extrude.caps);
        match self.bevel {
            None => h.write_u8(0),
            Some(b) => {
                h.write_u8(1);
                h.write_f64(b.size);
                h.write_u32(b.segments);
            }
        }
        h.write_bool(self.attributes.normals);
        h.write_bool(self.attributes.uvs);
        h.write_u8(match self.winding {
            Winding::Ccw => 0,
            Winding::Cw => 1,
        });
        h.write_u8(match self.index_type {
            IndexType::U16 => 0,
            IndexType::U32 => 1,
        });
        h.finish()
    }
}

/// Generate the outline of `profile`.
pub fn profile_outline(profile: &Profile) -> ReelResult<Vec<[f64; 2]>> {
    let positive = |name: &str, v: f64| {
        if v.is_finite() && v > 0.0 {
            Ok(v)
        } else {
            Err(ReelError::materialize(format!(
                "profile {name} must be finite and > 0, got {v}"
            )))
        }
    };
    let ring = |n: u32, r: &dyn Fn(u32) -> f64| -> ReelResult<Vec<[f64; 2]>> {
        if n > MAX_OUTLINE_POINTS {
            return Err(ReelError::materialize(format!(
                "profile outline has {n} points, at most {MAX_OUTLINE_POINTS} allowed"
            )));
        }
        Ok((0..n)
            .map(|k| {
                let a = FRAC_PI_2 + TAU * f64::from(k) / f64::from(n);
                [r(k) * a.cos(), r(k) * a.sin()]
            })
            .collect())
    };

    Ok(match *profile {
        Profile::RegularPolygon { sides, radius } => {
            if sides < 3 {
                return Err(ReelError::materialize("regular polygon needs at least 3 sides"));
            }
            let r = positive("radius", radius)?;
            ring(sides, &|_| r)?
        }
        Profile::Star {
            points,
            outer_radius,
            inner_radius,
        } => {
            if points < 2 {
                return Err(ReelError::materialize("star needs at least 2 points"));
            }
            let (o, i) = (
                positive("outer_radius", outer_radius)?,
                positive("inner_radius", inner_radius)?,
            );
            let n = points.checked_mul(2).ok_or_else(|| {
                ReelError::materialize(format!("star with {points} points overflows"))
            })?;
            ring(n, &|k| if k % 2 == 0 { o } else { i })?
        }
        Profile::Rect { width, height } => {
            let (hw, hh) = (positive("width", width)? / 2.0, positive("height", height)? / 2.0);
            vec![[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]]
        }
        Profile::Circle { radius, segments } => {
            if segments < 3 {
                return Err(ReelError::materialize("circle needs at least 3 segments"));
            }
            let r = positive("radius", radius)?;
            ring(segments, &|_| r)?
        }
    })
}

/// Offset each outline point toward the origin by `inset`.
fn inset_outline(outline: &[[f64; 2]], inset: f64) -> Vec<[f64; 2]> {
    if inset <= 0.0 {
        return outline.to_vec();
    }
    outline
        .iter()
        .map(|&[x, y]| {
            let len = x.hypot(y);
            let s = if len > 0.0 { ((len - inset) / len).max(0.0) } else { 0.0 };
            [x * s, y * s]
        })
        .collect()
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<[f64; 3]>,
    uvs: Vec<[f64; 2]>,
    tris: Vec<[u32; 3]>,
}

impl MeshBuilder {
    fn vertex(&mut self, p: [f64; 3], uv: [f64; 2]) -> u32 {
        self.positions.push(p);
        self.uvs.push(uv);
        (self.positions.len() - 1) as u32
    }

    /// Fan-triangulated cap at `z`, facing +Z when `up`.
    fn cap(&mut self, outline: &[[f64; 2]], z: f64, up: bool, extent: f64) {
        let planar = |x: f64, y: f64| [0.5 + x / (2.0 * extent), 0.5 + y / (2.0 * extent)];
        let center = self.vertex([0.0, 0.0, z], [0.5, 0.5]);
        let first = self.positions.len() as u32;
        for &[x, y] in outline {
            self.vertex([x, y, z], planar(x, y));
        }
        let n = outline.len() as u32;
        for k in 0..n {
            let (a, b) = (first + k, first + (k + 1) % n);
            self.tris.push(if up { [center, a, b] } else { [center, b, a] });
        }
    }

    /// Side walls through consecutive `(z, outline)` stations.
    fn sides(&mut self, stations: &[(f64, Vec<[f64; 2]>)]) -> Vec<(u32, usize)> {
        let mut rings = Vec::with_capacity(stations.len());
        let last = stations.len().saturating_sub(1).max(1) as f64;
        for (s, (z, outline)) in stations.iter().enumerate() {
            let n = outline.len();
            let first = self.positions.len() as u32;
            // One extra seam vertex so UVs wrap cleanly.
            for k in 0..=n {
                let [x, y] = outline[k % n];
                self.vertex([x, y, *z], [k as f64 / n as f64, s as f64 / last]);
            }
            rings.push((first, n));
        }
        for w in rings.windows(2) {
            let ((lo, n), (hi, _)) = (w[0], w[1]);
            for k in 0..n as u32 {
                let (a0, a1, b0, b1) = (lo + k, lo + k + 1, hi + k, hi + k + 1);
                self.tris.push([a0, a1, b1]);
                self.tris.push([a0, b1, b0]);
            }
        }
        rings
    }

    /// Area-weighted vertex normals; seam vertices of side rings are merged.
    fn normals(&self, rings: &[(u32, usize)]) -> Vec<[f64; 3]> {
        let mut acc = vec![[0.0f64; 3]; self.positions.len()];
        for t in &self.tris {
            let [a, b, c] = t.map(|i| self.positions[i as usize]);
            let (u, v) = (sub3(b, a), sub3(c, a));
            let n = cross3(u, v);
            for &i in t {
                let e = &mut acc[i as usize];
                for k in 0..3 {
                    e[k] += n[k];
                }
            }
        }
        for &(first, n) in rings {
            let (a, b) = (first as usize, first as usize + n);
            let merged = add3(acc[a], acc[b]);
            acc[a] = merged;
            acc[b] = merged;
        }
        acc.into_iter().map(normalize3).collect()
    }
}

fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize3(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Vertices [`generate_mesh`] will emit: one ring (plus seam) per station and a centred
/// fan per cap. No stations means a single flat cap.
fn planned_vertex_count(outline: usize, stations: u64, caps: bool) -> u64 {
    let ring = outline as u64 + 1;
    if stations == 0 {
        return ring;
    }
    let caps = if caps { 2 * ring } else { 0 };
    stations * ring + caps
}

/// Whether the front and back bevels share their innermost station.
fn bevel_meets(size: f64, half: f64) -> bool {
    2.0 * (half - size) < 1e-12
}

/// Run the profile → extrude → bounds pipeline for `recipe`.
pub fn generate_mesh(recipe: &MeshRecipe) -> ReelResult<MeshBuffers> {
    let outline = profile_outline(&recipe.profile)?;
    let extent = outline
        .iter()
        .map(|&[x, y]| x.abs().max(y.abs()))
        .fold(0.0, f64::max);
    let depth = recipe.extrude.depth;
    if !depth.is_finite() || depth < 0.0 {
        return Err(ReelError::materialize(format!(
            "extrude depth must be finite and >= 0, got {depth}"
        )));
    }

    let half = depth / 2.0;
    let bevel = match recipe.bevel {
        Some(bevel) if depth > 0.0 && bevel.size > 0.0 => {
            if bevel.segments == 0 {
                return Err(ReelError::materialize("bevel needs at least 1 segment"));
            }
            Some((bevel.size.min(half), bevel.segments))
        }
        _ => None,
    };
    let station_count = match bevel {
        _ if depth == 0.0 => 0,
        None => 2,
        // A full-depth bevel meets itself in the middle.
        Some((size, k)) => 2 * (u64::from(k) + 1) - u64::from(bevel_meets(size, half)),
    };

    let vertex_count = planned_vertex_count(outline.len(), station_count, recipe.extrude.caps);
    let limit = match recipe.index_type {
        IndexType::U16 => u64::from(u16::MAX),
        IndexType::U32 => u64::from(u32::MAX),
    };
    if vertex_count > limit {
        return Err(ReelError::materialize(format!(
            "mesh needs {vertex_count} vertices, {:?} indices allow at most {limit}",
            recipe.index_type
        )));
    }

    let stations = match bevel {
        _ if depth == 0.0 => Vec::new(),
        None => vec![(-half, outline.clone()), (half, outline.clone())],
        Some((size, k)) => {
            let mut st = Vec::with_capacity(station_count as usize);
            for j in 0..=k {
                let th = FRAC_PI_2 * f64::from(j) / f64::from(k);
                let z = -half + size * (1.0 - th.cos());
                st.push((z, inset_outline(&outline, size * (1.0 - th.sin()))));
            }
            let skip = usize::from(bevel_meets(size, half));
            for j in (0..=k).rev().skip(skip) {
                let th = FRAC_PI_2 * f64::from(j) / f64::from(k);
                let z = half - size * (1.0 - th.cos());
                st.push((z, inset_outline(&outline, size * (1.0 - th.sin()))));
            }
            st
        }
    };

    let mut b = MeshBuilder::default();
    let mut rings = Vec::new();
    if stations.is_empty() {
        b.cap(&outline, 0.0, true, extent);
    } else {
        rings = b.sides(&stations);
        if recipe.extrude.caps {
            let (front, back) = (&stations[0], &stations[stations.len() - 1]);
            b.cap(&front.1, front.0, false, extent);
            b.cap(&back.1, back.0, true, extent);
        }
    }
    let vertex_count = b.positions.len();

    let normals = recipe.attributes.normals.then(|| {
        b.normals(&rings)
            .into_iter()
            .flat_map(|n| n.map(|c| c as f32))
            .collect()
    });
    let uvs = recipe
        .attributes
        .uvs
        .then(|| b.uvs.iter().flat_map(|uv| uv.map(|c| c as f32)).collect());
    let positions: Vec<f32> = b
        .positions
        .iter()
        .flat_map(|p| p.map(|c| c as f32))
        .collect();

    let flat = b.tris.iter().flat_map(|t| match recipe.winding {
        Winding::Ccw => *t,
        Winding::Cw => [t[0], t[2], t[1]],
    });
    let indices = match recipe.index_type {
        IndexType::U16 => MeshIndices::U16(flat.map(|i| i as u16).collect()),
        IndexType::U32 => MeshIndices::U32(flat.collect()),
    };

    Ok(MeshBuffers {
        vertex_count: vertex_count as u32,
        bounds: Aabb::from_positions(&positions),
        positions,
        normals,
        uvs,
        indices,
    })
}

/// Bounded, least-recently-used store of generated meshes keyed by recipe fingerprint.
///
/// Lives on the runtime and survives frames and hot-swaps: identical recipes always produce
/// identical buffers.
#[derive(Debug)]
pub struct MeshStore {
    capacity: usize,
    entries: HashMap<Fingerprint, (Arc<MeshBuffers>, u64)>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl MeshStore {
    /// Store holding at most `capacity` meshes (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached mesh for `recipe`, generating it on a miss.
    pub fn get_or_build(&mut self, recipe: &MeshRecipe) -> ReelResult<Arc<MeshBuffers>> {
        self.tick += 1;
        let key = recipe.fingerprint();
        if let Some((mesh, used)) = self.entries.get_mut(&key) {
            *used = self.tick;
            self.hits += 1;
            return Ok(mesh.clone());
        }

        self.misses += 1;
        let mesh = Arc::new(generate_mesh(recipe)?);
        tracing::debug!(
            vertices = mesh.vertex_count,
            indices = mesh.indices.len(),
            "mesh cache miss"
        );
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(k, _)| *k)
        {
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, (mesh.clone(), self.tick));
        Ok(mesh)
    }

    /// Cached mesh count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifetime hits.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lifetime misses.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for MeshStore {
    fn default() -> Self {
        Self::new(DEFAULT_MESH_CACHE_CAPACITY)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/mesh.rs"]
mod tests;
