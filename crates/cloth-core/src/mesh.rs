//! Render-side data derived from the particle grid.
//!
//! Nothing here is authoritative: indices and normals are rebuilt from the
//! particle set whenever the cloth asks for them.
//!
//! Each grid cell is split into two triangles:
//!
//! ```text
//! (x,y)   *--* (x+1,y)
//!         | /|
//!         |/ |
//! (x,y+1) *--* (x+1,y+1)
//! ```

use glam::Vec3;

use crate::particle::ParticleSet;

/// GPU-compatible cloth vertex: 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ClothVertex {
    pub position: [f32; 3], // 12 bytes
    pub normal: [f32; 3],   // 12 bytes
    pub force: f32,         //  4 bytes
    pub _pad: f32,          //  4 bytes
}

/// Linear index of grid coordinate `(x, y)`.
#[inline]
pub fn grid_index(dim: u32, x: u32, y: u32) -> usize {
    (x * dim + y) as usize
}

/// The two triangles of cell `(x, y)`, as particle indices.
#[inline]
pub fn cell_triangles(dim: u32, x: u32, y: u32) -> [[u32; 3]; 2] {
    let idx = |x: u32, y: u32| x * dim + y;
    [
        [idx(x + 1, y), idx(x, y), idx(x, y + 1)],
        [idx(x + 1, y + 1), idx(x + 1, y), idx(x, y + 1)],
    ]
}

/// Triangle list over the grid, skipping triangles that touch a cut particle.
pub fn build_triangle_indices(dim: u32, renderable: &[bool]) -> Vec<u32> {
    let cells = dim.saturating_sub(1) as usize;
    let mut indices = Vec::with_capacity(cells * cells * 6);
    for x in 0..dim.saturating_sub(1) {
        for y in 0..dim.saturating_sub(1) {
            for tri in cell_triangles(dim, x, y) {
                if tri.iter().all(|&v| renderable[v as usize]) {
                    indices.extend_from_slice(&tri);
                }
            }
        }
    }
    indices
}

/// Unnormalized face normal; its length is twice the triangle area.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Rebuild smooth per-particle normals from a triangle list.
pub fn accumulate_normals(particles: &mut ParticleSet, indices: &[u32]) {
    particles.reset_normals();
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let n = triangle_normal(particles.position[a], particles.position[b], particles.position[c]);
        particles.accumulate_normal(a, n);
        particles.accumulate_normal(b, n);
        particles.accumulate_normal(c, n);
    }
}

/// Pack positions, normalized normals and display forces into vertices.
///
/// Particles with no adjacent triangle get a `+Z` normal.
pub fn export_vertices(particles: &ParticleSet, out: &mut Vec<ClothVertex>) {
    out.clear();
    out.extend((0..particles.count).map(|i| {
        let normal = particles.normal[i].try_normalize().unwrap_or(Vec3::Z);
        ClothVertex {
            position: particles.position[i].to_array(),
            normal: normal.to_array(),
            force: particles.display_force[i],
            _pad: 0.0,
        }
    }));
}
