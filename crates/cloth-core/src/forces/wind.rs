use glam::Vec3;
use rand::Rng;

use crate::mesh::triangle_normal;
use crate::particle::ParticleSet;

/// Wind force on one triangle.
///
/// Proportional to the triangle's area as seen from the wind direction:
/// `n * dot(normalize(n), direction)` with `n` the unnormalized face normal.
/// Degenerate (zero-area) triangles catch no wind.
pub fn triangle_wind_force(a: Vec3, b: Vec3, c: Vec3, direction: Vec3) -> Vec3 {
    let n = triangle_normal(a, b, c);
    match n.try_normalize() {
        Some(unit) => n * unit.dot(direction),
        None => Vec3::ZERO,
    }
}

/// Add wind to every particle of every triangle in `indices`.
pub fn apply_wind(particles: &mut ParticleSet, indices: &[u32], direction: Vec3) {
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let force = triangle_wind_force(
            particles.position[a],
            particles.position[b],
            particles.position[c],
            direction,
        );
        particles.add_force(a, force);
        particles.add_force(b, force);
        particles.add_force(c, force);
    }
}

/// A gust along `direction` with intensity drawn uniformly from `[min, max)`.
///
/// An empty or inverted range yields `direction * min`.
pub fn random_gust<R: Rng + ?Sized>(rng: &mut R, direction: Vec3, min: f32, max: f32) -> Vec3 {
    let intensity = if max > min { rng.gen_range(min..max) } else { min };
    direction * intensity
}
