use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::collider::Collider;
use crate::pose::PoseTable;

/// SoA particle storage.
///
/// Particles are addressed by a stable index for their whole lifetime;
/// cutting the cloth only clears `renderable`, it never removes an entry.
#[derive(Clone, Debug)]
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec3>,
    /// Position at the previous tick (Verlet history).
    pub previous: Vec<Vec3>,
    /// Force accumulator, cleared by every integration step.
    pub force: Vec<Vec3>,
    pub mass: Vec<f32>,
    /// Pinned particles have `movable == false`.
    pub movable: Vec<bool>,
    /// Accumulated (non-normalized) vertex normal.
    pub normal: Vec<Vec3>,
    /// Cleared once the particle is detached by a cut.
    pub renderable: Vec<bool>,
    /// Magnitude of constraint corrections applied last tick (visualization only).
    pub display_force: Vec<f32>,
}

impl ParticleSet {
    /// Create `count` free particles of mass 1 at the origin.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            previous: vec![Vec3::ZERO; count],
            force: vec![Vec3::ZERO; count],
            mass: vec![1.0; count],
            movable: vec![true; count],
            normal: vec![Vec3::ZERO; count],
            renderable: vec![true; count],
            display_force: vec![0.0; count],
        }
    }

    /// Build a particle set at rest at the given positions.
    pub fn from_positions(positions: &[Vec3], mass: f32) -> Self {
        let mut set = Self::new(positions.len());
        set.position.copy_from_slice(positions);
        set.previous.copy_from_slice(positions);
        set.mass.fill(mass);
        set
    }

    #[inline]
    pub fn add_force(&mut self, i: usize, f: Vec3) {
        self.force[i] += f;
    }

    /// Add `f` to every particle's accumulator.
    pub fn add_force_all(&mut self, f: Vec3) {
        for force in self.force.iter_mut() {
            *force += f;
        }
    }

    /// Add `acceleration * mass` to every particle (e.g. gravity).
    pub fn add_acceleration_all(&mut self, acceleration: Vec3) {
        for (force, &mass) in self.force.iter_mut().zip(self.mass.iter()) {
            *force += acceleration * mass;
        }
    }

    /// Verlet step for one particle.
    ///
    /// A pinned particle discards its force instead of storing it, so nothing
    /// accumulates while it is held.
    pub fn integrate_one(&mut self, i: usize, dt: f32, damping: f32) {
        integrate_particle(
            &mut self.position[i],
            &mut self.previous[i],
            &mut self.force[i],
            self.mass[i],
            self.movable[i],
            dt * dt,
            damping,
        );
    }

    /// Verlet step for every particle.
    pub fn integrate(&mut self, dt: f32, damping: f32) {
        let dt_sq = dt * dt;

        #[cfg(feature = "parallel")]
        {
            self.position
                .par_iter_mut()
                .zip(self.previous.par_iter_mut())
                .zip(self.force.par_iter_mut())
                .zip(self.mass.par_iter())
                .zip(self.movable.par_iter())
                .for_each(|((((pos, prev), force), &mass), &movable)| {
                    integrate_particle(pos, prev, force, mass, movable, dt_sq, damping);
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for i in 0..self.count {
                integrate_particle(
                    &mut self.position[i],
                    &mut self.previous[i],
                    &mut self.force[i],
                    self.mass[i],
                    self.movable[i],
                    dt_sq,
                    damping,
                );
            }
        }
    }

    /// Move a particle directly, bypassing integration. No-op when pinned.
    #[inline]
    pub fn offset_position(&mut self, i: usize, v: Vec3) {
        if self.movable[i] {
            self.position[i] += v;
        }
    }

    /// Teleport a particle without injecting velocity.
    ///
    /// Works on pinned particles too; this is how scene logic drags an anchor.
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.position[i] = p;
        self.previous[i] = p;
    }

    pub fn pin(&mut self, i: usize) {
        self.movable[i] = false;
    }

    pub fn unpin(&mut self, i: usize) {
        self.movable[i] = true;
    }

    /// Implicit velocity over the last tick.
    #[inline]
    pub fn velocity(&self, i: usize, dt: f32) -> Vec3 {
        (self.position[i] - self.previous[i]) / dt
    }

    pub fn reset_normals(&mut self) {
        self.normal.fill(Vec3::ZERO);
    }

    /// Add a face normal contribution. Not renormalized; callers normalize
    /// once after all contributions are summed.
    #[inline]
    pub fn accumulate_normal(&mut self, i: usize, n: Vec3) {
        self.normal[i] += n;
    }

    /// Push particle `i` out of `collider` if it penetrates.
    ///
    /// Returns `true` if the particle was inside the collider.
    pub fn resolve_collision<C: Collider + ?Sized>(
        &mut self,
        i: usize,
        collider: &C,
        poses: &PoseTable,
        skin: f32,
    ) -> bool {
        match collider.resolve_offset(self.position[i], poses, skin) {
            Some(offset) => {
                self.offset_position(i, offset);
                true
            }
            None => false,
        }
    }
}

#[inline]
fn integrate_particle(
    pos: &mut Vec3,
    prev: &mut Vec3,
    force: &mut Vec3,
    mass: f32,
    movable: bool,
    dt_sq: f32,
    damping: f32,
) {
    if movable {
        let current = *pos;
        let accel = *force / mass;
        *pos = current + (current - *prev) * (1.0 - damping) + accel * dt_sq;
        *prev = current;
    }
    *force = Vec3::ZERO;
}
