use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MIN_SEPARATION;
use crate::cut::CutQueue;
use crate::particle::ParticleSet;

/// How a constraint correction is applied to its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveMode {
    /// Offset both endpoints by half the correction, immediately.
    #[default]
    Positional,
    /// Apply the correction as an opposing force pair, consumed by the next
    /// integration step.
    Force,
    /// Force pair plus a damping term on the relative velocity along the
    /// constraint direction.
    ForceWithFriction,
}

/// Per-sweep solver parameters.
#[derive(Clone, Copy, Debug)]
pub struct SolveParams {
    pub mode: SolveMode,
    /// Stiffness `K`.
    pub stiffness: f32,
    /// Velocity damping `U` (only used by [`SolveMode::ForceWithFriction`]).
    pub friction: f32,
    /// Tick duration, used to recover velocities from Verlet history.
    pub dt: f32,
}

/// Correction computed for one constraint evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    /// `K * (distance - rest_length) * direction`.
    pub vector: Vec3,
    /// Unit vector from particle `i` to particle `j`.
    pub direction: Vec3,
    /// Current separation.
    pub distance: f32,
}

/// Distance constraint between two particles of a [`ParticleSet`].
///
/// Holds indices only; the particles are owned by the set. The rest length
/// is fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint {
    /// Particle index A.
    pub i: u32,
    /// Particle index B.
    pub j: u32,
    rest_length: f32,
    /// Whether overstretching flags the endpoints for cutting.
    pub cuttable: bool,
    /// Stretch ratio at which a cuttable constraint breaks.
    pub cut_multiplier: f32,
}

impl DistanceConstraint {
    /// Create a non-cuttable constraint with an explicit rest length.
    pub fn new(i: u32, j: u32, rest_length: f32) -> Self {
        Self {
            i,
            j,
            rest_length,
            cuttable: false,
            cut_multiplier: 1.0,
        }
    }

    /// Create a constraint whose rest length is the current separation of `i` and `j`.
    pub fn between(particles: &ParticleSet, i: u32, j: u32) -> Self {
        let rest = (particles.position[j as usize] - particles.position[i as usize]).length();
        Self::new(i, j, rest)
    }

    /// Make this constraint break at `rest_length * multiplier`.
    pub fn with_cutting(mut self, multiplier: f32) -> Self {
        self.cuttable = true;
        self.cut_multiplier = multiplier;
        self
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    #[inline]
    pub fn involves(&self, particle: u32) -> bool {
        self.i == particle || self.j == particle
    }

    /// Evaluate the constraint.
    ///
    /// When the constraint is cuttable and stretched to `rest * cut_multiplier`
    /// or beyond, its movable endpoints are pushed onto `cuts`. This happens on
    /// every evaluation. Returns `None` for coincident endpoints, where the
    /// direction is undefined.
    pub fn compute_correction(
        &self,
        particles: &ParticleSet,
        k: f32,
        cuts: &mut CutQueue,
    ) -> Option<Correction> {
        let (i, j) = (self.i as usize, self.j as usize);
        let delta = particles.position[j] - particles.position[i];
        let distance = delta.length();

        if self.cuttable && distance >= self.rest_length * self.cut_multiplier {
            if particles.movable[i] {
                cuts.push(self.i);
            }
            if particles.movable[j] {
                cuts.push(self.j);
            }
        }

        if distance < MIN_SEPARATION {
            log::trace!("skipping coincident constraint {}-{}", self.i, self.j);
            return None;
        }

        let direction = delta / distance;
        Some(Correction {
            vector: direction * (k * (distance - self.rest_length)),
            direction,
            distance,
        })
    }
}

/// Run one Gauss-Seidel sweep over `constraints` in order.
///
/// Each correction sees the positions left by the previous one, so the sweep
/// is order dependent and must not be split across threads without separate
/// accumulation buffers.
pub fn solve_distance_constraints(
    constraints: &[DistanceConstraint],
    particles: &mut ParticleSet,
    params: &SolveParams,
    cuts: &mut CutQueue,
) {
    for c in constraints {
        let Some(correction) = c.compute_correction(particles, params.stiffness, cuts) else {
            continue;
        };
        let i = c.i as usize;
        let j = c.j as usize;

        let magnitude = correction.vector.length();
        particles.display_force[i] += magnitude;
        particles.display_force[j] += magnitude;

        match params.mode {
            SolveMode::Positional => {
                let half = correction.vector * 0.5;
                particles.offset_position(i, half);
                particles.offset_position(j, -half);
            }
            SolveMode::Force => {
                particles.add_force(i, correction.vector);
                particles.add_force(j, -correction.vector);
            }
            SolveMode::ForceWithFriction => {
                let mut force = correction.vector;
                if params.dt > 0.0 {
                    let relative = particles.velocity(j, params.dt) - particles.velocity(i, params.dt);
                    force += correction.direction * (relative.dot(correction.direction) * params.friction);
                }
                particles.add_force(i, force);
                particles.add_force(j, -force);
            }
        }
    }
}
