use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constraints::distance::SolveMode;
use crate::error::{ClothError, Result};

/// Default fixed physics tick in seconds.
pub const FIXED_TIME_STEP: f32 = 1.0 / 60.0;

/// Default cap on ticks run by the scheduler in a single frame.
pub const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 8;

/// Separations below this are treated as coincident and skipped.
pub const MIN_SEPARATION: f32 = 1e-6;

/// Which particles are pinned when the grid is built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinPattern {
    /// Every particle is free.
    None,
    /// The `n` leftmost and `n` rightmost particles of the top row.
    TopCorners(u32),
    /// The whole top row.
    TopEdge,
    /// Explicit `(x, y)` grid coordinates.
    Points(Vec<(u32, u32)>),
}

/// Construction parameters of a cloth.
///
/// A cloth is rebuilt wholesale from one of these; there is no incremental
/// reconfiguration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClothConfig {
    /// Particles per side (grid is `dim x dim`).
    pub dim: u32,
    /// Rest distance between axis-aligned neighbors.
    pub spacing: f32,
    /// World position of grid coordinate (0, 0).
    pub origin: Vec3,
    /// Orientation of the grid plane in world space.
    pub rotation: Quat,
    pub pin: PinPattern,
    pub solve_mode: SolveMode,
    /// Spring stiffness `K`.
    pub stiffness: f32,
    /// Velocity damping `U` used by [`SolveMode::ForceWithFriction`].
    pub friction: f32,
    pub constraint_iterations: u32,
    pub collision_iterations: u32,
    pub particle_mass: f32,
    /// Neighbor radius used to build constraints (1 = immediate neighbors).
    pub constraint_level: u32,
    pub cuttable: bool,
    /// A cuttable constraint breaks at `rest_length * cut_multiplier`.
    pub cut_multiplier: f32,
    pub gravity: Vec3,
    /// Fraction of velocity lost per integration step, in [0, 1).
    pub damping: f32,
    /// Multiplier (> 1) applied to collision push-out depth.
    pub collision_skin: f32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            dim: 20,
            spacing: 0.25,
            origin: Vec3::new(2.5, 4.0, 0.0),
            rotation: Quat::IDENTITY,
            pin: PinPattern::TopCorners(3),
            solve_mode: SolveMode::Positional,
            stiffness: 0.5,
            friction: 0.1,
            constraint_iterations: 15,
            collision_iterations: 2,
            particle_mass: 1.0,
            constraint_level: 2,
            cuttable: false,
            cut_multiplier: 2.0,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            damping: 0.02,
            collision_skin: 1.15,
        }
    }
}

impl ClothConfig {
    /// Reject parameters that cannot produce a valid cloth.
    ///
    /// Nothing is clamped: every bad value is reported.
    pub fn validate(&self) -> Result<()> {
        // Particle indices are u32, so the whole grid must fit in one.
        if self.dim == 0 || self.dim.checked_mul(self.dim).is_none() {
            return Err(ClothError::InvalidDimension(self.dim));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ClothError::InvalidSpacing(self.spacing));
        }
        if !(self.particle_mass.is_finite() && self.particle_mass > 0.0) {
            return Err(ClothError::InvalidMass(self.particle_mass));
        }
        if !(self.damping.is_finite() && (0.0..1.0).contains(&self.damping)) {
            return Err(ClothError::InvalidDamping(self.damping));
        }
        for (name, value) in [("stiffness", self.stiffness), ("friction", self.friction)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ClothError::InvalidCoefficient { name, value });
            }
        }
        if !(self.cut_multiplier.is_finite() && self.cut_multiplier >= 1.0) {
            return Err(ClothError::InvalidCutMultiplier(self.cut_multiplier));
        }
        if !(self.collision_skin.is_finite() && self.collision_skin > 1.0) {
            return Err(ClothError::InvalidCollisionSkin(self.collision_skin));
        }
        for (name, value) in [("origin", self.origin), ("gravity", self.gravity)] {
            if !value.is_finite() {
                return Err(ClothError::NonFiniteVector { name });
            }
        }
        if !(self.rotation.is_finite() && self.rotation.is_normalized()) {
            return Err(ClothError::InvalidRotation);
        }
        if self.constraint_level >= self.dim && self.dim > 1 {
            return Err(ClothError::NeighborRadiusOutOfRange {
                level: self.constraint_level,
                dim: self.dim,
            });
        }
        match &self.pin {
            PinPattern::TopCorners(n) if *n > self.dim => {
                return Err(ClothError::PinOutOfRange { x: *n, y: 0, dim: self.dim });
            }
            PinPattern::Points(points) => {
                for &(x, y) in points {
                    if x >= self.dim || y >= self.dim {
                        return Err(ClothError::PinOutOfRange { x, y, dim: self.dim });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
