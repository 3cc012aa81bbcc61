//! Error types for cloth-core.

use thiserror::Error;

/// Errors raised when building a cloth, a collider scene or a scheduler.
///
/// Numerical degeneracies during a tick are never reported here; they are
/// skipped locally so a simulation step cannot fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClothError {
    /// Grid dimension must be at least one particle per side, and `dim * dim`
    /// must fit in a `u32` index.
    #[error("invalid grid dimension: {0}")]
    InvalidDimension(u32),

    /// Particle spacing must be positive and finite.
    #[error("invalid particle spacing: {0}")]
    InvalidSpacing(f32),

    /// Particle mass must be positive and finite.
    #[error("invalid particle mass: {0}")]
    InvalidMass(f32),

    /// Damping must lie in [0, 1).
    #[error("invalid damping: {0} (expected 0 <= damping < 1)")]
    InvalidDamping(f32),

    /// Stiffness and friction coefficients must be non-negative and finite.
    #[error("invalid {name}: {value}")]
    InvalidCoefficient {
        /// Which coefficient was rejected.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Cut multiplier must be at least 1.
    #[error("invalid cut multiplier: {0} (expected >= 1)")]
    InvalidCutMultiplier(f32),

    /// Collision skin multiplier must be greater than 1.
    #[error("invalid collision skin: {0} (expected > 1)")]
    InvalidCollisionSkin(f32),

    /// Origin or gravity has a NaN or infinite component.
    #[error("{name} must be finite")]
    NonFiniteVector {
        /// Which vector was rejected.
        name: &'static str,
    },

    /// Grid rotation must be a finite unit quaternion.
    #[error("grid rotation must be a unit quaternion")]
    InvalidRotation,

    /// Constraint level reaches past the edge of the grid.
    #[error("constraint level {level} out of range for a {dim}x{dim} grid")]
    NeighborRadiusOutOfRange {
        /// Requested neighbor radius.
        level: u32,
        /// Grid dimension.
        dim: u32,
    },

    /// A pinned coordinate lies outside the grid.
    #[error("pin ({x}, {y}) out of range for a {dim}x{dim} grid")]
    PinOutOfRange {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Grid dimension.
        dim: u32,
    },

    /// A queried grid coordinate lies outside the grid.
    #[error("coordinate ({x}, {y}) out of range for a {dim}x{dim} grid")]
    CoordinateOutOfRange {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Grid dimension.
        dim: u32,
    },

    /// A collider references a pose that is not in the scene's pose table.
    #[error("unknown pose handle: {0}")]
    UnknownPose(u32),

    /// Collider geometry is degenerate.
    #[error("invalid collider shape: {0}")]
    InvalidColliderShape(&'static str),

    /// Fixed tick duration must be positive and finite.
    #[error("invalid tick duration: {0}")]
    InvalidTick(f64),

    /// At least one tick per frame must be allowed.
    #[error("max ticks per frame must be at least 1")]
    InvalidTickBudget,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ClothError>;
