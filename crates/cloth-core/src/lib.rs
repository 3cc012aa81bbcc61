//! Mass-spring cloth simulation.
//!
//! A square grid of Verlet particles connected by distance constraints,
//! relaxed iteratively and resolved against plane, sphere and capsule
//! colliders. Over-stretched constraints can tear the cloth. A
//! [`scheduler::FixedStepScheduler`] drives the simulation at a fixed tick
//! independent of the render rate.

pub mod cloth;
pub mod collider;
pub mod config;
pub mod constraints;
pub mod cut;
pub mod error;
pub mod forces;
pub mod mesh;
pub mod particle;
pub mod pose;
pub mod scheduler;

pub use cloth::ClothSimulation;
pub use collider::{CapsuleCollider, Collider, ColliderScene, PlaneCollider, SphereCollider};
pub use config::{ClothConfig, PinPattern, FIXED_TIME_STEP};
pub use constraints::distance::{DistanceConstraint, SolveMode};
pub use cut::CutQueue;
pub use error::{ClothError, Result};
pub use mesh::ClothVertex;
pub use particle::ParticleSet;
pub use pose::{Pose, PoseHandle, PoseTable};
pub use scheduler::{FixedStepScheduler, FrameReport, FrameStats};
