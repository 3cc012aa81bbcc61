use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rigid transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Map a point from local to world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }

    /// The local +Y axis in world space.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Copyable reference into a [`PoseTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseHandle(pub(crate) u32);

impl PoseHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Scene-owned storage for collider poses.
///
/// Poses are only appended, never removed, so a handle stays valid for the
/// lifetime of the table. Colliders hold handles and re-read the pose on
/// every collision check.
#[derive(Clone, Debug, Default)]
pub struct PoseTable {
    poses: Vec<Pose>,
}

impl PoseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pose: Pose) -> PoseHandle {
        self.poses.push(pose);
        PoseHandle(self.poses.len() as u32 - 1)
    }

    pub fn get(&self, handle: PoseHandle) -> Option<&Pose> {
        self.poses.get(handle.0 as usize)
    }

    /// Replace the pose behind `handle`. Returns `false` for unknown handles.
    pub fn set(&mut self, handle: PoseHandle, pose: Pose) -> bool {
        match self.poses.get_mut(handle.0 as usize) {
            Some(slot) => {
                *slot = pose;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, handle: PoseHandle) -> bool {
        (handle.0 as usize) < self.poses.len()
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}
