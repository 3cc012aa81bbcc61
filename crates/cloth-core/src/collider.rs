//! Passive collision primitives.
//!
//! Shapes are fixed at construction; their placement comes from a
//! [`PoseTable`] entry that the surrounding scene may move between ticks.
//! The cloth never owns colliders, it only reads them through a
//! [`ColliderScene`] borrowed for the duration of a step.

use glam::Vec3;

use crate::config::MIN_SEPARATION;
use crate::error::{ClothError, Result};
use crate::pose::{Pose, PoseHandle, PoseTable};

/// Penetration of a point into a collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit direction that moves the point out of the collider.
    pub direction: Vec3,
    /// Distance to the surface along `direction` (positive = inside).
    pub depth: f32,
}

/// Common interface for every collider shape.
pub trait Collider {
    /// Handle of the pose this collider is attached to.
    fn pose(&self) -> PoseHandle;

    /// Penetration of `point` against the collider placed at `pose`, if any.
    fn contact_at(&self, pose: &Pose, point: Vec3) -> Option<Contact>;

    /// Penetration of `point` with the pose looked up in `poses`.
    ///
    /// A handle missing from the table yields no contact.
    fn penetration(&self, point: Vec3, poses: &PoseTable) -> Option<Contact> {
        let pose = poses.get(self.pose())?;
        self.contact_at(pose, point)
    }

    /// Offset that projects `point` to the surface, scaled by `skin`.
    fn resolve_offset(&self, point: Vec3, poses: &PoseTable, skin: f32) -> Option<Vec3> {
        self.penetration(point, poses)
            .map(|c| c.direction * c.depth * skin)
    }
}

/// Infinite plane through the pose origin with normal along local +Y.
#[derive(Clone, Copy, Debug)]
pub struct PlaneCollider {
    pub pose: PoseHandle,
}

impl PlaneCollider {
    pub fn new(pose: PoseHandle) -> Self {
        Self { pose }
    }
}

impl Collider for PlaneCollider {
    fn pose(&self) -> PoseHandle {
        self.pose
    }

    fn contact_at(&self, pose: &Pose, point: Vec3) -> Option<Contact> {
        let normal = pose.up();
        let signed = (point - pose.translation).dot(normal);
        (signed < 0.0).then(|| Contact {
            direction: normal,
            depth: -signed,
        })
    }
}

/// Sphere centered at the pose origin.
#[derive(Clone, Copy, Debug)]
pub struct SphereCollider {
    pub pose: PoseHandle,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(pose: PoseHandle, radius: f32) -> Self {
        Self { pose, radius }
    }
}

impl Collider for SphereCollider {
    fn pose(&self) -> PoseHandle {
        self.pose
    }

    fn contact_at(&self, pose: &Pose, point: Vec3) -> Option<Contact> {
        // Coincident with the center: push along the pose's up axis.
        sphere_contact(pose.translation, self.radius, point, pose.up())
    }
}

/// Capsule whose axis runs along local Y from `-half_height` to `+half_height`.
#[derive(Clone, Copy, Debug)]
pub struct CapsuleCollider {
    pub pose: PoseHandle,
    pub half_height: f32,
    pub radius: f32,
}

impl CapsuleCollider {
    pub fn new(pose: PoseHandle, half_height: f32, radius: f32) -> Self {
        Self {
            pose,
            half_height,
            radius,
        }
    }

    /// World-space segment endpoints for the given pose.
    pub fn segment(&self, pose: &Pose) -> (Vec3, Vec3) {
        (
            pose.transform_point(Vec3::new(0.0, -self.half_height, 0.0)),
            pose.transform_point(Vec3::new(0.0, self.half_height, 0.0)),
        )
    }
}

impl Collider for CapsuleCollider {
    fn pose(&self) -> PoseHandle {
        self.pose
    }

    fn contact_at(&self, pose: &Pose, point: Vec3) -> Option<Contact> {
        let (a, b) = self.segment(pose);
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > MIN_SEPARATION * MIN_SEPARATION {
            (point - a).dot(ab) / len_sq
        } else {
            0.0
        };

        // Outside the segment the capsule degenerates to its end spheres.
        let closest = if t <= 0.0 {
            a
        } else if t >= 1.0 {
            b
        } else {
            a + ab * t
        };

        // On the axis: push along the local X axis, perpendicular to the segment.
        sphere_contact(closest, self.radius, point, pose.rotation * Vec3::X)
    }
}

#[inline]
fn sphere_contact(center: Vec3, radius: f32, point: Vec3, fallback: Vec3) -> Option<Contact> {
    let v = point - center;
    let dist = v.length();
    if dist >= radius {
        return None;
    }
    let direction = if dist > MIN_SEPARATION {
        v / dist
    } else {
        log::trace!("point coincident with collider center, using fallback axis");
        fallback
    };
    Some(Contact {
        direction,
        depth: radius - dist,
    })
}

/// Scene-owned poses and colliders, borrowed by the cloth during a step.
#[derive(Clone, Debug, Default)]
pub struct ColliderScene {
    pub poses: PoseTable,
    planes: Vec<PlaneCollider>,
    spheres: Vec<SphereCollider>,
    capsules: Vec<CapsuleCollider>,
}

impl ColliderScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pose(&mut self, pose: Pose) -> PoseHandle {
        self.poses.insert(pose)
    }

    /// Move a collider's pose. Returns `false` for unknown handles.
    pub fn set_pose(&mut self, handle: PoseHandle, pose: Pose) -> bool {
        self.poses.set(handle, pose)
    }

    pub fn add_plane(&mut self, pose: PoseHandle) -> Result<usize> {
        self.check_pose(pose)?;
        self.planes.push(PlaneCollider::new(pose));
        Ok(self.planes.len() - 1)
    }

    pub fn add_sphere(&mut self, pose: PoseHandle, radius: f32) -> Result<usize> {
        self.check_pose(pose)?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ClothError::InvalidColliderShape("sphere radius must be positive"));
        }
        self.spheres.push(SphereCollider::new(pose, radius));
        Ok(self.spheres.len() - 1)
    }

    pub fn add_capsule(&mut self, pose: PoseHandle, half_height: f32, radius: f32) -> Result<usize> {
        self.check_pose(pose)?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ClothError::InvalidColliderShape("capsule radius must be positive"));
        }
        if !(half_height.is_finite() && half_height >= 0.0) {
            return Err(ClothError::InvalidColliderShape(
                "capsule half height must be non-negative",
            ));
        }
        self.capsules.push(CapsuleCollider::new(pose, half_height, radius));
        Ok(self.capsules.len() - 1)
    }

    pub fn planes(&self) -> &[PlaneCollider] {
        &self.planes
    }

    pub fn spheres(&self) -> &[SphereCollider] {
        &self.spheres
    }

    pub fn capsules(&self) -> &[CapsuleCollider] {
        &self.capsules
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty() && self.spheres.is_empty() && self.capsules.is_empty()
    }

    /// All colliders, planes first, then spheres, then capsules.
    pub fn colliders(&self) -> impl Iterator<Item = &dyn Collider> + '_ {
        self.planes
            .iter()
            .map(|c| c as &dyn Collider)
            .chain(self.spheres.iter().map(|c| c as &dyn Collider))
            .chain(self.capsules.iter().map(|c| c as &dyn Collider))
    }

    /// Push `point` out of every collider in turn and return the result.
    pub fn resolve_point(&self, mut point: Vec3, skin: f32) -> Vec3 {
        for collider in self.colliders() {
            if let Some(offset) = collider.resolve_offset(point, &self.poses, skin) {
                point += offset;
            }
        }
        point
    }

    fn check_pose(&self, pose: PoseHandle) -> Result<()> {
        if self.poses.contains(pose) {
            Ok(())
        } else {
            Err(ClothError::UnknownPose(pose.index()))
        }
    }
}
