//! Coordinate conversion between file space and host space.
//!
//! Files are Y-up with quaternions stored `[x, y, z, w]`; the host rig is
//! Z-up. Besides the axis swap, every animated value is re-based against
//! the rig's rest pose: locations are expressed relative to the bone head
//! in the bone's rest frame, rotations are conjugated by the rest world
//! rotation with the rest local rotation divided out. Dragon-engine rigs
//! keep the local rest rotation of finger bones on the parent, so those
//! bones get a separate re-basing chain.

use glam::{Quat, Vec3};
use std::collections::HashMap;

/// Rest-pose data captured from the host rig for one bone, in host space.
#[derive(Clone, Debug)]
pub struct BonePose {
    /// Head position of the rest bone.
    pub head: Vec3,
    /// World translation of the rest pose matrix. The re-basing math
    /// cancels it; kept because it is part of the captured pose.
    pub world_location: Vec3,
    /// World rotation of the rest pose matrix.
    pub world_rotation: Quat,
    /// Rest rotation relative to the parent bone.
    pub local_rotation: Quat,
    /// Parent bone name, if any.
    pub parent: Option<String>,
}

impl BonePose {
    /// Pose with no offset and no rotation, parented to `parent`.
    pub fn identity(parent: Option<&str>) -> Self {
        BonePose {
            head: Vec3::ZERO,
            world_location: Vec3::ZERO,
            world_rotation: Quat::IDENTITY,
            local_rotation: Quat::IDENTITY,
            parent: parent.map(str::to_owned),
        }
    }
}

/// Rest skeleton of the host rig: bone poses keyed by name.
#[derive(Clone, Debug, Default)]
pub struct RestSkeleton {
    bones: HashMap<String, BonePose>,
}

impl RestSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pose: BonePose) {
        self.bones.insert(name.into(), pose);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn pose(&self, name: &str) -> Option<&BonePose> {
        self.bones.get(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.pose(name)?.parent.as_deref()
    }

    pub fn parent_pose(&self, name: &str) -> Option<&BonePose> {
        self.pose(self.parent_of(name)?)
    }

    /// Walks the parent chain; `name` itself does not count. Bounded by the
    /// bone count so a malformed parent cycle terminates.
    pub fn is_descendant_of(&self, name: &str, ancestor: &str) -> bool {
        let mut current = self.parent_of(name);
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.bones.len() {
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Dragon-engine rigs re-parent the hip under the tail bone.
    pub fn is_dragon(&self) -> bool {
        self.parent_of("kosi_c_n") == Some("ketu_c_n")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// File position to host position. The swap is self-inverse.
pub fn position_to_host(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

/// Host position to file position. The swap is self-inverse.
pub fn position_to_file(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

/// File rotation to host rotation. The component swap is self-inverse.
pub fn rotation_to_host(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.z, q.y, q.w)
}

/// Host rotation to file rotation. The component swap is self-inverse.
pub fn rotation_to_file(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.z, q.y, q.w)
}

/// Re-bases an axis-converted location onto the rest bone: the value
/// becomes an offset from the bone head, rotated into the bone's rest
/// frame. The full chain conjugates by the rest world location as well,
/// but that sandwich cancels, leaving `R⁻¹ · (v − head + parent_head)`.
pub fn rebase_location_to_host(rest: &BonePose, parent: Option<&BonePose>, value: Vec3) -> Vec3 {
    let parent_head = parent.map_or(Vec3::ZERO, |p| p.head);
    rest.world_rotation.inverse() * (value - rest.head + parent_head)
}

/// Exact inverse of [`rebase_location_to_host`].
pub fn rebase_location_to_file(rest: &BonePose, parent: Option<&BonePose>, value: Vec3) -> Vec3 {
    let parent_head = parent.map_or(Vec3::ZERO, |p| p.head);
    rest.world_rotation * value + rest.head - parent_head
}

/// Re-bases an axis-converted rotation onto the rest bone, dividing out
/// the bone's own rest local rotation: `R⁻¹ · L⁻¹ · q · R`.
pub fn rebase_rotation_to_host(rest: &BonePose, value: Quat) -> Quat {
    let r = rest.world_rotation;
    r.inverse() * rest.local_rotation.inverse() * value * r
}

/// Exact inverse of [`rebase_rotation_to_host`]: `L · R · q · R⁻¹`.
pub fn rebase_rotation_to_file(rest: &BonePose, value: Quat) -> Quat {
    let r = rest.world_rotation;
    rest.local_rotation * r * value * r.inverse()
}

/// Dragon-engine variant of [`rebase_rotation_to_host`] for bones whose
/// rest local rotation lives on the parent: `R⁻¹ · q · Lp · R`. A missing
/// parent contributes the identity, which collapses this onto the legacy
/// chain for identity rest locals.
pub fn rebase_rotation_to_host_dragon(
    rest: &BonePose,
    parent: Option<&BonePose>,
    value: Quat,
) -> Quat {
    let r = rest.world_rotation;
    let parent_local = parent.map_or(Quat::IDENTITY, |p| p.local_rotation);
    r.inverse() * value * parent_local * r
}

/// Exact inverse of [`rebase_rotation_to_host_dragon`]:
/// `R · q · R⁻¹ · Lp⁻¹`.
pub fn rebase_rotation_to_file_dragon(
    rest: &BonePose,
    parent: Option<&BonePose>,
    value: Quat,
) -> Quat {
    let r = rest.world_rotation;
    let parent_local = parent.map_or(Quat::IDENTITY, |p| p.local_rotation);
    r * value * r.inverse() * parent_local.inverse()
}

const FINGER_STEMS: [&str; 5] = ["oya", "hito", "naka", "kusu", "ko"];

/// Finger bones are named stem + digit (`oya1_r_n`, `ko2_l_n`, ...). The
/// digit requirement keeps unrelated bones like `kosi_c_n` out.
pub fn is_finger_bone(name: &str) -> bool {
    FINGER_STEMS.iter().any(|stem| {
        name.strip_prefix(stem)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Whether a bone's rotations go through the dragon re-basing chain.
pub fn uses_parent_basis(skeleton: &RestSkeleton, bone: &str) -> bool {
    skeleton.is_dragon() && is_finger_bone(bone)
}
