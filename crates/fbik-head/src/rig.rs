//! Joints and effectors the head solver works on.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use fbik_core::effector::Effector;
use fbik_core::error::SkeletonError;
use fbik_core::skeleton::{BoneId, Skeleton};

/// Names of the head joints in a rig description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadBoneNames {
    pub neck: String,
    pub head: String,
    pub left_eye: String,
    pub right_eye: String,
}

impl Default for HeadBoneNames {
    fn default() -> Self {
        Self {
            neck: "neck".into(),
            head: "head".into(),
            left_eye: "left_eye".into(),
            right_eye: "right_eye".into(),
        }
    }
}

/// Joints driven by the head solver. Eyes are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadBones {
    pub neck: BoneId,
    pub head: BoneId,
    pub left_eye: Option<BoneId>,
    pub right_eye: Option<BoneId>,
}

impl HeadBones {
    /// Look the joints up by name. Neck and head are required.
    pub fn resolve(skeleton: &Skeleton, names: &HeadBoneNames) -> Result<Self, SkeletonError> {
        Ok(Self {
            neck: skeleton.bone_id(&names.neck)?,
            head: skeleton.bone_id(&names.head)?,
            left_eye: skeleton.find(&names.left_eye),
            right_eye: skeleton.find(&names.right_eye),
        })
    }

    /// Eye joints present in the rig, left first.
    pub fn eyes(&self) -> impl Iterator<Item = BoneId> {
        self.left_eye.into_iter().chain(self.right_eye)
    }
}

/// Effectors read by the head solver.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadEffectors {
    /// Position goal aims the neck; rotation goal orients the head.
    pub head: Effector,
    /// Position goal is the gaze target.
    pub eyes: Effector,
}

impl HeadEffectors {
    /// Effectors resting on the rig's bind pose.
    ///
    /// The head effector sits on the head joint with the rig's base
    /// orientation. The eyes effector sits between the eyes, or on the head
    /// when the rig has no pair of eyes.
    pub fn from_skeleton(skeleton: &Skeleton, bones: &HeadBones) -> Result<Self, SkeletonError> {
        let head = skeleton
            .bind_pose(bones.head)
            .ok_or_else(|| missing(skeleton, bones.head))?;
        let root_rotation = *skeleton.default_root_rotation();

        let left = bones.left_eye.and_then(|id| skeleton.bind_pose(id));
        let right = bones.right_eye.and_then(|id| skeleton.bind_pose(id));
        let eyes_position = match (left, right) {
            (Some(l), Some(r)) => (l.default_position + r.default_position) * 0.5,
            _ => head.default_position,
        };

        Ok(Self {
            head: Effector::new(head.default_position, root_rotation),
            eyes: Effector::new(eyes_position, root_rotation),
        })
    }

    /// Disable every goal.
    pub fn clear(&mut self) {
        self.head.clear();
        self.eyes.clear();
    }

    /// Point the gaze at `target` with `weight`.
    pub fn look_at(&mut self, target: Vector3<f32>, weight: f32) {
        self.eyes.set_position_goal(target, weight);
    }
}

fn missing(skeleton: &Skeleton, id: BoneId) -> SkeletonError {
    let name = skeleton
        .bone(id)
        .map_or_else(|| format!("#{}", id.0), |b| b.name().to_owned());
    SkeletonError::MissingBone(name)
}
