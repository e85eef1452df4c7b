//! Head-only resolver, taken when there is no gaze target.

use nalgebra::UnitQuaternion;

use fbik_core::math::{blend_rotation, renormalize, IK_EPSILON};
use fbik_core::skeleton::Skeleton;

use crate::limits::limit_head_rotation;
use crate::solver::{HeadIk, PrevFrame};

impl HeadIk {
    /// Orient the head from its rotation goal, limit it against the neck and
    /// reset the eyes in reset mode.
    ///
    /// `neck_weight` is the head position weight the neck was solved with.
    /// On an idle frame outside reset mode nothing is written, the limiter
    /// included.
    ///
    /// Returns whether the head was driven: in reset mode, or when the
    /// rotation goal has weight.
    pub(crate) fn resolve_head_only(
        &self,
        skeleton: &mut Skeleton,
        target: &UnitQuaternion<f32>,
        weight: f32,
        neck_weight: f32,
        prev: Option<&PrevFrame>,
    ) -> bool {
        let head = self.bones.head;
        if weight > IK_EPSILON {
            let goal = target * self.offsets.head_effector_to_world;
            if let Some(from) = self.head_blend_source(skeleton, prev) {
                skeleton.set_world_rotation(head, blend_rotation(&from, &goal, weight));
            }
        } else if prev.is_none() {
            if let Some(rest) = self.head_rest_rotation(skeleton) {
                skeleton.set_world_rotation(head, rest);
            }
        }

        if prev.is_none() || weight > IK_EPSILON || neck_weight > IK_EPSILON {
            limit_head_rotation(skeleton, self.bones.neck, head, &self.limits);
        }

        if prev.is_none() {
            self.reset_eyes(skeleton);
        }
        prev.is_none() || weight > IK_EPSILON
    }

    /// Rest rotation of the head under the neck as it stands now.
    pub(crate) fn head_rest_rotation(&self, skeleton: &Skeleton) -> Option<UnitQuaternion<f32>> {
        let neck_bind = skeleton.bind_pose(self.bones.neck)?;
        let head_bind = skeleton.bind_pose(self.bones.head)?;
        let neck_now = skeleton.world_rotation(self.bones.neck)?;
        Some(head_bind.rest_rotation(&neck_bind.base_rotation(&neck_now)))
    }

    /// Where a partial head blend starts: rest in reset mode, otherwise the
    /// previous head carried along by this frame's neck motion.
    pub(crate) fn head_blend_source(
        &self,
        skeleton: &Skeleton,
        prev: Option<&PrevFrame>,
    ) -> Option<UnitQuaternion<f32>> {
        match prev {
            None => self.head_rest_rotation(skeleton),
            Some(prev) => {
                let neck_now = skeleton.world_rotation(self.bones.neck)?;
                Some(renormalize(&(neck_now * prev.neck.inverse() * prev.head)))
            }
        }
    }
}
