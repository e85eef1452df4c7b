//! Neck solver: aims the neck's bone axis at the head effector.

use bevy::log::trace;
use nalgebra::Vector3;

use fbik_core::math::{
    basis_lock_y, blend_rotation, limit_xz_square, normalize, rotation_from_basis, IK_EPSILON,
};
use fbik_core::skeleton::Skeleton;

use crate::solver::{HeadIk, ParentFrame, PrevFrame};

impl HeadIk {
    /// Orient the neck toward `target` with `weight`, or put it at rest.
    ///
    /// Partial weights blend from rest in reset mode and from the neck's
    /// previous-frame rotation otherwise. At zero weight the neck is only
    /// written in reset mode.
    pub(crate) fn solve_neck(
        &self,
        skeleton: &mut Skeleton,
        parent: &ParentFrame,
        target: &Vector3<f32>,
        weight: f32,
        prev: Option<&PrevFrame>,
    ) {
        let neck = self.bones.neck;
        let (Some(bind), Some(position)) = (skeleton.bind_pose(neck), skeleton.world_position(neck))
        else {
            return;
        };
        let rest = bind.rest_rotation(&parent.base_rotation);

        if weight <= IK_EPSILON {
            if prev.is_none() {
                skeleton.set_world_rotation(neck, rest);
            }
            return;
        }

        let Some(mut aim) = normalize(&(target - position)) else {
            trace!("neck: head target on the neck, skipped");
            return;
        };

        let neck_basis = parent.basis * bind.local_axis_basis;
        let mut local = neck_basis.transpose() * aim;
        if limit_xz_square(
            &mut local,
            self.limits.neck_roll.sin,
            self.limits.neck_roll.sin,
            self.limits.neck_pitch_down.sin,
            self.limits.neck_pitch_up.sin,
        ) {
            aim = neck_basis * local;
        }

        let Some(basis) = basis_lock_y(
            &parent.base_basis.column(0).into_owned(),
            &aim,
            &parent.base_basis.column(2).into_owned(),
        ) else {
            trace!("neck: degenerate aim basis, skipped");
            return;
        };
        let solved = rotation_from_basis(&(basis * bind.bone_to_world_basis));
        let from = prev.map_or(rest, |p| p.neck);
        skeleton.set_world_rotation(neck, blend_rotation(&from, &solved, weight));
    }
}
