//! Gaze convergence: aim the neck, then the head, at the gaze target, and
//! hand the rest to the eyes.
//!
//! Each stage predicts where the eyes would sit if the joints above held
//! their current frame, turns the direction to the target into the stage's
//! local frame, damps it by the stage's pitch / yaw rates and clamps it to
//! the gaze cone and the joint's limits. The head stage uses the square
//! clamp alone rather than the full head limiter.

use bevy::log::trace;
use nalgebra::{Matrix3, Vector3};

use fbik_core::effector::Effector;
use fbik_core::math::{
    basis_lock_z, blend_rotation, limit_cone, limit_xy_square, normalize, rotation_from_basis,
    transform_point,
};
use fbik_core::skeleton::Skeleton;

use crate::solver::{base_basis, HeadIk, ParentFrame, PrevFrame};

impl HeadIk {
    pub(crate) fn solve_gaze(
        &self,
        skeleton: &mut Skeleton,
        parent: &ParentFrame,
        eyes: &Effector,
        prev: Option<&PrevFrame>,
    ) {
        let Some(neck_base_basis) = self.aim_neck(skeleton, parent, eyes) else {
            return;
        };
        let neck_basis = neck_base_basis * skeleton.default_root_basis_inv();
        let Some(head_base_basis) = self.aim_head(skeleton, &neck_basis, &neck_base_basis, eyes, prev)
        else {
            return;
        };
        self.solve_eyes(skeleton, &neck_basis, &head_base_basis, eyes, prev);
    }

    /// Pitch the neck toward the target. Returns the neck's base frame after
    /// the write (or as it was, when the stage is skipped).
    fn aim_neck(
        &self,
        skeleton: &mut Skeleton,
        parent: &ParentFrame,
        eyes: &Effector,
    ) -> Option<Matrix3<f32>> {
        let neck = self.bones.neck;
        let bind = skeleton.bind_pose(neck)?;
        let current = skeleton.world_rotation(neck)?;

        let predicted = transform_point(
            &parent.basis,
            eyes.default_position(),
            &parent.bind.default_position,
            &parent.position,
        );
        let mut local = parent.base_basis.transpose() * (eyes.world_position - predicted);
        local.y *= self.eyes_to_neck_pitch_rate;
        let Some(mut local) = normalize(&local) else {
            trace!("gaze: target on the predicted eyes, neck stage skipped");
            return Some(base_basis(&bind, &current));
        };

        // The neck only pitches toward the target.
        limit_cone(&mut local, self.limits.eyes_range.cos);
        local.y = local
            .y
            .clamp(-self.limits.neck_pitch_down.sin, self.limits.neck_pitch_up.sin);
        local = Vector3::new(0.0, local.y, (1.0 - local.y * local.y).sqrt());

        let Some(basis) = basis_lock_z(
            &parent.base_basis.column(0).into_owned(),
            &parent.base_basis.column(1).into_owned(),
            &(parent.base_basis * local),
        ) else {
            trace!("gaze: degenerate neck basis, neck stage skipped");
            return Some(base_basis(&bind, &current));
        };

        let solved = rotation_from_basis(&(basis * bind.base_to_world_basis));
        let rotation = blend_rotation(&current, &solved, eyes.effective_position_weight());
        skeleton.set_world_rotation(neck, rotation);
        Some(base_basis(&bind, &rotation))
    }

    /// Yaw and pitch the head toward the target from the solved neck.
    /// Returns the head's base frame after the write.
    fn aim_head(
        &self,
        skeleton: &mut Skeleton,
        neck_basis: &Matrix3<f32>,
        neck_base_basis: &Matrix3<f32>,
        eyes: &Effector,
        prev: Option<&PrevFrame>,
    ) -> Option<Matrix3<f32>> {
        let neck_bind = skeleton.bind_pose(self.bones.neck)?;
        let head_bind = skeleton.bind_pose(self.bones.head)?;
        let neck_position = skeleton.world_position(self.bones.neck)?;

        let predicted = transform_point(
            neck_basis,
            eyes.default_position(),
            &neck_bind.default_position,
            &neck_position,
        );
        let mut local = neck_base_basis.transpose() * (eyes.world_position - predicted);
        local.x *= self.eyes_to_head_yaw_rate;
        local.y *= self.eyes_to_head_pitch_rate;

        let basis = normalize(&local).and_then(|mut local| {
            limit_cone(&mut local, self.limits.eyes_range.cos);
            limit_xy_square(
                &mut local,
                self.limits.head_yaw.sin,
                self.limits.head_yaw.sin,
                self.limits.head_pitch_down.sin,
                self.limits.head_pitch_up.sin,
            );
            basis_lock_z(
                &neck_base_basis.column(0).into_owned(),
                &neck_base_basis.column(1).into_owned(),
                &(neck_base_basis * local),
            )
        });

        let rotation = match basis {
            Some(basis) => {
                let solved = rotation_from_basis(&(basis * head_bind.base_to_world_basis));
                let from = self.head_blend_source(skeleton, prev)?;
                blend_rotation(&from, &solved, eyes.effective_position_weight())
            }
            None if prev.is_none() => {
                trace!("gaze: no usable head direction, head left at rest");
                self.head_rest_rotation(skeleton)?
            }
            None => {
                trace!("gaze: no usable head direction, head stage skipped");
                let current = skeleton.world_rotation(self.bones.head)?;
                return Some(base_basis(&head_bind, &current));
            }
        };
        skeleton.set_world_rotation(self.bones.head, rotation);
        Some(base_basis(&head_bind, &rotation))
    }
}
