//! Anatomical limits and the head rotation limiter.

use bevy::log::trace;
use fbik_core::config::HeadIkSettings;
use fbik_core::math::{
    basis_from_rotation, basis_from_yz_lock_z, limit_xy_square, limit_xz_square, renormalize,
    rotation_from_basis,
};
use fbik_core::skeleton::{BoneId, Skeleton};

/// A limit angle with its sine and cosine precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitTheta {
    /// Angle in radians.
    pub angle: f32,
    pub sin: f32,
    pub cos: f32,
}

impl LimitTheta {
    pub fn from_degrees(degrees: f32) -> Self {
        let angle = degrees.to_radians();
        let (sin, cos) = angle.sin_cos();
        Self { angle, sin, cos }
    }
}

/// Neck, head and gaze-cone limits of one solver instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadLimits {
    pub neck_roll: LimitTheta,
    pub neck_pitch_up: LimitTheta,
    pub neck_pitch_down: LimitTheta,
    pub head_roll: LimitTheta,
    pub head_pitch_up: LimitTheta,
    pub head_pitch_down: LimitTheta,
    pub head_yaw: LimitTheta,
    /// Half-angle of the circular gaze cone.
    pub eyes_range: LimitTheta,
}

impl HeadLimits {
    pub fn from_settings(settings: &HeadIkSettings) -> Self {
        Self {
            neck_roll: LimitTheta::from_degrees(settings.neck_limit_roll_angle),
            neck_pitch_up: LimitTheta::from_degrees(settings.neck_limit_pitch_up_angle),
            neck_pitch_down: LimitTheta::from_degrees(settings.neck_limit_pitch_down_angle),
            head_roll: LimitTheta::from_degrees(settings.head_limit_roll_angle),
            head_pitch_up: LimitTheta::from_degrees(settings.head_limit_pitch_up_angle),
            head_pitch_down: LimitTheta::from_degrees(settings.head_limit_pitch_down_angle),
            head_yaw: LimitTheta::from_degrees(settings.head_limit_yaw_angle),
            eyes_range: LimitTheta::from_degrees(settings.eyes_range_angle),
        }
    }
}

impl Default for HeadLimits {
    fn default() -> Self {
        Self::from_settings(&HeadIkSettings::default())
    }
}

/// Clamp the head's rotation relative to the neck into the head limits.
///
/// The head's local Y axis is held to the roll / pitch square and its local
/// Z axis to the yaw / pitch square. When either moves, the local frame is
/// rebuilt keeping Z exact and written back. Returns `true` if the head was
/// written; a degenerate rebuild leaves the head as it was.
pub fn limit_head_rotation(
    skeleton: &mut Skeleton,
    neck: BoneId,
    head: BoneId,
    limits: &HeadLimits,
) -> bool {
    let (Some(neck_bind), Some(head_bind)) = (skeleton.bind_pose(neck), skeleton.bind_pose(head))
    else {
        return false;
    };
    let (Some(neck_rotation), Some(head_rotation)) =
        (skeleton.world_rotation(neck), skeleton.world_rotation(head))
    else {
        return false;
    };

    let neck_base = neck_bind.base_rotation(&neck_rotation);
    let head_base = head_bind.base_rotation(&head_rotation);
    let local = basis_from_rotation(&(neck_base.inverse() * head_base));

    let mut dir_y = local.column(1).into_owned();
    let mut dir_z = local.column(2).into_owned();
    let mut limited = limit_xz_square(
        &mut dir_y,
        limits.head_roll.sin,
        limits.head_roll.sin,
        limits.head_pitch_up.sin,
        limits.head_pitch_down.sin,
    );
    limited |= limit_xy_square(
        &mut dir_z,
        limits.head_yaw.sin,
        limits.head_yaw.sin,
        limits.head_pitch_down.sin,
        limits.head_pitch_up.sin,
    );
    if !limited {
        return false;
    }

    let Some(basis) = basis_from_yz_lock_z(&dir_y, &dir_z) else {
        trace!("head limit: degenerate local basis, head left unchanged");
        return false;
    };
    let limited_rotation =
        renormalize(&(neck_base * rotation_from_basis(&basis) * head_bind.base_to_world));
    skeleton.set_world_rotation(head, limited_rotation)
}
