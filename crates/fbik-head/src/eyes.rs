//! Eye aim model: turns the gaze left over after the head aim into per-eye
//! rotations, plus the bind-pose eye reset.

use bevy::log::trace;
use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use fbik_core::debug_values::DebugValues;
use fbik_core::effector::Effector;
use fbik_core::math::{
    basis_from_rotation, basis_lock_z, blend_rotation, is_fuzzy_one, limit_xy_square, normalize,
    renormalize, rotation_from_basis, transform_point, IK_EPSILON,
};
use fbik_core::skeleton::{BoneId, Skeleton};

use crate::solver::{HeadIk, PrevFrame};

/// Socket positions of the biped template, relative to the head in the
/// rig's base frame.
pub const LEFT_SOCKET_LOCAL_POSITION: Vector3<f32> = Vector3::new(-0.018_531, 0.048_524, 0.027_682);
pub const RIGHT_SOCKET_LOCAL_POSITION: Vector3<f32> = Vector3::new(0.018_531, 0.048_524, 0.027_682);

// ---------------------------------------------------------------------------
// EyeTuning
// ---------------------------------------------------------------------------

/// Per-model eye constants. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTuning {
    pub horz_limit_angle: f32,
    pub vert_limit_angle: f32,
    pub x_rate: f32,
    pub y_rate: f32,
    pub outer_x_rot_rate: f32,
    pub inner_x_rot_rate: f32,
    /// Lateral socket travel of the inward-turning eye. Zero for rotation-only eyes.
    pub inner_move_x_rate: f32,
    pub outer_move_x_rate: f32,
}

impl EyeTuning {
    pub const GENERIC: Self = Self {
        horz_limit_angle: 40.0,
        vert_limit_angle: 12.0,
        x_rate: 0.796,
        y_rate: 0.729,
        outer_x_rot_rate: 0.356,
        inner_x_rot_rate: 0.212,
        inner_move_x_rate: 0.0,
        outer_move_x_rate: 0.0,
    };

    pub const SOCKET_BIPED: Self = Self {
        horz_limit_angle: 40.0,
        vert_limit_angle: 4.5,
        x_rate: 0.796,
        y_rate: 0.28,
        outer_x_rot_rate: 0.096,
        inner_x_rot_rate: 0.065,
        inner_move_x_rate: 0.063,
        outer_move_x_rate: 0.063,
    };

    /// These constants with any registered overrides applied.
    pub fn with_overrides(&self, values: &DebugValues) -> Self {
        Self {
            horz_limit_angle: values.get("eyes_horz_limit_angle", self.horz_limit_angle),
            vert_limit_angle: values.get("eyes_vert_limit_angle", self.vert_limit_angle),
            x_rate: values.get("eyes_x_rate", self.x_rate),
            y_rate: values.get("eyes_y_rate", self.y_rate),
            outer_x_rot_rate: values.get("eyes_outer_x_rot_rate", self.outer_x_rot_rate),
            inner_x_rot_rate: values.get("eyes_inner_x_rot_rate", self.inner_x_rot_rate),
            inner_move_x_rate: values.get("inner_move_x_rate", self.inner_move_x_rate),
            outer_move_x_rate: values.get("outer_move_x_rate", self.outer_move_x_rate),
        }
    }
}

// ---------------------------------------------------------------------------
// EyeModel
// ---------------------------------------------------------------------------

/// Bind-pose eye sockets of the biped template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSockets {
    /// World bind position of the left socket.
    pub left: Vector3<f32>,
    pub right: Vector3<f32>,
    /// Head lossy scale, when it is not one.
    pub head_scale: Option<Vector3<f32>>,
}

impl EyeSockets {
    /// Sockets placed around a head at `head_position` with `head_scale`,
    /// oriented by the rig's root basis.
    pub fn new(
        root_basis: &Matrix3<f32>,
        head_position: &Vector3<f32>,
        head_scale: &Vector3<f32>,
    ) -> Self {
        let head_scale = (!is_fuzzy_one(head_scale)).then_some(*head_scale);
        let place = |local: &Vector3<f32>| {
            let offset = root_basis * local;
            head_position + head_scale.map_or(offset, |s| offset.component_mul(&s))
        };
        Self {
            left: place(&LEFT_SOCKET_LOCAL_POSITION),
            right: place(&RIGHT_SOCKET_LOCAL_POSITION),
            head_scale,
        }
    }

    fn scaled(&self, v: Vector3<f32>) -> Vector3<f32> {
        self.head_scale.map_or(v, |s| v.component_mul(&s))
    }
}

/// Eye model of a solver instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EyeModel {
    /// Eyes only rotate.
    Generic,
    /// Eyes rotate and slide sideways in their sockets.
    SocketBiped(EyeSockets),
}

impl EyeModel {
    pub const fn tuning(&self) -> EyeTuning {
        match self {
            Self::Generic => EyeTuning::GENERIC,
            Self::SocketBiped(_) => EyeTuning::SOCKET_BIPED,
        }
    }

    pub const fn sockets(&self) -> Option<&EyeSockets> {
        match self {
            Self::Generic => None,
            Self::SocketBiped(sockets) => Some(sockets),
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// Solve / reset
// ---------------------------------------------------------------------------

impl HeadIk {
    /// Aim the eyes at the gaze target from an already aimed head.
    ///
    /// `neck_basis` is the neck's bind-to-world delta, `head_base_basis` the
    /// head frame in base convention.
    pub(crate) fn solve_eyes(
        &self,
        skeleton: &mut Skeleton,
        neck_basis: &Matrix3<f32>,
        head_base_basis: &Matrix3<f32>,
        eyes: &Effector,
        prev: Option<&PrevFrame>,
    ) {
        if !self.bones.eyes().any(|id| skeleton.is_alive(id)) {
            return;
        }
        let (Some(neck_bind), Some(head_bind), Some(neck_position)) = (
            skeleton.bind_pose(self.bones.neck),
            skeleton.bind_pose(self.bones.head),
            skeleton.world_position(self.bones.neck),
        ) else {
            return;
        };

        let tuning = self.eye_model.tuning().with_overrides(&self.debug_values);
        let horz_limit = tuning.horz_limit_angle.to_radians().sin();
        let vert_limit = tuning.vert_limit_angle.to_radians().sin();
        let weight = eyes.effective_position_weight();

        let head_basis = head_base_basis * skeleton.default_root_basis_inv();
        let head_position = transform_point(
            neck_basis,
            &head_bind.default_position,
            &neck_bind.default_position,
            &neck_position,
        );
        let eyes_position = transform_point(
            &head_basis,
            eyes.default_position(),
            &head_bind.default_position,
            &head_position,
        );

        let Some(mut gaze) =
            normalize(&(head_base_basis.transpose() * (eyes.world_position - eyes_position)))
        else {
            trace!("eyes: gaze target on the eyes, skipped");
            return;
        };
        if prev.is_none() && weight < 1.0 - IK_EPSILON {
            if let Some(d) = normalize(&Vector3::z().lerp(&gaze, weight)) {
                gaze = d;
            }
        }

        limit_xy_square(&mut gaze, horz_limit, horz_limit, vert_limit, vert_limit);

        let move_x = (gaze.x * tuning.x_rate).clamp(-horz_limit, horz_limit);
        gaze.x *= tuning.x_rate;
        gaze.y *= tuning.y_rate;

        // The eye turning toward the nose is the inner one.
        let (left_x_rate, right_x_rate) = if gaze.x >= 0.0 {
            (tuning.inner_x_rot_rate, tuning.outer_x_rot_rate)
        } else {
            (tuning.outer_x_rot_rate, tuning.inner_x_rot_rate)
        };
        let (left_move_rate, right_move_rate) = if move_x >= 0.0 {
            (tuning.inner_move_x_rate, tuning.outer_move_x_rate)
        } else {
            (tuning.outer_move_x_rate, tuning.inner_move_x_rate)
        };

        let head_now = skeleton.world_rotation(self.bones.head);
        let sides = [
            (Side::Left, self.bones.left_eye, left_x_rate, left_move_rate),
            (Side::Right, self.bones.right_eye, right_x_rate, right_move_rate),
        ];
        for (side, eye, x_rot_rate, move_rate) in sides {
            let Some(eye) = eye.filter(|&id| skeleton.is_alive(id)) else {
                continue;
            };
            let local = Vector3::new(gaze.x * x_rot_rate, gaze.y, gaze.z);
            let Some(local) = normalize(&local) else {
                continue;
            };
            let Some(eye_base_basis) = basis_lock_z(
                &head_base_basis.column(0).into_owned(),
                &head_base_basis.column(1).into_owned(),
                &(head_base_basis * local),
            ) else {
                trace!("eyes: degenerate eye basis, skipped");
                continue;
            };
            let Some(eye_bind) = skeleton.bind_pose(eye) else {
                continue;
            };
            let mut rotation = rotation_from_basis(&(eye_base_basis * eye_bind.base_to_world_basis));

            if let (Some(prev), Some(head_now)) = (prev, head_now) {
                if weight < 1.0 - IK_EPSILON {
                    let eye_prev = match side {
                        Side::Left => prev.left_eye,
                        Side::Right => prev.right_eye,
                    };
                    let from = renormalize(&(head_now * prev.head.inverse() * eye_prev));
                    rotation = blend_rotation(&from, &rotation, weight);
                }
            }

            if let Some(sockets) = self.eye_model.sockets() {
                let socket_default = match side {
                    Side::Left => sockets.left,
                    Side::Right => sockets.right,
                };
                let offset = head_base_basis.column(0).into_owned() * (move_rate * 0.1 * move_x);
                let socket_world = sockets.scaled(offset)
                    + transform_point(
                        &head_basis,
                        &socket_default,
                        &head_bind.default_position,
                        &head_position,
                    );
                let eye_basis = basis_from_rotation(&eye_bind.base_rotation(&rotation))
                    * skeleton.default_root_basis_inv();
                let position = transform_point(
                    &eye_basis,
                    &eye_bind.default_position,
                    &socket_default,
                    &socket_world,
                );
                skeleton.set_world_position(eye, position);
            }
            skeleton.set_world_rotation(eye, rotation);
        }
    }

    /// Put the eyes back on their bind offset from the head.
    pub(crate) fn reset_eyes(&self, skeleton: &mut Skeleton) {
        let head = self.bones.head;
        let (Some(head_bind), Some(head_rotation), Some(head_position)) = (
            skeleton.bind_pose(head),
            skeleton.world_rotation(head),
            skeleton.world_position(head),
        ) else {
            return;
        };
        let head_delta = head_bind.delta_basis(&head_rotation);

        let eyes = [
            (self.bones.left_eye, self.offsets.head_to_left_eye),
            (self.bones.right_eye, self.offsets.head_to_right_eye),
        ];
        for (eye, offset) in eyes {
            let Some((eye, eye_bind)) =
                eye.and_then(|id| skeleton.bind_pose(id).map(|bind| (id, bind)))
            else {
                continue;
            };
            if self.eye_model.sockets().is_some() {
                let position = transform_point(
                    &head_delta,
                    &eye_bind.default_position,
                    &head_bind.default_position,
                    &head_position,
                );
                skeleton.set_world_position(eye, position);
            }
            skeleton.set_world_rotation(eye, head_rotation * offset);
        }
    }
}

/// Bind offset of an eye from the head, identity when either is missing.
pub(crate) fn head_to_eye_offset(
    skeleton: &Skeleton,
    head: BoneId,
    eye: Option<BoneId>,
) -> UnitQuaternion<f32> {
    match (skeleton.bind_pose(head), eye.and_then(|id| skeleton.bind_pose(id))) {
        (Some(head), Some(eye)) => head.default_rotation.inverse() * eye.default_rotation,
        _ => UnitQuaternion::identity(),
    }
}
