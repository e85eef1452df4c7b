//! Head / neck / eyes solver entry point.
//!
//! [`HeadIk::solve`] runs once per frame after the neck's parent holds its
//! final rotation. It always runs the neck solver, then takes one of two
//! paths:
//!
//! * no gaze target: the head follows its rotation goal (or rest) and is
//!   limited against the neck;
//! * gaze target: neck and head are aimed in turn at the target, then the
//!   eyes take up what is left.

use bevy::log::{debug, warn};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use fbik_core::config::{ModelTemplate, Settings};
use fbik_core::debug_values::DebugValues;
use fbik_core::error::SkeletonError;
use fbik_core::math::{basis_from_rotation, IK_EPSILON};
use fbik_core::skeleton::{BindPose, Skeleton};

use crate::eyes::{head_to_eye_offset, EyeModel, EyeSockets};
use crate::limits::HeadLimits;
use crate::rig::{HeadBones, HeadEffectors};

/// Rotation offsets fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadOffsets {
    /// `head_effector.default_rotation⁻¹ · head.default_rotation`.
    pub head_effector_to_world: UnitQuaternion<f32>,
    /// `head.default_rotation⁻¹ · left_eye.default_rotation`.
    pub head_to_left_eye: UnitQuaternion<f32>,
    pub head_to_right_eye: UnitQuaternion<f32>,
}

/// Rotations captured before the first write of a solve.
///
/// Only taken when the solver continues from the previous frame; in reset
/// mode blends start from rest instead.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrevFrame {
    pub neck: UnitQuaternion<f32>,
    pub head: UnitQuaternion<f32>,
    pub left_eye: UnitQuaternion<f32>,
    pub right_eye: UnitQuaternion<f32>,
}

/// The neck's parent as it stands this frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParentFrame {
    pub bind: BindPose,
    pub position: Vector3<f32>,
    /// World rotation in base convention.
    pub base_rotation: UnitQuaternion<f32>,
    /// Bind-to-world delta of the parent.
    pub basis: Matrix3<f32>,
    /// Parent frame in base convention.
    pub base_basis: Matrix3<f32>,
}

/// Head, neck and eyes solver for one rig.
#[derive(Debug, Clone)]
pub struct HeadIk {
    pub(crate) bones: HeadBones,
    pub(crate) limits: HeadLimits,
    pub(crate) offsets: HeadOffsets,
    pub(crate) eye_model: EyeModel,
    pub(crate) eyes_to_neck_pitch_rate: f32,
    pub(crate) eyes_to_head_yaw_rate: f32,
    pub(crate) eyes_to_head_pitch_rate: f32,
    pub(crate) reset_transforms: bool,
    pub(crate) debug_values: DebugValues,
}

impl HeadIk {
    /// Prepare a solver for `bones` of `skeleton`.
    ///
    /// Offsets are taken from the bind pose, so this must be rebuilt if the
    /// skeleton is.
    pub fn new(
        skeleton: &Skeleton,
        bones: HeadBones,
        effectors: &HeadEffectors,
        settings: &Settings,
    ) -> Result<Self, SkeletonError> {
        let head = skeleton
            .bind_pose(bones.head)
            .ok_or_else(|| SkeletonError::MissingBone(format!("#{}", bones.head.0)))?;
        if !skeleton.is_alive(bones.neck) {
            return Err(SkeletonError::MissingBone(format!("#{}", bones.neck.0)));
        }

        let offsets = HeadOffsets {
            head_effector_to_world: effectors.head.default_rotation().inverse()
                * head.default_rotation,
            head_to_left_eye: head_to_eye_offset(skeleton, bones.head, bones.left_eye),
            head_to_right_eye: head_to_eye_offset(skeleton, bones.head, bones.right_eye),
        };

        let eye_model = match settings.model_template {
            ModelTemplate::Generic => EyeModel::Generic,
            ModelTemplate::SocketBiped => {
                if bones.left_eye.is_none() || bones.right_eye.is_none() {
                    warn!("socket biped template used on a rig without both eye joints");
                }
                EyeModel::SocketBiped(EyeSockets::new(
                    skeleton.default_root_basis(),
                    &head.default_position,
                    &head.world_scale,
                ))
            }
        };

        Ok(Self {
            bones,
            limits: HeadLimits::from_settings(&settings.head_ik),
            offsets,
            eye_model,
            eyes_to_neck_pitch_rate: settings.head_ik.eyes_to_neck_pitch_rate,
            eyes_to_head_yaw_rate: settings.head_ik.eyes_to_head_yaw_rate,
            eyes_to_head_pitch_rate: settings.head_ik.eyes_to_head_pitch_rate,
            reset_transforms: settings.reset_transforms,
            debug_values: DebugValues::new(),
        })
    }

    pub const fn bones(&self) -> &HeadBones {
        &self.bones
    }

    pub const fn limits(&self) -> &HeadLimits {
        &self.limits
    }

    pub const fn offsets(&self) -> &HeadOffsets {
        &self.offsets
    }

    pub const fn eye_model(&self) -> &EyeModel {
        &self.eye_model
    }

    pub const fn reset_transforms(&self) -> bool {
        self.reset_transforms
    }

    pub fn set_reset_transforms(&mut self, reset: bool) {
        self.reset_transforms = reset;
    }

    /// Overrides for the eye constants.
    pub fn debug_values_mut(&mut self) -> &mut DebugValues {
        &mut self.debug_values
    }

    /// Solve one frame.
    ///
    /// Returns `false` without writing anything when a required joint (neck,
    /// head, or either one's parent) is missing or dead. Otherwise returns
    /// whether the pose was driven this frame.
    pub fn solve(&self, skeleton: &mut Skeleton, effectors: &HeadEffectors) -> bool {
        let Some(parent) = self.parent_frame(skeleton) else {
            debug!("head ik: required joint missing or dead, solve skipped");
            return false;
        };

        let head_position_weight = effectors.head.effective_position_weight();
        let head_rotation_weight = effectors.head.effective_rotation_weight();
        let eyes_position_weight = effectors.eyes.effective_position_weight();

        let prev = if self.reset_transforms {
            None
        } else {
            self.snapshot(skeleton)
        };

        self.solve_neck(
            skeleton,
            &parent,
            &effectors.head.world_position,
            head_position_weight,
            prev.as_ref(),
        );

        if eyes_position_weight <= IK_EPSILON {
            let written = self.resolve_head_only(
                skeleton,
                &effectors.head.world_rotation,
                head_rotation_weight,
                head_position_weight,
                prev.as_ref(),
            );
            return head_position_weight > IK_EPSILON || written;
        }

        self.solve_gaze(skeleton, &parent, &effectors.eyes, prev.as_ref());
        true
    }

    fn parent_frame(&self, skeleton: &Skeleton) -> Option<ParentFrame> {
        // `parent` only answers for alive bones
        let head_parent = skeleton.parent(self.bones.head)?;
        let neck_parent = skeleton.parent(self.bones.neck)?;
        if !skeleton.is_alive(head_parent) {
            return None;
        }

        let bind = skeleton.bind_pose(neck_parent)?;
        let position = skeleton.world_position(neck_parent)?;
        let rotation = skeleton.world_rotation(neck_parent)?;
        let basis = bind.delta_basis(&rotation);
        Some(ParentFrame {
            bind,
            position,
            base_rotation: bind.base_rotation(&rotation),
            basis,
            base_basis: basis * skeleton.default_root_basis(),
        })
    }

    fn snapshot(&self, skeleton: &Skeleton) -> Option<PrevFrame> {
        let eye = |id: Option<_>| {
            id.and_then(|id| skeleton.world_rotation(id))
                .unwrap_or_else(UnitQuaternion::identity)
        };
        Some(PrevFrame {
            neck: skeleton.world_rotation(self.bones.neck)?,
            head: skeleton.world_rotation(self.bones.head)?,
            left_eye: eye(self.bones.left_eye),
            right_eye: eye(self.bones.right_eye),
        })
    }
}

/// Base-convention frame of a bone currently at `world_rotation`.
pub(crate) fn base_basis(bind: &BindPose, world_rotation: &UnitQuaternion<f32>) -> Matrix3<f32> {
    basis_from_rotation(&bind.base_rotation(world_rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fbik_core::skeleton::BoneId;

    use crate::rig::HeadBoneNames;

    fn rig() -> (Skeleton, HeadBones, HeadEffectors) {
        let mut b = Skeleton::builder();
        let hips = b
            .add_bone("hips", None, Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity())
            .unwrap();
        let neck = b
            .add_bone("neck", Some(hips), Vector3::new(0.0, 1.5, 0.0), UnitQuaternion::identity())
            .unwrap();
        let head = b
            .add_bone("head", Some(neck), Vector3::new(0.0, 1.6, 0.0), UnitQuaternion::identity())
            .unwrap();
        b.add_bone("left_eye", Some(head), Vector3::new(-0.03, 1.7, 0.08), UnitQuaternion::identity())
            .unwrap();
        b.add_bone("right_eye", Some(head), Vector3::new(0.03, 1.7, 0.08), UnitQuaternion::identity())
            .unwrap();
        let skel = b.build().unwrap();
        let bones = HeadBones::resolve(&skel, &HeadBoneNames::default()).unwrap();
        let effectors = HeadEffectors::from_skeleton(&skel, &bones).unwrap();
        (skel, bones, effectors)
    }

    #[test]
    fn offsets_are_identity_on_aligned_rig() {
        let (skel, bones, effectors) = rig();
        let ik = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap();
        assert_relative_eq!(ik.offsets().head_effector_to_world.angle(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(ik.offsets().head_to_left_eye.angle(), 0.0, epsilon = 1e-6);
        assert_eq!(*ik.eye_model(), EyeModel::Generic);
        assert!(ik.reset_transforms());
    }

    #[test]
    fn eye_offset_captures_bind_difference() {
        let mut b = Skeleton::builder();
        let hips = b
            .add_bone("hips", None, Vector3::zeros(), UnitQuaternion::identity())
            .unwrap();
        let neck = b
            .add_bone("neck", Some(hips), Vector3::y(), UnitQuaternion::identity())
            .unwrap();
        let head_rot = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
        let head = b
            .add_bone("head", Some(neck), Vector3::new(0.0, 1.1, 0.0), head_rot)
            .unwrap();
        b.add_bone("left_eye", Some(head), Vector3::new(-0.03, 1.2, 0.08), UnitQuaternion::identity())
            .unwrap();
        let skel = b.build().unwrap();
        let bones = HeadBones::resolve(&skel, &HeadBoneNames::default()).unwrap();
        let effectors = HeadEffectors::from_skeleton(&skel, &bones).unwrap();
        let ik = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap();

        let expected = head_rot.inverse();
        assert_relative_eq!(ik.offsets().head_to_left_eye.angle_to(&expected), 0.0, epsilon = 1e-6);
        assert_relative_eq!(ik.offsets().head_to_right_eye.angle(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(ik.offsets().head_effector_to_world.angle_to(&head_rot), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn socket_template_builds_sockets() {
        let (skel, bones, effectors) = rig();
        let settings = Settings {
            model_template: ModelTemplate::SocketBiped,
            ..Settings::default()
        };
        let ik = HeadIk::new(&skel, bones, &effectors, &settings).unwrap();
        let sockets = ik.eye_model().sockets().unwrap();
        assert!(sockets.left.x < 0.0 && sockets.right.x > 0.0);
    }

    #[test]
    fn new_fails_on_dead_head() {
        let (mut skel, bones, effectors) = rig();
        skel.kill(bones.head);
        let err = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap_err();
        assert!(matches!(err, SkeletonError::MissingBone(_)));
    }

    #[test]
    fn solve_requires_neck_parent() {
        let (mut skel, bones, effectors) = rig();
        let ik = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap();
        skel.kill(BoneId(0));
        assert!(!ik.solve(&mut skel, &effectors));
    }

    #[test]
    fn idle_reset_solve_reports_written() {
        let (mut skel, bones, effectors) = rig();
        let ik = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap();
        assert!(ik.solve(&mut skel, &effectors));
    }

    #[test]
    fn idle_continuing_solve_reports_nothing_written() {
        let (mut skel, bones, effectors) = rig();
        let settings = Settings {
            reset_transforms: false,
            ..Settings::default()
        };
        let ik = HeadIk::new(&skel, bones, &effectors, &settings).unwrap();
        assert!(!ik.solve(&mut skel, &effectors));
    }

    #[test]
    fn gaze_solve_reports_written() {
        let (mut skel, bones, mut effectors) = rig();
        let mut ik = HeadIk::new(&skel, bones, &effectors, &Settings::default()).unwrap();
        ik.set_reset_transforms(false);
        effectors.look_at(Vector3::new(0.5, 1.7, 2.0), 0.3);
        assert!(ik.solve(&mut skel, &effectors));
    }
}
