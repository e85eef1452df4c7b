//! Pose capture and assertions.

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};

use fbik_core::skeleton::Skeleton;

/// World transforms of every bone, `None` for dead bones.
pub type PoseSnapshot = Vec<Option<(Vector3<f32>, UnitQuaternion<f32>)>>;

/// Capture the current world transform of every bone.
pub fn capture_pose(skeleton: &Skeleton) -> PoseSnapshot {
    (0..skeleton.len())
        .map(|i| {
            let id = fbik_core::skeleton::BoneId(i);
            skeleton.world_position(id).zip(skeleton.world_rotation(id))
        })
        .collect()
}

/// Assert two rotations differ by at most `epsilon` radians.
///
/// # Panics
///
/// If they differ by more.
pub fn assert_rotation_near(actual: &UnitQuaternion<f32>, expected: &UnitQuaternion<f32>, epsilon: f32) {
    let angle = actual.angle_to(expected);
    assert!(
        angle <= epsilon,
        "rotations differ by {angle} rad (> {epsilon}): {actual:?} vs {expected:?}"
    );
}

/// Assert every alive bone sits at its bind transform.
///
/// # Panics
///
/// If any bone is off its bind pose by more than `epsilon`.
pub fn assert_at_bind_pose(skeleton: &Skeleton, epsilon: f32) {
    for bone in skeleton.bones().iter().filter(|b| b.is_alive()) {
        let id = skeleton.find(bone.name()).expect("bone is registered by name");
        let bind = bone.bind();
        let position = skeleton.world_position(id).expect("alive bone has a position");
        let rotation = skeleton.world_rotation(id).expect("alive bone has a rotation");
        assert_relative_eq!(position, bind.default_position, epsilon = epsilon);
        assert_rotation_near(&rotation, &bind.default_rotation, epsilon);
    }
}
