//! Integration test: reset mode and weight blending on the humanoid rig.
//!
//! Checks that:
//! 1. With every weight at zero and reset mode on, the whole rig returns to
//!    its bind pose, for both eye models and on a turned rig, every frame
//! 2. Weights within epsilon of 0 or 1 give the rest pose or the goal exactly
//! 3. Intermediate weights land on the shortest arc between the two
//! 4. A full-weight head rotation goal ignores the previous frame

use std::f32::consts::FRAC_PI_2;

use nalgebra::{UnitQuaternion, Vector3};

use fbik_core::config::{ModelTemplate, Settings};
use fbik_core::math::IK_EPSILON;
use fbik_core::skeleton::Skeleton;
use fbik_head::prelude::*;
use fbik_test_utils::{
    assert_at_bind_pose, assert_rotation_near, humanoid, humanoid_description,
    humanoid_with_head_scale, humanoid_with_root_yaw,
};

fn setup(skeleton: &Skeleton, settings: &Settings) -> (HeadIk, HeadEffectors) {
    let bones = HeadBones::resolve(skeleton, &HeadBoneNames::default()).unwrap();
    let effectors = HeadEffectors::from_skeleton(skeleton, &bones).unwrap();
    let ik = HeadIk::new(skeleton, bones, &effectors, settings).unwrap();
    (ik, effectors)
}

fn socket_settings() -> Settings {
    Settings {
        model_template: ModelTemplate::SocketBiped,
        ..Settings::default()
    }
}

fn yaw(deg: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), deg.to_radians())
}

/// Knock the head chain off its bind pose.
fn disturb(skeleton: &mut Skeleton, ik: &HeadIk, move_eyes: bool) {
    let bones = *ik.bones();
    skeleton.set_world_rotation(
        bones.neck,
        UnitQuaternion::from_euler_angles(0.2, -0.1, 0.05),
    );
    skeleton.set_world_rotation(
        bones.head,
        UnitQuaternion::from_euler_angles(-0.1, 0.4, 0.0),
    );
    for eye in bones.eyes() {
        skeleton.set_world_rotation(eye, UnitQuaternion::from_euler_angles(0.0, 0.3, 0.1));
        if move_eyes {
            let p = skeleton.world_position(eye).unwrap();
            skeleton.set_world_position(eye, p + Vector3::new(0.01, -0.005, 0.002));
        }
    }
}

#[test]
fn idle_reset_returns_generic_rig_to_bind_pose() {
    let mut skel = humanoid();
    let (ik, effectors) = setup(&skel, &Settings::default());
    for _ in 0..3 {
        disturb(&mut skel, &ik, false);
        assert!(ik.solve(&mut skel, &effectors));
        assert_at_bind_pose(&skel, 1e-5);
    }
}

#[test]
fn idle_reset_returns_socket_rig_to_bind_pose() {
    let mut skel = humanoid();
    let (ik, effectors) = setup(&skel, &socket_settings());
    for _ in 0..3 {
        disturb(&mut skel, &ik, true);
        assert!(ik.solve(&mut skel, &effectors));
        assert_at_bind_pose(&skel, 1e-5);
    }
}

#[test]
fn idle_reset_on_turned_rig() {
    let mut skel = humanoid_with_root_yaw(FRAC_PI_2);
    let (ik, effectors) = setup(&skel, &socket_settings());
    disturb(&mut skel, &ik, true);
    ik.solve(&mut skel, &effectors);
    assert_at_bind_pose(&skel, 1e-5);
}

#[test]
fn idle_reset_on_scaled_head() {
    let mut skel = humanoid_with_head_scale(Vector3::new(1.2, 0.9, 1.0));
    let (ik, effectors) = setup(&skel, &socket_settings());
    disturb(&mut skel, &ik, true);
    ik.solve(&mut skel, &effectors);
    assert_at_bind_pose(&skel, 1e-5);
}

#[test]
fn head_rotation_blend_endpoints_are_exact() {
    let goal = yaw(40.0);
    let cases = [
        (0.0, yaw(0.0)),
        (IK_EPSILON * 0.5, yaw(0.0)),
        (1.0 - IK_EPSILON * 0.5, goal),
        (1.0, goal),
    ];
    for (weight, expected) in cases {
        let mut skel = humanoid();
        let (ik, mut effectors) = setup(&skel, &Settings::default());
        effectors.head.set_rotation_goal(goal, weight);
        ik.solve(&mut skel, &effectors);
        let head = skel.world_rotation(ik.bones().head).unwrap();
        assert_rotation_near(&head, &expected, 1e-5);
    }
}

#[test]
fn head_rotation_blend_midpoint_is_on_shortest_arc() {
    let mut skel = humanoid();
    let (ik, mut effectors) = setup(&skel, &Settings::default());
    // Same goal, opposite quaternion sign
    let goal = UnitQuaternion::new_unchecked(-yaw(40.0).into_inner());
    effectors.head.set_rotation_goal(goal, 0.5);
    ik.solve(&mut skel, &effectors);

    let head = skel.world_rotation(ik.bones().head).unwrap();
    assert_rotation_near(&head, &yaw(20.0), 1e-4);
}

#[test]
fn neck_position_blend_follows_weight() {
    let lean = 0.2f32;
    let target = Vector3::new(0.0, 1.5 + 0.1 * lean.cos(), 0.1 * lean.sin());
    let cases = [
        (0.0, 0.0),
        (IK_EPSILON * 0.5, 0.0),
        (0.5, lean * 0.5),
        (1.0 - IK_EPSILON * 0.5, lean),
        (1.0, lean),
    ];
    for (weight, expected) in cases {
        let mut skel = humanoid();
        let (ik, mut effectors) = setup(&skel, &Settings::default());
        effectors.head.set_position_goal(target, weight);
        ik.solve(&mut skel, &effectors);
        let neck = skel.world_rotation(ik.bones().neck).unwrap();
        let expected = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), expected);
        assert_rotation_near(&neck, &expected, 1e-4);
    }
}

#[test]
fn full_weight_head_goal_ignores_previous_frame() {
    // Head bound with a tilt so the effector offset is not the identity
    let mut desc = humanoid_description();
    let tilt = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
    let q = tilt.into_inner();
    for bone in desc.bones.iter_mut().filter(|b| b.name == "head") {
        bone.rotation = [q.i, q.j, q.k, q.w];
    }
    let settings = Settings {
        reset_transforms: false,
        ..Settings::default()
    };
    let goal = yaw(20.0);

    let mut results = Vec::new();
    let previous_heads = [
        yaw(-30.0) * tilt,
        UnitQuaternion::from_euler_angles(0.2, 0.1, 0.0) * tilt,
    ];
    for previous in previous_heads {
        let mut skel = desc.build().unwrap();
        let (ik, mut effectors) = setup(&skel, &settings);
        skel.set_world_rotation(ik.bones().head, previous);
        effectors.head.set_rotation_goal(goal, 1.0);
        assert!(ik.solve(&mut skel, &effectors));
        let head = skel.world_rotation(ik.bones().head).unwrap();
        assert_rotation_near(&head, &(goal * ik.offsets().head_effector_to_world), 1e-5);
        results.push(head);
    }
    assert_rotation_near(&results[0], &results[1], 1e-6);
}
