//! Humanoid rig fixtures.
//!
//! The humanoid faces +Z with +Y up: hips → spine → chest → neck → head,
//! with both eyes parented to the head.

use nalgebra::{UnitQuaternion, Vector3};

use fbik_core::description::{parse_string, RigDescription};
use fbik_core::skeleton::Skeleton;

/// Humanoid upper body at identity bind rotations.
pub const HUMANOID_RIG: &str = r#"
name = "humanoid"

[[bones]]
name = "hips"
position = [0.0, 1.0, 0.0]

[[bones]]
name = "spine"
parent = "hips"
position = [0.0, 1.2, 0.0]

[[bones]]
name = "chest"
parent = "spine"
position = [0.0, 1.35, 0.0]

[[bones]]
name = "neck"
parent = "chest"
position = [0.0, 1.5, 0.0]

[[bones]]
name = "head"
parent = "neck"
position = [0.0, 1.6, 0.0]

[[bones]]
name = "left_eye"
parent = "head"
position = [-0.03, 1.7, 0.08]

[[bones]]
name = "right_eye"
parent = "head"
position = [0.03, 1.7, 0.08]
"#;

/// Bind position of the point between the eyes.
pub const EYES_CENTER: Vector3<f32> = Vector3::new(0.0, 1.7, 0.08);

/// Parsed [`HUMANOID_RIG`].
///
/// # Panics
///
/// Never for the bundled description.
pub fn humanoid_description() -> RigDescription {
    parse_string(HUMANOID_RIG).expect("bundled humanoid rig parses")
}

/// The humanoid skeleton.
///
/// # Panics
///
/// Never for the bundled description.
pub fn humanoid() -> Skeleton {
    humanoid_description()
        .build()
        .expect("bundled humanoid rig builds")
}

/// The humanoid turned about +Y by `yaw` radians around the origin, bind
/// rotations included.
///
/// # Panics
///
/// Never for the bundled description.
pub fn humanoid_with_root_yaw(yaw: f32) -> Skeleton {
    let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw);
    let mut desc = humanoid_description();
    desc.name = "humanoid_turned".into();
    for bone in &mut desc.bones {
        let p = turn * Vector3::from(bone.position);
        bone.position = [p.x, p.y, p.z];
        let q = turn.into_inner();
        bone.rotation = [q.i, q.j, q.k, q.w];
    }
    desc.build().expect("turned humanoid rig builds")
}

/// The humanoid with a non-uniform lossy scale on the head and eyes.
///
/// # Panics
///
/// Never for the bundled description.
pub fn humanoid_with_head_scale(scale: Vector3<f32>) -> Skeleton {
    let mut desc = humanoid_description();
    desc.name = "humanoid_scaled_head".into();
    for bone in &mut desc.bones {
        if matches!(bone.name.as_str(), "head" | "left_eye" | "right_eye") {
            bone.scale = [scale.x, scale.y, scale.z];
        }
    }
    desc.build().expect("scaled humanoid rig builds")
}
