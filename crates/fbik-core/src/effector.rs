//! Effectors: weighted position / rotation goals for a solver.

use nalgebra::{UnitQuaternion, Vector3};

/// A target a solver tries to satisfy.
///
/// Position and rotation goals are enabled and weighted independently.
/// Solvers only read effectors; the rig owning them updates the targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Effector {
    /// Target position in world space.
    pub world_position: Vector3<f32>,
    /// Target rotation in world space.
    pub world_rotation: UnitQuaternion<f32>,
    pub position_enabled: bool,
    position_weight: f32,
    pub rotation_enabled: bool,
    rotation_weight: f32,
    default_position: Vector3<f32>,
    default_rotation: UnitQuaternion<f32>,
}

impl Effector {
    /// Create a disabled effector resting at its bind transform.
    pub fn new(default_position: Vector3<f32>, default_rotation: UnitQuaternion<f32>) -> Self {
        Self {
            world_position: default_position,
            world_rotation: default_rotation,
            position_enabled: false,
            position_weight: 1.0,
            rotation_enabled: false,
            rotation_weight: 1.0,
            default_position,
            default_rotation,
        }
    }

    /// Bind-pose position, used to compute constant offsets at setup.
    pub const fn default_position(&self) -> &Vector3<f32> {
        &self.default_position
    }

    /// Bind-pose rotation, used to compute constant offsets at setup.
    pub const fn default_rotation(&self) -> &UnitQuaternion<f32> {
        &self.default_rotation
    }

    pub const fn position_weight(&self) -> f32 {
        self.position_weight
    }

    pub const fn rotation_weight(&self) -> f32 {
        self.rotation_weight
    }

    /// Set the position weight, clamped to `[0, 1]`.
    pub fn set_position_weight(&mut self, weight: f32) {
        self.position_weight = weight.clamp(0.0, 1.0);
    }

    /// Set the rotation weight, clamped to `[0, 1]`.
    pub fn set_rotation_weight(&mut self, weight: f32) {
        self.rotation_weight = weight.clamp(0.0, 1.0);
    }

    /// Enable the position goal at `weight`, aiming at `target`.
    pub fn set_position_goal(&mut self, target: Vector3<f32>, weight: f32) {
        self.world_position = target;
        self.position_enabled = true;
        self.set_position_weight(weight);
    }

    /// Enable the rotation goal at `weight`.
    pub fn set_rotation_goal(&mut self, target: UnitQuaternion<f32>, weight: f32) {
        self.world_rotation = target;
        self.rotation_enabled = true;
        self.set_rotation_weight(weight);
    }

    /// Position weight, or 0 when the position goal is disabled.
    pub fn effective_position_weight(&self) -> f32 {
        if self.position_enabled {
            self.position_weight
        } else {
            0.0
        }
    }

    /// Rotation weight, or 0 when the rotation goal is disabled.
    pub fn effective_rotation_weight(&self) -> f32 {
        if self.rotation_enabled {
            self.rotation_weight
        } else {
            0.0
        }
    }

    /// Disable both goals and return the targets to the bind transform.
    pub fn clear(&mut self) {
        self.world_position = self.default_position;
        self.world_rotation = self.default_rotation;
        self.position_enabled = false;
        self.rotation_enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_effector_is_inactive() {
        let e = Effector::new(Vector3::new(0.0, 1.6, 0.1), UnitQuaternion::identity());
        assert!(e.effective_position_weight().abs() < f32::EPSILON);
        assert!(e.effective_rotation_weight().abs() < f32::EPSILON);
        assert_eq!(e.world_position, *e.default_position());
    }

    #[test]
    fn effective_weight_follows_enabled_flag() {
        let mut e = Effector::new(Vector3::zeros(), UnitQuaternion::identity());
        e.set_position_weight(0.25);
        assert!(e.effective_position_weight().abs() < f32::EPSILON);
        e.position_enabled = true;
        assert!((e.effective_position_weight() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn weights_are_clamped() {
        let mut e = Effector::new(Vector3::zeros(), UnitQuaternion::identity());
        e.set_rotation_goal(UnitQuaternion::identity(), 3.0);
        assert!((e.rotation_weight() - 1.0).abs() < f32::EPSILON);
        e.set_position_goal(Vector3::x(), -0.5);
        assert!(e.position_weight().abs() < f32::EPSILON);
    }

    #[test]
    fn clear_restores_defaults() {
        let mut e = Effector::new(Vector3::y(), UnitQuaternion::identity());
        e.set_position_goal(Vector3::new(1.0, 2.0, 3.0), 1.0);
        e.set_rotation_goal(UnitQuaternion::from_euler_angles(0.1, 0.0, 0.0), 1.0);
        e.clear();
        assert!(!e.position_enabled);
        assert!(!e.rotation_enabled);
        assert_eq!(e.world_position, Vector3::y());
        assert_eq!(e.world_rotation, UnitQuaternion::identity());
    }
}
