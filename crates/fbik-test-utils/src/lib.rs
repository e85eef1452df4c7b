//! Shared test fixtures and utilities for fbik crates.
//!
//! Provides humanoid rig descriptions, Bevy test app builders and pose
//! assertions.

pub mod app;
pub mod pose;
pub mod rig;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{minimal_test_app, test_app_with};
pub use pose::{assert_at_bind_pose, assert_rotation_near, capture_pose, PoseSnapshot};
pub use rig::{humanoid, humanoid_description, humanoid_with_head_scale, humanoid_with_root_yaw};
