//! Shared foundations for the fbik full-body IK solvers.
//!
//! Provides the skeleton arena, effectors, rig settings, the geometry
//! primitives the solvers are written against, and the Bevy system sets
//! solvers schedule into.
//!
//! # Frame ordering
//!
//! ```text
//! FbikSet::Pose ──► FbikSet::Solve ──► FbikSet::Publish
//! ```
//!
//! Upstream solvers (spine, arms) write their joints in `Pose`, so that
//! parents hold their final rotation for the frame before a sub-solver in
//! `Solve` reads them.

pub mod config;
pub mod debug_values;
pub mod description;
pub mod effector;
pub mod error;
pub mod math;
pub mod skeleton;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RigId
// ---------------------------------------------------------------------------

/// Identifier of a rig instance registered with a solver plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RigId(pub u32);

// ---------------------------------------------------------------------------
// FbikSet
// ---------------------------------------------------------------------------

/// Per-frame ordering of IK work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FbikSet {
    /// Animation and upstream solvers write parent joints.
    Pose,
    /// Sub-solvers read parents and write their own joints.
    Solve,
    /// Consumers read the solved pose.
    Publish,
}

// ---------------------------------------------------------------------------
// FbikCorePlugin
// ---------------------------------------------------------------------------

/// Inserts default [`Settings`](config::Settings) and chains the
/// [`FbikSet`] system sets in `Update`.
pub struct FbikCorePlugin;

impl Plugin for FbikCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::Settings>().configure_sets(
            Update,
            (FbikSet::Pose, FbikSet::Solve, FbikSet::Publish).chain(),
        );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        FbikCorePlugin, FbikSet, RigId,
        config::{HeadIkSettings, ModelTemplate, Settings},
        debug_values::DebugValues,
        description::RigDescription,
        effector::Effector,
        error::{ConfigError, FbikError, SkeletonError},
        skeleton::{BindPose, Bone, BoneId, Skeleton},
    };
}
