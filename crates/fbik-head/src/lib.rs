//! Head, neck and eyes IK for fbik rigs.
//!
//! Given a skeleton posed up to the neck's parent, [`HeadIk`] orients the
//! neck, head and eye joints toward the head and gaze effectors within
//! anatomical limits, blending smoothly as effector weights fall to zero.
//!
//! # Modules
//!
//! - [`limits`] - limit angles and the head rotation limiter
//! - [`rig`] - the joints and effectors a solver works on
//! - [`eyes`] - eye models and their tuning tables
//! - [`solver`] - [`HeadIk`] and its per-frame entry point
//! - [`plugin`] - Bevy integration

mod gaze;
mod head;
mod neck;

pub mod eyes;
pub mod limits;
pub mod plugin;
pub mod rig;
pub mod solver;

pub use plugin::{HeadIkPlugin, HeadIkRig, HeadIkRigMap};
pub use solver::HeadIk;

pub mod prelude {
    pub use crate::{
        HeadIk, HeadIkPlugin, HeadIkRig, HeadIkRigMap,
        eyes::{EyeModel, EyeSockets, EyeTuning},
        limits::{HeadLimits, LimitTheta, limit_head_rotation},
        rig::{HeadBoneNames, HeadBones, HeadEffectors},
        solver::HeadOffsets,
    };
}
