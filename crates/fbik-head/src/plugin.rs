//! Bevy ECS integration for the head solver.
//!
//! Provides [`HeadIkPlugin`] which solves every registered rig once per
//! frame.
//!
//! # Usage
//!
//! 1. Add [`FbikCorePlugin`](fbik_core::FbikCorePlugin) and [`HeadIkPlugin`]
//!    to your app.
//! 2. Register rigs with [`HeadIkRigMap::insert`] or
//!    [`HeadIkRigMap::build_and_insert`].
//! 3. Set goals through the map's effector setters.
//!
//! The solve system runs in [`FbikSet::Solve`], after upstream solvers have
//! posed the neck's parent in [`FbikSet::Pose`].

use std::collections::HashMap;

use bevy::log::warn;
use bevy::prelude::*;
use nalgebra::{UnitQuaternion, Vector3};

use fbik_core::config::Settings;
use fbik_core::description::RigDescription;
use fbik_core::error::SkeletonError;
use fbik_core::skeleton::Skeleton;
use fbik_core::{FbikSet, RigId};

use crate::rig::{HeadBoneNames, HeadBones, HeadEffectors};
use crate::solver::HeadIk;

/// Bevy plugin that runs the head solver each frame.
pub struct HeadIkPlugin;

impl Plugin for HeadIkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeadIkRigMap>()
            .add_systems(Update, head_ik_solve_system.in_set(FbikSet::Solve));
    }
}

/// A rig driven by the head solver.
#[derive(Debug, Clone)]
pub struct HeadIkRig {
    pub skeleton: Skeleton,
    pub effectors: HeadEffectors,
    pub solver: HeadIk,
    /// Result of the most recent solve. `None` before the first frame.
    pub last_result: Option<bool>,
}

impl HeadIkRig {
    /// Build a rig from a description, resolving the head joints by name.
    pub fn from_description(
        description: &RigDescription,
        names: &HeadBoneNames,
        settings: &Settings,
    ) -> Result<Self, SkeletonError> {
        let skeleton = description.build()?;
        let bones = HeadBones::resolve(&skeleton, names)?;
        let effectors = HeadEffectors::from_skeleton(&skeleton, &bones)?;
        let solver = HeadIk::new(&skeleton, bones, &effectors, settings)?;
        Ok(Self {
            skeleton,
            effectors,
            solver,
            last_result: None,
        })
    }

    /// Solve one frame and record the result.
    pub fn solve(&mut self) -> bool {
        let result = self.solver.solve(&mut self.skeleton, &self.effectors);
        self.last_result = Some(result);
        result
    }
}

/// Resource mapping [`RigId`] to head solver rigs.
#[derive(Resource, Debug, Default)]
pub struct HeadIkRigMap {
    rigs: HashMap<RigId, HeadIkRig>,
}

impl HeadIkRigMap {
    /// Insert a pre-built rig.
    pub fn insert(&mut self, rig_id: RigId, rig: HeadIkRig) {
        self.rigs.insert(rig_id, rig);
    }

    /// Build a rig from a description and register it.
    ///
    /// Returns `true` if the rig was built and inserted.
    pub fn build_and_insert(
        &mut self,
        rig_id: RigId,
        description: &RigDescription,
        names: &HeadBoneNames,
        settings: &Settings,
    ) -> bool {
        match HeadIkRig::from_description(description, names, settings) {
            Ok(rig) => {
                self.rigs.insert(rig_id, rig);
                true
            }
            Err(e) => {
                warn!("head ik rig {:?} ({}) not registered: {e}", rig_id, description.name);
                false
            }
        }
    }

    pub fn remove(&mut self, rig_id: RigId) -> Option<HeadIkRig> {
        self.rigs.remove(&rig_id)
    }

    pub fn get(&self, rig_id: RigId) -> Option<&HeadIkRig> {
        self.rigs.get(&rig_id)
    }

    pub fn get_mut(&mut self, rig_id: RigId) -> Option<&mut HeadIkRig> {
        self.rigs.get_mut(&rig_id)
    }

    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }

    /// Aim the neck at `target`.
    pub fn set_head_position_goal(&mut self, rig_id: RigId, target: Vector3<f32>, weight: f32) {
        if let Some(rig) = self.rigs.get_mut(&rig_id) {
            rig.effectors.head.set_position_goal(target, weight);
        }
    }

    /// Orient the head toward `target`.
    pub fn set_head_rotation_goal(
        &mut self,
        rig_id: RigId,
        target: UnitQuaternion<f32>,
        weight: f32,
    ) {
        if let Some(rig) = self.rigs.get_mut(&rig_id) {
            rig.effectors.head.set_rotation_goal(target, weight);
        }
    }

    /// Look at `target`.
    pub fn set_eyes_position_goal(&mut self, rig_id: RigId, target: Vector3<f32>, weight: f32) {
        if let Some(rig) = self.rigs.get_mut(&rig_id) {
            rig.effectors.look_at(target, weight);
        }
    }

    /// Disable every goal of a rig.
    pub fn clear_goals(&mut self, rig_id: RigId) {
        if let Some(rig) = self.rigs.get_mut(&rig_id) {
            rig.effectors.clear();
        }
    }
}

/// Solve every registered rig.
pub fn head_ik_solve_system(mut rigs: ResMut<HeadIkRigMap>) {
    for rig in rigs.rigs.values_mut() {
        rig.solve();
    }
}
