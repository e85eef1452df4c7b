//! Skeleton arena: bones addressed by stable [`BoneId`]s.
//!
//! Each bone records its parent as an index, never an owning pointer, and
//! keeps a list of children so that world-space writes can carry the
//! subtree along (rotating the neck moves the head and eyes with it).
//!
//! A bone can be marked dead with [`Skeleton::kill`] when the scene object
//! behind it is gone. Dead bones read as `None` and ignore writes.

use std::collections::HashMap;

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::error::SkeletonError;
use crate::math::{basis_from_rotation, basis_lock_y, renormalize};

// ---------------------------------------------------------------------------
// BoneId
// ---------------------------------------------------------------------------

/// Stable index of a bone within its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

// ---------------------------------------------------------------------------
// BindPose
// ---------------------------------------------------------------------------

/// Immutable bind-pose data of a bone, fixed at skeleton construction.
///
/// "Base" orientation is the rig convention (the root's bind frame: X right,
/// Y up, Z forward). `world = base · base_to_world` for any bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindPose {
    /// World position in the bind pose.
    pub default_position: Vector3<f32>,
    /// World rotation in the bind pose.
    pub default_rotation: UnitQuaternion<f32>,
    /// Lossy world scale in the bind pose.
    pub world_scale: Vector3<f32>,
    /// Bind world frame whose Y axis points at the bone's first child.
    pub local_axis_basis: Matrix3<f32>,
    pub base_to_world: UnitQuaternion<f32>,
    pub world_to_base: UnitQuaternion<f32>,
    pub base_to_world_basis: Matrix3<f32>,
    /// `local_axis_basis⁻¹ · default_rotation`.
    pub bone_to_world_basis: Matrix3<f32>,
}

impl BindPose {
    /// World rotation of this bone resting under a parent whose base-space
    /// rotation is `parent_base_rotation`.
    pub fn rest_rotation(&self, parent_base_rotation: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
        parent_base_rotation * self.base_to_world
    }

    /// Convert a world rotation of this bone into base space.
    pub fn base_rotation(&self, world_rotation: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
        world_rotation * self.world_to_base
    }

    /// Rotation taking the bind pose to `world_rotation`, as a basis.
    pub fn delta_basis(&self, world_rotation: &UnitQuaternion<f32>) -> Matrix3<f32> {
        basis_from_rotation(&(world_rotation * self.default_rotation.inverse()))
    }
}

// ---------------------------------------------------------------------------
// Bone
// ---------------------------------------------------------------------------

/// A joint of the skeleton: bind pose plus live world transform.
#[derive(Debug, Clone)]
pub struct Bone {
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    bind: BindPose,
    world_position: Vector3<f32>,
    world_rotation: UnitQuaternion<f32>,
    alive: bool,
}

impl Bone {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }

    pub const fn bind(&self) -> &BindPose {
        &self.bind
    }

    pub const fn is_alive(&self) -> bool {
        self.alive
    }
}

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

/// Arena of bones with hierarchical world transforms.
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    names: HashMap<String, BoneId>,
    root: BoneId,
    default_root_rotation: UnitQuaternion<f32>,
    default_root_basis: Matrix3<f32>,
    default_root_basis_inv: Matrix3<f32>,
}

impl Skeleton {
    /// Start building a skeleton.
    pub fn builder() -> SkeletonBuilder {
        SkeletonBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub const fn root(&self) -> BoneId {
        self.root
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    /// Look up a bone by name.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.names.get(name).copied()
    }

    /// Look up a bone by name, failing with [`SkeletonError::MissingBone`].
    pub fn bone_id(&self, name: &str) -> Result<BoneId, SkeletonError> {
        self.find(name)
            .ok_or_else(|| SkeletonError::MissingBone(name.to_owned()))
    }

    /// Bind rotation of the root bone (the rig's base frame).
    pub const fn default_root_rotation(&self) -> &UnitQuaternion<f32> {
        &self.default_root_rotation
    }

    pub const fn default_root_basis(&self) -> &Matrix3<f32> {
        &self.default_root_basis
    }

    pub const fn default_root_basis_inv(&self) -> &Matrix3<f32> {
        &self.default_root_basis_inv
    }

    fn live(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0).filter(|b| b.alive)
    }

    pub fn is_alive(&self, id: BoneId) -> bool {
        self.live(id).is_some()
    }

    /// Parent of an alive bone.
    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.live(id).and_then(|b| b.parent)
    }

    /// Bind pose of an alive bone.
    pub fn bind_pose(&self, id: BoneId) -> Option<BindPose> {
        self.live(id).map(|b| b.bind)
    }

    pub fn world_position(&self, id: BoneId) -> Option<Vector3<f32>> {
        self.live(id).map(|b| b.world_position)
    }

    pub fn world_rotation(&self, id: BoneId) -> Option<UnitQuaternion<f32>> {
        self.live(id).map(|b| b.world_rotation)
    }

    /// Set a bone's world rotation, rotating its alive descendants about the
    /// bone's position. Returns `false` (and writes nothing) for dead bones.
    pub fn set_world_rotation(&mut self, id: BoneId, rotation: UnitQuaternion<f32>) -> bool {
        let Some(bone) = self.live(id) else {
            return false;
        };
        let delta = rotation * bone.world_rotation.inverse();
        let pivot = bone.world_position;
        let mut stack = bone.children.clone();

        self.bones[id.0].world_rotation = rotation;
        while let Some(child) = stack.pop() {
            let c = &mut self.bones[child.0];
            if c.alive {
                c.world_position = pivot + delta * (c.world_position - pivot);
                c.world_rotation = renormalize(&(delta * c.world_rotation));
            }
            stack.extend(c.children.iter().copied());
        }
        true
    }

    /// Set a bone's world position, translating its alive descendants with it.
    /// Returns `false` (and writes nothing) for dead bones.
    pub fn set_world_position(&mut self, id: BoneId, position: Vector3<f32>) -> bool {
        let Some(bone) = self.live(id) else {
            return false;
        };
        let offset = position - bone.world_position;
        let mut stack = bone.children.clone();

        self.bones[id.0].world_position = position;
        while let Some(child) = stack.pop() {
            let c = &mut self.bones[child.0];
            if c.alive {
                c.world_position += offset;
            }
            stack.extend(c.children.iter().copied());
        }
        true
    }

    /// Mark a bone dead. Returns `false` if it was already dead or unknown.
    pub fn kill(&mut self, id: BoneId) -> bool {
        match self.bones.get_mut(id.0) {
            Some(bone) if bone.alive => {
                bone.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Restore every alive bone to its bind transform.
    pub fn reset_to_bind_pose(&mut self) {
        for bone in self.bones.iter_mut().filter(|b| b.alive) {
            bone.world_position = bone.bind.default_position;
            bone.world_rotation = bone.bind.default_rotation;
        }
    }
}

// ---------------------------------------------------------------------------
// SkeletonBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PendingBone {
    name: String,
    parent: Option<BoneId>,
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
    scale: Vector3<f32>,
}

/// Incremental skeleton construction. Parents must be added before their
/// children, so ids handed out are always valid parents.
#[derive(Debug, Clone, Default)]
pub struct SkeletonBuilder {
    bones: Vec<PendingBone>,
    names: HashMap<String, BoneId>,
}

impl SkeletonBuilder {
    /// Add a bone with its bind world position and rotation.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Result<BoneId, SkeletonError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(SkeletonError::DuplicateBone(name));
        }
        if let Some(parent) = parent {
            if parent.0 >= self.bones.len() {
                return Err(SkeletonError::UnknownParent {
                    bone: name,
                    parent: format!("#{}", parent.0),
                });
            }
        }
        let id = BoneId(self.bones.len());
        self.names.insert(name.clone(), id);
        self.bones.push(PendingBone {
            name,
            parent,
            position,
            rotation,
            scale: Vector3::new(1.0, 1.0, 1.0),
        });
        Ok(id)
    }

    /// Set the lossy world scale of a previously added bone.
    pub fn set_scale(&mut self, id: BoneId, scale: Vector3<f32>) {
        if let Some(bone) = self.bones.get_mut(id.0) {
            bone.scale = scale;
        }
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.names.get(name).copied()
    }

    /// Finish construction, deriving every bone's bind frames.
    pub fn build(self) -> Result<Skeleton, SkeletonError> {
        let root = self
            .bones
            .iter()
            .position(|b| b.parent.is_none())
            .map(BoneId)
            .ok_or(SkeletonError::NoRootBone)?;

        let mut children: Vec<Vec<BoneId>> = vec![Vec::new(); self.bones.len()];
        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                children[parent.0].push(BoneId(i));
            }
        }

        let default_root_rotation = self.bones[root.0].rotation;
        let default_root_basis = basis_from_rotation(&default_root_rotation);
        let default_root_basis_inv = default_root_basis.transpose();
        let root_x = default_root_basis.column(0).into_owned();
        let root_z = default_root_basis.column(2).into_owned();

        let bones = self
            .bones
            .iter()
            .zip(children)
            .map(|(pending, children)| {
                let local_axis_basis = children
                    .first()
                    .and_then(|child| {
                        let dir = self.bones[child.0].position - pending.position;
                        basis_lock_y(&root_x, &dir, &root_z)
                    })
                    .unwrap_or(default_root_basis);
                let base_to_world = default_root_rotation.inverse() * pending.rotation;
                let bind = BindPose {
                    default_position: pending.position,
                    default_rotation: pending.rotation,
                    world_scale: pending.scale,
                    local_axis_basis,
                    base_to_world,
                    world_to_base: base_to_world.inverse(),
                    base_to_world_basis: basis_from_rotation(&base_to_world),
                    bone_to_world_basis: local_axis_basis.transpose()
                        * basis_from_rotation(&pending.rotation),
                };
                Bone {
                    name: pending.name.clone(),
                    parent: pending.parent,
                    children,
                    bind,
                    world_position: pending.position,
                    world_rotation: pending.rotation,
                    alive: true,
                }
            })
            .collect();

        Ok(Skeleton {
            bones,
            names: self.names,
            root,
            default_root_rotation,
            default_root_basis,
            default_root_basis_inv,
        })
    }
}
