//! Rig descriptions: a TOML list of bones with bind transforms.
//!
//! ```toml
//! name = "humanoid"
//!
//! [[bones]]
//! name = "hips"
//! position = [0.0, 1.0, 0.0]
//!
//! [[bones]]
//! name = "neck"
//! parent = "hips"
//! position = [0.0, 1.5, 0.0]
//! rotation = [0.0, 0.0, 0.0, 1.0] # x, y, z, w
//! scale = [1.0, 1.0, 1.0]
//! ```
//!
//! Parents must be listed before their children. The first parentless bone
//! is the root and defines the rig's base frame.

use std::path::Path;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::SkeletonError;
use crate::skeleton::Skeleton;

const fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}
const fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// One bone of a [`RigDescription`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDescription {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Bind world position `[x, y, z]`.
    pub position: [f32; 3],
    /// Bind world rotation `[x, y, z, w]`.
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
    /// Lossy world scale `[x, y, z]`.
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

/// Serializable description of a skeleton's bind pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigDescription {
    #[serde(default)]
    pub name: String,
    pub bones: Vec<BoneDescription>,
}

impl RigDescription {
    /// Build the skeleton described.
    pub fn build(&self) -> Result<Skeleton, SkeletonError> {
        let mut builder = Skeleton::builder();
        for bone in &self.bones {
            let parent = match &bone.parent {
                Some(parent) => Some(builder.find(parent).ok_or_else(|| {
                    SkeletonError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };
            let [x, y, z, w] = bone.rotation;
            let rotation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), 1.0e-6)
                .ok_or_else(|| SkeletonError::InvalidRotation(bone.name.clone()))?;
            let id = builder.add_bone(
                bone.name.clone(),
                parent,
                Vector3::from(bone.position),
                rotation,
            )?;
            builder.set_scale(id, Vector3::from(bone.scale));
        }
        builder.build()
    }
}

/// Parse a rig description file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<RigDescription, SkeletonError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| SkeletonError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_string(&content)
}

/// Parse a rig description from a TOML string.
pub fn parse_string(content: &str) -> Result<RigDescription, SkeletonError> {
    toml::from_str(content).map_err(|e| SkeletonError::Parse(e.to_string()))
}
