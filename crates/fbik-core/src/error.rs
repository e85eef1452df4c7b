use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for fbik-core.
#[derive(Debug, Error)]
pub enum FbikError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Skeleton error: {0}")]
    Skeleton(#[from] SkeletonError),
}

/// Settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Angle out of range for {field}: {value} (must be in [0, 90] degrees)")]
    AngleOutOfRange { field: &'static str, value: f32 },

    #[error("Rate out of range for {field}: {value} (must be in [0, 1])")]
    RateOutOfRange { field: &'static str, value: f32 },
}

/// Errors raised while building a [`Skeleton`](crate::skeleton::Skeleton)
/// from a rig description.
#[derive(Debug, Error)]
pub enum SkeletonError {
    /// Failed to read the description file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the TOML description.
    #[error("rig description parse error: {0}")]
    Parse(String),

    /// Two bones share a name.
    #[error("duplicate bone: {0}")]
    DuplicateBone(String),

    /// A bone names a parent that is not declared before it.
    #[error("bone {bone} references unknown parent {parent}")]
    UnknownParent { bone: String, parent: String },

    /// The description has no parentless bone.
    #[error("no root bone found")]
    NoRootBone,

    /// A bind rotation quaternion has zero length.
    #[error("invalid bind rotation for bone {0}")]
    InvalidRotation(String),

    /// A bone looked up by name does not exist.
    #[error("missing bone: {0}")]
    MissingBone(String),
}
