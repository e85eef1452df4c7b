use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}
const fn default_neck_limit_pitch_up_angle() -> f32 {
    15.0
}
const fn default_neck_limit_pitch_down_angle() -> f32 {
    30.0
}
const fn default_neck_limit_roll_angle() -> f32 {
    5.0
}
const fn default_eyes_to_neck_pitch_rate() -> f32 {
    0.4
}
const fn default_head_limit_yaw_angle() -> f32 {
    60.0
}
const fn default_head_limit_pitch_up_angle() -> f32 {
    15.0
}
const fn default_head_limit_pitch_down_angle() -> f32 {
    15.0
}
const fn default_head_limit_roll_angle() -> f32 {
    5.0
}
const fn default_eyes_to_head_yaw_rate() -> f32 {
    0.8
}
const fn default_eyes_to_head_pitch_rate() -> f32 {
    0.5
}
const fn default_eyes_range_angle() -> f32 {
    60.0
}

// ---------------------------------------------------------------------------
// ModelTemplate
// ---------------------------------------------------------------------------

/// Which eye model the head solver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTemplate {
    /// Rotation-only eye sockets.
    #[default]
    Generic,
    /// Biped whose eye sockets are separate, independently scaled joints.
    /// Eyes are also translated laterally as they turn.
    SocketBiped,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Rig-wide solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct Settings {
    /// Eye model selection. Fixed for the lifetime of a solver instance.
    #[serde(default)]
    pub model_template: ModelTemplate,

    /// Drive joints to their bind pose relative to the parent before blending
    /// effectors, instead of continuing from the previous frame.
    #[serde(default = "default_true")]
    pub reset_transforms: bool,

    /// Head / neck / eyes tunables.
    #[serde(default)]
    pub head_ik: HeadIkSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_template: ModelTemplate::default(),
            reset_transforms: true,
            head_ik: HeadIkSettings::default(),
        }
    }
}

impl Settings {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.head_ik.validate()
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// HeadIkSettings
// ---------------------------------------------------------------------------

/// Anatomical limits (degrees) and gaze damping rates for the head solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadIkSettings {
    #[serde(default = "default_neck_limit_pitch_up_angle")]
    pub neck_limit_pitch_up_angle: f32,
    #[serde(default = "default_neck_limit_pitch_down_angle")]
    pub neck_limit_pitch_down_angle: f32,
    #[serde(default = "default_neck_limit_roll_angle")]
    pub neck_limit_roll_angle: f32,

    /// How much of the gaze pitch the neck takes (vertical component scale).
    #[serde(default = "default_eyes_to_neck_pitch_rate")]
    pub eyes_to_neck_pitch_rate: f32,

    #[serde(default = "default_head_limit_yaw_angle")]
    pub head_limit_yaw_angle: f32,
    #[serde(default = "default_head_limit_pitch_up_angle")]
    pub head_limit_pitch_up_angle: f32,
    #[serde(default = "default_head_limit_pitch_down_angle")]
    pub head_limit_pitch_down_angle: f32,
    #[serde(default = "default_head_limit_roll_angle")]
    pub head_limit_roll_angle: f32,

    #[serde(default = "default_eyes_to_head_yaw_rate")]
    pub eyes_to_head_yaw_rate: f32,
    #[serde(default = "default_eyes_to_head_pitch_rate")]
    pub eyes_to_head_pitch_rate: f32,

    /// Half-angle of the circular gaze cone.
    #[serde(default = "default_eyes_range_angle")]
    pub eyes_range_angle: f32,
}

impl Default for HeadIkSettings {
    fn default() -> Self {
        Self {
            neck_limit_pitch_up_angle: default_neck_limit_pitch_up_angle(),
            neck_limit_pitch_down_angle: default_neck_limit_pitch_down_angle(),
            neck_limit_roll_angle: default_neck_limit_roll_angle(),
            eyes_to_neck_pitch_rate: default_eyes_to_neck_pitch_rate(),
            head_limit_yaw_angle: default_head_limit_yaw_angle(),
            head_limit_pitch_up_angle: default_head_limit_pitch_up_angle(),
            head_limit_pitch_down_angle: default_head_limit_pitch_down_angle(),
            head_limit_roll_angle: default_head_limit_roll_angle(),
            eyes_to_head_yaw_rate: default_eyes_to_head_yaw_rate(),
            eyes_to_head_pitch_rate: default_eyes_to_head_pitch_rate(),
            eyes_range_angle: default_eyes_range_angle(),
        }
    }
}

impl HeadIkSettings {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let angles = [
            ("neck_limit_pitch_up_angle", self.neck_limit_pitch_up_angle),
            ("neck_limit_pitch_down_angle", self.neck_limit_pitch_down_angle),
            ("neck_limit_roll_angle", self.neck_limit_roll_angle),
            ("head_limit_yaw_angle", self.head_limit_yaw_angle),
            ("head_limit_pitch_up_angle", self.head_limit_pitch_up_angle),
            ("head_limit_pitch_down_angle", self.head_limit_pitch_down_angle),
            ("head_limit_roll_angle", self.head_limit_roll_angle),
            ("eyes_range_angle", self.eyes_range_angle),
        ];
        for (field, value) in angles {
            if !(0.0..=90.0).contains(&value) {
                return Err(ConfigError::AngleOutOfRange { field, value });
            }
        }

        let rates = [
            ("eyes_to_neck_pitch_rate", self.eyes_to_neck_pitch_rate),
            ("eyes_to_head_yaw_rate", self.eyes_to_head_yaw_rate),
            ("eyes_to_head_pitch_rate", self.eyes_to_head_pitch_rate),
        ];
        for (field, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { field, value });
            }
        }
        Ok(())
    }
}
