//! Runtime overrides for solver tunables.
//!
//! Solvers read every tunable constant through [`DebugValues::get`]. With the
//! `debug-overrides` feature, values can be replaced by name while tuning a
//! rig. Without it the type is empty and `get` returns the default.

#[cfg(feature = "debug-overrides")]
use std::collections::HashMap;

/// Name → value overrides for solver constants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugValues {
    #[cfg(feature = "debug-overrides")]
    overrides: HashMap<String, f32>,
}

impl DebugValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The override registered under `name`, else `default`.
    #[inline]
    pub fn get(&self, name: &str, default: f32) -> f32 {
        #[cfg(feature = "debug-overrides")]
        let default = self.overrides.get(name).copied().unwrap_or(default);
        #[cfg(not(feature = "debug-overrides"))]
        let _ = name;
        default
    }

    /// Replace the constant `name` with `value`.
    #[cfg(feature = "debug-overrides")]
    pub fn set(&mut self, name: impl Into<String>, value: f32) {
        self.overrides.insert(name.into(), value);
    }

    /// Drop the override for `name`.
    #[cfg(feature = "debug-overrides")]
    pub fn remove(&mut self, name: &str) -> Option<f32> {
        self.overrides.remove(name)
    }

    #[cfg(feature = "debug-overrides")]
    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}
