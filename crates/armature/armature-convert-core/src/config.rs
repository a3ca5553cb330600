//! Conversion configuration.

use serde::{Deserialize, Serialize};

/// How strictly marker orientations are checked before any bone is built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationCheck {
    /// Orthonormal columns with determinant +1.
    #[default]
    Rotation,
    /// Mutually orthogonal, non-zero columns with positive determinant.
    /// Accepts world matrices that carry object scale; the scaled second
    /// column becomes the bone length.
    ScaledRotation,
    /// No validation; malformed input yields undefined direction/roll.
    Off,
}

/// Configuration for a single conversion pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub orientation_check: OrientationCheck,
    /// Per-entry tolerance used by the orthogonality and unit-length checks.
    pub orthonormal_tolerance: f64,
    /// Switch the host's global undo off for the duration of the pass and
    /// restore it afterwards.
    pub suppress_global_undo: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            orientation_check: OrientationCheck::default(),
            orthonormal_tolerance: 1e-5,
            suppress_global_undo: true,
        }
    }
}

impl ConvertConfig {
    /// Configuration that reproduces the unvalidated behaviour of the host add-on.
    pub fn permissive() -> Self {
        Self {
            orientation_check: OrientationCheck::Off,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: ConvertConfig =
            serde_json::from_str(r#"{ "orientation_check": "scaled_rotation" }"#).unwrap();
        assert_eq!(cfg.orientation_check, OrientationCheck::ScaledRotation);
        assert!(cfg.suppress_global_undo);
        assert_eq!(cfg.orthonormal_tolerance, 1e-5);
    }
}
