//! Error types for marker-to-bone conversion.

use std::fmt;

/// Boxed error produced by a [`SceneHost`](crate::host::SceneHost) implementation.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Host capability that was being exercised when a failure occurred.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HostStage {
    CreateArmature,
    CreateBone,
    ParentBone,
    AttachTracking,
}

impl fmt::Display for HostStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostStage::CreateArmature => "create armature",
            HostStage::CreateBone => "create bone",
            HostStage::ParentBone => "parent bone",
            HostStage::AttachTracking => "attach tracking relationship",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by validation and by [`convert`](crate::convert::convert).
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConvertError {
    /// The marker's world orientation is not usable as a bone frame.
    #[error("Malformed orientation on marker '{marker}': {reason}")]
    MalformedMarkerOrientation { marker: String, reason: String },

    /// Two selected markers share a name; bone names must be unique.
    #[error("Duplicate marker name: {name}")]
    DuplicateMarkerName { name: String },

    /// Following parent links from this marker leads back to itself.
    #[error("Marker '{marker}' is its own ancestor")]
    ParentCycle { marker: String },

    /// The host refused to create or attach something. The whole conversion is aborted.
    #[error("Host failed to {stage} for '{target}': {source}")]
    HostCreationFailure {
        stage: HostStage,
        target: String,
        #[source]
        source: HostError,
    },
}

impl ConvertError {
    pub(crate) fn malformed(marker: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMarkerOrientation {
            marker: marker.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn host(stage: HostStage, target: impl Into<String>, source: HostError) -> Self {
        Self::HostCreationFailure {
            stage,
            target: target.into(),
            source,
        }
    }

    /// True for errors caused by the input snapshot rather than the host.
    #[inline]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedMarkerOrientation { .. }
                | Self::DuplicateMarkerName { .. }
                | Self::ParentCycle { .. }
        )
    }
}
