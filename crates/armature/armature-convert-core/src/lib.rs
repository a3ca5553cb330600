//! Armature Convert Core (engine-agnostic)
//!
//! Turns a hierarchy of scene markers ("empties") into an armature whose bones
//! track those markers. The pipeline is one synchronous pass:
//!
//! markers -> [`codec`] (direction, roll) -> [`builder`] bone tree ->
//! [`binding`] tracking relationships -> [`SceneHost`] realization.
//!
//! Hosts implement [`SceneHost`]; [`MemoryScene`] is a complete in-memory host
//! used by tests and tools.

pub mod binding;
pub mod builder;
pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod host;
pub mod marker;
pub mod scene;

// Re-exports for consumers (adapters)
pub use binding::{bind, TrackingKind, TrackingRelationship};
pub use builder::{build, BoneDescriptor, BoneTree};
pub use codec::{compose, decompose};
pub use config::{ConvertConfig, OrientationCheck};
pub use convert::{can_convert, convert, convert_selection, convert_set, Conversion};
pub use error::{ConvertError, HostError, HostStage};
pub use host::{ArmatureHandle, SceneHost, UndoScope};
pub use marker::{Marker, MarkerSet, ObjectKind, SceneObject, WorldTransform};
pub use scene::{MemoryScene, SceneError};

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, ConvertError>;
