//! Scene host trait and the undo scope wrapped around a conversion.
//!
//! Adapters (DCC plugins, engines, the in-memory [`MemoryScene`](crate::scene::MemoryScene))
//! implement [`SceneHost`] and pass it into [`convert`](crate::convert::convert).

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::binding::TrackingRelationship;
use crate::builder::BoneDescriptor;
use crate::error::HostError;

/// Opaque handle to a bone container created by the host.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ArmatureHandle(pub u32);

/// Capabilities the converter needs from the scene graph.
///
/// Calls arrive in phases: one `create_armature`, then `create_bone` for every
/// descriptor, then `set_bone_parent` for every resolved parent link, then
/// `add_tracking` for every relationship. A failing call aborts the pass and is
/// followed by `remove_armature`.
pub trait SceneHost {
    /// Create an empty container at the world origin with identity rotation.
    fn create_armature(&mut self) -> Result<ArmatureHandle, HostError>;

    /// Create a bone named `bone.name` with the given head, tail and roll.
    /// `bone.parent` is applied separately through [`SceneHost::set_bone_parent`].
    fn create_bone(
        &mut self,
        armature: ArmatureHandle,
        bone: &BoneDescriptor,
    ) -> Result<(), HostError>;

    fn set_bone_parent(
        &mut self,
        armature: ArmatureHandle,
        child: &str,
        parent: &str,
    ) -> Result<(), HostError>;

    /// Attach a live constraint making the runtime bone follow the named marker.
    fn add_tracking(
        &mut self,
        armature: ArmatureHandle,
        relationship: &TrackingRelationship,
    ) -> Result<(), HostError>;

    /// Discard a container and everything created in it.
    fn remove_armature(&mut self, armature: ArmatureHandle) -> Result<(), HostError>;

    /// Current global-undo preference. Hosts without one report `false`.
    fn global_undo(&self) -> bool {
        false
    }

    fn set_global_undo(&mut self, _enabled: bool) {}
}

/// Switches global undo off while alive and restores the previous value on drop,
/// on success and failure paths alike.
pub struct UndoScope<'h, H: SceneHost + ?Sized> {
    host: &'h mut H,
    previous: Option<bool>,
}

impl<'h, H: SceneHost + ?Sized> UndoScope<'h, H> {
    pub fn new(host: &'h mut H, suppress: bool) -> Self {
        let previous = if suppress {
            let previous = host.global_undo();
            host.set_global_undo(false);
            Some(previous)
        } else {
            None
        };
        Self { host, previous }
    }
}

impl<H: SceneHost + ?Sized> Deref for UndoScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: SceneHost + ?Sized> DerefMut for UndoScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: SceneHost + ?Sized> Drop for UndoScope<'_, H> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            self.host.set_global_undo(previous);
        }
    }
}
