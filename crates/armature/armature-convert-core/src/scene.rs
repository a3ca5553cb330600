//! In-memory scene graph implementing [`SceneHost`].
//!
//! Holds scene objects (markers and anything else the host would select) and the
//! armatures created by conversions. Runtime bones are evaluated on demand: a
//! bone carrying tracking relationships mirrors its leader marker's current
//! transform, an untracked bone sits in its rest pose.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::binding::{TrackingKind, TrackingRelationship};
use crate::builder::BoneDescriptor;
use crate::codec;
use crate::error::HostError;
use crate::host::{ArmatureHandle, SceneHost};
use crate::marker::{Marker, SceneObject, WorldTransform};

/// Failures reported by [`MemoryScene`] when used as a host.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("unknown armature {0:?}")]
    UnknownArmature(ArmatureHandle),
    #[error("bone '{0}' already exists")]
    DuplicateBone(String),
    #[error("unknown bone '{0}'")]
    UnknownBone(String),
    #[error("unknown tracking target '{0}'")]
    UnknownTarget(String),
}

/// A bone as realized in an armature.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeBone {
    pub head: Vector3<f64>,
    pub tail: Vector3<f64>,
    pub roll: f64,
    pub parent: Option<String>,
    /// Leader marker name per tracking kind.
    pub tracking: Vec<(TrackingKind, String)>,
}

impl RuntimeBone {
    pub fn rest_orientation(&self) -> Matrix3<f64> {
        codec::compose(&(self.tail - self.head), self.roll)
    }

    pub fn tracks(&self, kind: TrackingKind) -> Option<&str> {
        self.tracking
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, target)| target.as_str())
    }
}

/// Bone container; always placed at the origin with identity rotation.
#[derive(Clone, Debug, Default)]
pub struct Armature {
    pub bones: IndexMap<String, RuntimeBone>,
}

/// Reference host: scene objects, selection state and armatures in memory.
#[derive(Debug)]
pub struct MemoryScene {
    objects: IndexMap<String, SceneObject>,
    selection: Vec<String>,
    active: Option<String>,
    armatures: HashMap<ArmatureHandle, Armature>,
    next_armature: u32,
    global_undo: bool,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self {
            objects: IndexMap::new(),
            selection: Vec::new(),
            active: None,
            armatures: HashMap::new(),
            next_armature: 0,
            global_undo: true,
        }
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert(&mut self, object: SceneObject) {
        self.objects.insert(object.marker.name.clone(), object);
    }

    pub fn insert_marker(&mut self, marker: Marker) {
        self.insert(SceneObject::empty(marker));
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    /// Select `names` in order; the last one becomes active. Unknown names are ignored.
    pub fn select<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.selection = names
            .into_iter()
            .filter(|n| self.objects.contains_key(*n))
            .map(str::to_string)
            .collect();
        self.active = self.selection.last().cloned();
    }

    pub fn select_all(&mut self) {
        self.selection = self.objects.keys().cloned().collect();
        self.active = self.selection.last().cloned();
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active.as_deref().and_then(|n| self.objects.get(n))
    }

    /// Owned snapshot of the current selection, in selection order.
    pub fn selection_snapshot(&self) -> Vec<SceneObject> {
        self.selection
            .iter()
            .filter_map(|n| self.objects.get(n).cloned())
            .collect()
    }

    /// Move a marker; tracked bones follow on the next evaluation.
    pub fn set_world(&mut self, name: &str, world: WorldTransform) -> bool {
        match self.objects.get_mut(name) {
            Some(obj) => {
                obj.marker.world = world;
                true
            }
            None => false,
        }
    }

    pub fn armature(&self, handle: ArmatureHandle) -> Option<&Armature> {
        self.armatures.get(&handle)
    }

    pub fn armature_count(&self) -> usize {
        self.armatures.len()
    }

    /// Drop every tracking relationship of an armature, leaving bones where
    /// their rest pose puts them.
    pub fn clear_tracking(&mut self, handle: ArmatureHandle) -> bool {
        match self.armatures.get_mut(&handle) {
            Some(arm) => {
                arm.bones.values_mut().for_each(|b| b.tracking.clear());
                true
            }
            None => false,
        }
    }

    /// World-space pose of a runtime bone. Position and orientation come from
    /// the tracked marker when a relationship of that kind exists, otherwise
    /// from the rest pose. Tracked orientation has the marker's scale removed.
    pub fn bone_world_pose(&self, handle: ArmatureHandle, bone: &str) -> Option<WorldTransform> {
        let bone = self.armatures.get(&handle)?.bones.get(bone)?;
        let leader = |kind| {
            bone.tracks(kind)
                .and_then(|target| self.objects.get(target))
                .map(|obj| &obj.marker.world)
        };

        let position = leader(TrackingKind::Position)
            .map(|w| w.position)
            .unwrap_or(bone.head);
        let orientation = leader(TrackingKind::Rotation)
            .map(|w| codec::normalize_columns(&w.orientation))
            .unwrap_or_else(|| bone.rest_orientation());
        Some(WorldTransform::new(position, orientation))
    }

    fn armature_mut(&mut self, handle: ArmatureHandle) -> Result<&mut Armature, SceneError> {
        self.armatures
            .get_mut(&handle)
            .ok_or(SceneError::UnknownArmature(handle))
    }
}

impl SceneHost for MemoryScene {
    fn create_armature(&mut self) -> Result<ArmatureHandle, HostError> {
        let handle = ArmatureHandle(self.next_armature);
        self.next_armature = self.next_armature.wrapping_add(1);
        self.armatures.insert(handle, Armature::default());
        debug!("memory scene: created armature {handle:?}");
        Ok(handle)
    }

    fn create_bone(
        &mut self,
        armature: ArmatureHandle,
        bone: &BoneDescriptor,
    ) -> Result<(), HostError> {
        let arm = self.armature_mut(armature)?;
        if arm.bones.contains_key(&bone.name) {
            return Err(SceneError::DuplicateBone(bone.name.clone()).into());
        }
        arm.bones.insert(
            bone.name.clone(),
            RuntimeBone {
                head: bone.head,
                tail: bone.tail,
                roll: bone.roll,
                parent: None,
                tracking: Vec::new(),
            },
        );
        Ok(())
    }

    fn set_bone_parent(
        &mut self,
        armature: ArmatureHandle,
        child: &str,
        parent: &str,
    ) -> Result<(), HostError> {
        let arm = self.armature_mut(armature)?;
        if !arm.bones.contains_key(parent) {
            return Err(SceneError::UnknownBone(parent.to_string()).into());
        }
        let bone = arm
            .bones
            .get_mut(child)
            .ok_or_else(|| SceneError::UnknownBone(child.to_string()))?;
        bone.parent = Some(parent.to_string());
        Ok(())
    }

    fn add_tracking(
        &mut self,
        armature: ArmatureHandle,
        relationship: &TrackingRelationship,
    ) -> Result<(), HostError> {
        if !self.objects.contains_key(&relationship.marker) {
            return Err(SceneError::UnknownTarget(relationship.marker.clone()).into());
        }
        let arm = self.armature_mut(armature)?;
        let bone = arm
            .bones
            .get_mut(&relationship.bone)
            .ok_or_else(|| SceneError::UnknownBone(relationship.bone.clone()))?;
        bone.tracking
            .push((relationship.kind, relationship.marker.clone()));
        Ok(())
    }

    fn remove_armature(&mut self, armature: ArmatureHandle) -> Result<(), HostError> {
        self.armatures
            .remove(&armature)
            .map(|_| ())
            .ok_or_else(|| SceneError::UnknownArmature(armature).into())
    }

    fn global_undo(&self) -> bool {
        self.global_undo
    }

    fn set_global_undo(&mut self, enabled: bool) {
        self.global_undo = enabled;
    }
}
