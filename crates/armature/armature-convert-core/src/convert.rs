//! Conversion entry point: markers -> bone tree -> tracking relationships -> host.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::binding::{bind, TrackingRelationship};
use crate::builder::{build, BoneTree};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, HostStage};
use crate::host::{ArmatureHandle, SceneHost, UndoScope};
use crate::marker::{Marker, MarkerSet, SceneObject};
use crate::Result;

/// Everything a successful conversion created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversion {
    pub armature: ArmatureHandle,
    pub bones: BoneTree,
    pub relationships: Vec<TrackingRelationship>,
}

/// True when the active object is a marker, i.e. the conversion can be offered.
pub fn can_convert(active: Option<&SceneObject>) -> bool {
    active.is_some_and(SceneObject::is_marker)
}

/// Convert a snapshot of selected markers into a tracked armature on `host`.
///
/// Input is validated before the host is touched. Host failures abort the
/// whole pass and the partially built armature is removed.
pub fn convert<H: SceneHost + ?Sized>(
    host: &mut H,
    markers: Vec<Marker>,
    cfg: &ConvertConfig,
) -> Result<Conversion> {
    let set = MarkerSet::new(markers, cfg)?;
    convert_set(host, &set, cfg)
}

/// Like [`convert`], starting from a raw selection that may contain non-markers.
pub fn convert_selection<H: SceneHost + ?Sized>(
    host: &mut H,
    objects: Vec<SceneObject>,
    cfg: &ConvertConfig,
) -> Result<Conversion> {
    let set = MarkerSet::from_selection(objects, cfg)?;
    convert_set(host, &set, cfg)
}

/// Convert an already validated marker set.
pub fn convert_set<H: SceneHost + ?Sized>(
    host: &mut H,
    set: &MarkerSet,
    cfg: &ConvertConfig,
) -> Result<Conversion> {
    let bones = build(set.as_slice());
    let relationships = bind(&bones, set);
    debug!(
        "built {} bones and {} tracking relationships",
        bones.len(),
        relationships.len()
    );

    let mut host = UndoScope::new(host, cfg.suppress_global_undo);
    let armature = host
        .create_armature()
        .map_err(|e| ConvertError::host(HostStage::CreateArmature, "armature", e))?;

    if let Err(err) = realize(&mut *host, armature, &bones, &relationships) {
        if let Err(rollback) = host.remove_armature(armature) {
            warn!("failed to remove armature {armature:?} after aborted conversion: {rollback}");
        }
        return Err(err);
    }

    info!(
        "converted {} markers into armature {:?}",
        bones.len(),
        armature
    );
    Ok(Conversion {
        armature,
        bones,
        relationships,
    })
}

fn realize<H: SceneHost + ?Sized>(
    host: &mut H,
    armature: ArmatureHandle,
    bones: &BoneTree,
    relationships: &[TrackingRelationship],
) -> Result<()> {
    for bone in bones.iter() {
        host.create_bone(armature, bone)
            .map_err(|e| ConvertError::host(HostStage::CreateBone, &bone.name, e))?;
    }

    for bone in bones.iter() {
        if let Some(parent) = bone.parent.as_deref() {
            host.set_bone_parent(armature, &bone.name, parent)
                .map_err(|e| ConvertError::host(HostStage::ParentBone, &bone.name, e))?;
        }
    }

    for rel in relationships {
        host.add_tracking(armature, rel)
            .map_err(|e| ConvertError::host(HostStage::AttachTracking, &rel.bone, e))?;
    }
    Ok(())
}
