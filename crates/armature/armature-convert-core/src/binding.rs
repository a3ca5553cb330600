//! Constraint binder: every bone tracks its originating marker.
//!
//! Bones and markers share names, so the name doubles as the join key between
//! the marker scene and the armature. Each bone receives one position and one
//! rotation relationship; the host realizes them as live constraints that hold
//! until the animation is baked.

use serde::{Deserialize, Serialize};

use crate::builder::BoneTree;
use crate::marker::MarkerSet;

/// What a tracking relationship copies from the leader marker.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingKind {
    /// Follower origin copies the leader's world position.
    Position,
    /// Follower orientation copies the leader's world orientation.
    Rotation,
}

impl TrackingKind {
    pub const ALL: [TrackingKind; 2] = [TrackingKind::Position, TrackingKind::Rotation];

    /// Conventional constraint type name used by DCC hosts.
    pub fn constraint_name(self) -> &'static str {
        match self {
            TrackingKind::Position => "COPY_LOCATION",
            TrackingKind::Rotation => "COPY_ROTATION",
        }
    }
}

/// One-way tracking from a marker (leader) to a runtime bone (follower).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TrackingRelationship {
    pub marker: String,
    pub bone: String,
    pub kind: TrackingKind,
}

/// Emit a position and a rotation relationship for every bone in `tree`.
///
/// Every bone must have been built from a marker in `markers`.
pub fn bind(tree: &BoneTree, markers: &MarkerSet) -> Vec<TrackingRelationship> {
    let mut out = Vec::with_capacity(tree.len() * TrackingKind::ALL.len());
    for bone in tree.iter() {
        debug_assert!(
            markers.contains(&bone.name),
            "bone '{}' has no originating marker",
            bone.name
        );
        for kind in TrackingKind::ALL {
            out.push(TrackingRelationship {
                marker: bone.name.clone(),
                bone: bone.name.clone(),
                kind,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::config::ConvertConfig;
    use crate::marker::{Marker, WorldTransform};
    use hashbrown::HashMap;

    #[test]
    fn two_relationships_per_bone() {
        let markers: Vec<_> = ["pelvis", "spine", "neck", "head"]
            .iter()
            .map(|n| Marker::new(*n, WorldTransform::identity()))
            .collect();
        let set = MarkerSet::new(markers, &ConvertConfig::default()).unwrap();
        let tree = build(set.as_slice());
        let rels = bind(&tree, &set);
        assert_eq!(rels.len(), 2 * tree.len());

        let mut seen: HashMap<(&str, TrackingKind), usize> = HashMap::new();
        for r in &rels {
            assert_eq!(r.marker, r.bone);
            *seen.entry((r.bone.as_str(), r.kind)).or_default() += 1;
        }
        for name in tree.names() {
            assert_eq!(seen.get(&(name, TrackingKind::Position)), Some(&1));
            assert_eq!(seen.get(&(name, TrackingKind::Rotation)), Some(&1));
        }
    }

    #[test]
    fn empty_tree_binds_nothing() {
        let set = MarkerSet::default();
        assert!(bind(&build(&[]), &set).is_empty());
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&TrackingKind::Rotation).unwrap(),
            "\"rotation\""
        );
        assert_eq!(TrackingKind::Position.constraint_name(), "COPY_LOCATION");
    }
}
