//! Hierarchy builder: markers -> name-keyed bone descriptors with parent links.

use indexmap::IndexMap;
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::marker::Marker;

/// Head/tail/roll record for one bone, named after its originating marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneDescriptor {
    pub name: String,
    pub head: Vector3<f64>,
    pub tail: Vector3<f64>,
    /// Twist about the head->tail axis, in radians.
    pub roll: f64,
    pub parent: Option<String>,
}

impl BoneDescriptor {
    #[inline]
    pub fn direction(&self) -> Vector3<f64> {
        self.tail - self.head
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Orientation reconstructed from direction and roll.
    pub fn rest_orientation(&self) -> Matrix3<f64> {
        codec::compose(&self.direction(), self.roll)
    }
}

/// Descriptors keyed by name, iterating in marker input order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTree {
    bones: IndexMap<String, BoneDescriptor>,
}

impl BoneTree {
    pub fn get(&self, name: &str) -> Option<&BoneDescriptor> {
        self.bones.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoneDescriptor> {
        self.bones.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Resolved parent descriptor of `name`, if any.
    pub fn parent_of(&self, name: &str) -> Option<&BoneDescriptor> {
        self.get(name)?.parent.as_deref().and_then(|p| self.get(p))
    }

    pub fn roots(&self) -> impl Iterator<Item = &BoneDescriptor> {
        self.iter().filter(|b| b.parent.is_none())
    }

    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BoneDescriptor> {
        self.iter().filter(move |b| b.parent.as_deref() == Some(name))
    }

    /// Number of ancestors above `name` (roots are at depth 0). `None` for
    /// unknown names and for bones caught in a parent cycle.
    pub fn depth(&self, name: &str) -> Option<usize> {
        let mut bone = self.get(name)?;
        let mut depth = 0;
        while let Some(parent) = bone.parent.as_deref().and_then(|p| self.get(p)) {
            depth += 1;
            if depth > self.bones.len() {
                return None;
            }
            bone = parent;
        }
        Some(depth)
    }

    /// Names ordered so that every parent precedes its children.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut order: Vec<(usize, &str)> = self
            .bones
            .keys()
            .map(|n| (self.depth(n).unwrap_or(0), n.as_str()))
            .collect();
        // Stable: siblings keep input order.
        order.sort_by_key(|(d, _)| *d);
        order.into_iter().map(|(_, n)| n).collect()
    }
}

/// Build one descriptor per marker, then link parents by name.
///
/// No input order is assumed: a child may precede its parent. A parent name
/// that does not match another marker in `markers` is dropped. Markers are
/// expected to carry unique names; with duplicates the last one wins.
pub fn build(markers: &[Marker]) -> BoneTree {
    let mut bones = IndexMap::with_capacity(markers.len());
    let mut pending: Vec<(&str, Option<&str>)> = Vec::with_capacity(markers.len());

    for marker in markers {
        let (direction, roll) = codec::decompose(&marker.world.orientation);
        let head = marker.world.position;
        let bone = BoneDescriptor {
            name: marker.name.clone(),
            head,
            tail: head + direction,
            roll,
            parent: None,
        };
        debug!(
            "bone '{}': length {:.4}, roll {:.4}",
            bone.name,
            bone.length(),
            roll
        );
        bones.insert(marker.name.clone(), bone);
        pending.push((marker.name.as_str(), marker.parent.as_deref()));
    }

    for (name, parent) in pending {
        let Some(parent) = parent else { continue };
        if parent != name && bones.contains_key(parent) {
            if let Some(bone) = bones.get_mut(name) {
                bone.parent = Some(parent.to_string());
            }
        } else {
            debug!("bone '{name}': parent '{parent}' not converted, leaving unparented");
        }
    }

    BoneTree { bones }
}
