//! Input markers and the validated, name-indexed set handed to the builder.

use hashbrown::{HashMap, HashSet};
use log::warn;
use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{ConvertConfig, OrientationCheck};
use crate::error::ConvertError;
use crate::Result;

/// World-space placement of a marker: position plus 3x3 orientation (may carry scale).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub position: Vector3<f64>,
    pub orientation: Matrix3<f64>,
}

impl WorldTransform {
    pub fn new(position: Vector3<f64>, orientation: Matrix3<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), Matrix3::identity())
    }

    /// Split an affine 4x4 world matrix into translation and upper-left 3x3 block.
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        Self {
            position: m.fixed_view::<3, 1>(0, 3).into_owned(),
            orientation: m.fixed_view::<3, 3>(0, 0).into_owned(),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut m = self.orientation.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.position);
        m
    }
}

/// A zero-dimensional scene marker ("empty") with an optional parent, by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub world: WorldTransform,
    #[serde(default)]
    pub parent: Option<String>,
}

impl Marker {
    pub fn new(name: impl Into<String>, world: WorldTransform) -> Self {
        Self {
            name: name.into(),
            world,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Object type as reported by the host.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Empty,
    Mesh,
    Armature,
    Camera,
    Light,
    Other,
}

/// One entry of the host's selection snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub marker: Marker,
}

impl SceneObject {
    pub fn empty(marker: Marker) -> Self {
        Self {
            kind: ObjectKind::Empty,
            marker,
        }
    }

    #[inline]
    pub fn is_marker(&self) -> bool {
        self.kind == ObjectKind::Empty
    }
}

/// Validated markers in input order, indexed by name.
///
/// Names are unique and the parent graph restricted to this set is acyclic.
#[derive(Clone, Debug, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    index: HashMap<String, usize>,
}

impl MarkerSet {
    /// Validate `markers` according to `cfg`.
    pub fn new(markers: Vec<Marker>, cfg: &ConvertConfig) -> Result<Self> {
        let mut index = HashMap::with_capacity(markers.len());
        for (i, m) in markers.iter().enumerate() {
            if index.insert(m.name.clone(), i).is_some() {
                return Err(ConvertError::DuplicateMarkerName {
                    name: m.name.clone(),
                });
            }
            check_orientation(m, cfg)?;
        }
        let set = Self { markers, index };
        set.check_acyclic()?;
        Ok(set)
    }

    /// Keep only the empties of a selection snapshot, then validate.
    pub fn from_selection(objects: Vec<SceneObject>, cfg: &ConvertConfig) -> Result<Self> {
        let markers = objects
            .into_iter()
            .filter_map(|obj| {
                if obj.is_marker() {
                    Some(obj.marker)
                } else {
                    warn!(
                        "skipping selected object '{}' of kind {:?}: not a marker",
                        obj.marker.name, obj.kind
                    );
                    None
                }
            })
            .collect();
        Self::new(markers, cfg)
    }

    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.index.get(name).map(|&i| &self.markers[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut done: HashSet<&str> = HashSet::with_capacity(self.markers.len());
        for start in &self.markers {
            let mut path: HashSet<&str> = HashSet::new();
            let mut cur = Some(start);
            while let Some(m) = cur {
                if done.contains(m.name.as_str()) {
                    break;
                }
                if !path.insert(m.name.as_str()) {
                    return Err(ConvertError::ParentCycle {
                        marker: m.name.clone(),
                    });
                }
                cur = m.parent.as_deref().and_then(|p| self.get(p));
            }
            done.extend(path);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

fn check_orientation(marker: &Marker, cfg: &ConvertConfig) -> Result<()> {
    if cfg.orientation_check == OrientationCheck::Off {
        return Ok(());
    }
    let m = &marker.world.orientation;
    if !m.iter().chain(marker.world.position.iter()).all(|v| v.is_finite()) {
        return Err(ConvertError::malformed(&marker.name, "non-finite transform"));
    }

    let tol = cfg.orthonormal_tolerance;
    let mut axes = [Vector3::<f64>::zeros(); 3];
    for (i, axis) in axes.iter_mut().enumerate() {
        let col = m.column(i).into_owned();
        let len = col.norm();
        if len <= tol {
            return Err(ConvertError::malformed(
                &marker.name,
                format!("axis {i} has zero length"),
            ));
        }
        if cfg.orientation_check == OrientationCheck::Rotation && (len - 1.0).abs() > tol {
            return Err(ConvertError::malformed(
                &marker.name,
                format!("axis {i} has length {len}, expected 1"),
            ));
        }
        *axis = col / len;
    }

    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        let d = axes[i].dot(&axes[j]);
        if d.abs() > tol {
            return Err(ConvertError::malformed(
                &marker.name,
                format!("axes {i} and {j} are not orthogonal (dot {d})"),
            ));
        }
    }

    if m.determinant() <= 0.0 {
        return Err(ConvertError::malformed(
            &marker.name,
            "orientation is a reflection",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn at(name: &str, orientation: Matrix3<f64>) -> Marker {
        Marker::new(name, WorldTransform::new(Vector3::zeros(), orientation))
    }

    #[test]
    fn world_matrix_round_trips() {
        let rot = Rotation3::from_euler_angles(0.1, 0.2, 0.3).into_inner();
        let w = WorldTransform::new(Vector3::new(1.0, 2.0, 3.0), rot);
        let back = WorldTransform::from_matrix(&w.to_matrix());
        assert_eq!(back, w);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = MarkerSet::new(
            vec![at("a", Matrix3::identity()), at("a", Matrix3::identity())],
            &ConvertConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateMarkerName { name } if name == "a"));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let markers = vec![
            at("a", Matrix3::identity()).with_parent("c"),
            at("b", Matrix3::identity()).with_parent("a"),
            at("c", Matrix3::identity()).with_parent("b"),
        ];
        let err = MarkerSet::new(markers, &ConvertConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::ParentCycle { .. }));
    }

    #[test]
    fn parent_outside_set_is_not_a_cycle() {
        let markers = vec![
            at("a", Matrix3::identity()).with_parent("z"),
            at("b", Matrix3::identity()).with_parent("a"),
        ];
        let set = MarkerSet::new(markers, &ConvertConfig::default()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("b"));
        assert!(!set.contains("z"));
    }

    #[test]
    fn scaled_orientation_depends_on_check() {
        let scaled = vec![at("s", Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 2.0)))];
        let strict = ConvertConfig::default();
        assert!(matches!(
            MarkerSet::new(scaled.clone(), &strict),
            Err(ConvertError::MalformedMarkerOrientation { .. })
        ));

        let scaled_ok = ConvertConfig {
            orientation_check: OrientationCheck::ScaledRotation,
            ..ConvertConfig::default()
        };
        assert!(MarkerSet::new(scaled.clone(), &scaled_ok).is_ok());
        assert!(MarkerSet::new(scaled, &ConvertConfig::permissive()).is_ok());
    }

    #[test]
    fn reflection_and_shear_are_rejected() {
        let cfg = ConvertConfig {
            orientation_check: OrientationCheck::ScaledRotation,
            ..ConvertConfig::default()
        };
        let mirror = Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0));
        assert!(MarkerSet::new(vec![at("m", mirror)], &cfg).is_err());

        let mut shear = Matrix3::identity();
        shear[(0, 1)] = 0.5;
        assert!(MarkerSet::new(vec![at("s", shear)], &cfg).is_err());

        let mut flat = Matrix3::identity();
        flat.set_column(1, &Vector3::zeros());
        assert!(MarkerSet::new(vec![at("f", flat)], &ConvertConfig::permissive()).is_ok());
        assert!(MarkerSet::new(vec![at("f", flat)], &cfg).is_err());
    }

    #[test]
    fn selection_keeps_only_empties() {
        let objects = vec![
            SceneObject::empty(at("hip", Matrix3::identity())),
            SceneObject {
                kind: ObjectKind::Mesh,
                marker: at("body", Matrix3::identity()),
            },
        ];
        let set = MarkerSet::from_selection(objects, &ConvertConfig::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].name, "hip");
    }
}
