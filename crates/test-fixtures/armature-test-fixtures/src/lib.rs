use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use armature_convert::{Marker, MemoryScene, ObjectKind, SceneObject, WorldTransform};
use nalgebra::{Matrix3, Rotation3, Vector3};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    rigs: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Hand-authored scene object: Euler XYZ rotation in degrees plus optional scale.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectFixture {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ObjectKind,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation_deg: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    #[serde(default)]
    pub parent: Option<String>,
}

fn default_kind() -> ObjectKind {
    ObjectKind::Empty
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl ObjectFixture {
    pub fn world(&self) -> WorldTransform {
        let [rx, ry, rz] = self.rotation_deg.map(f64::to_radians);
        let rotation = Rotation3::from_euler_angles(rx, ry, rz).into_inner();
        let scale = Matrix3::from_diagonal(&Vector3::from(self.scale));
        WorldTransform::new(Vector3::from(self.position), rotation * scale)
    }

    pub fn to_object(&self) -> SceneObject {
        let mut marker = Marker::new(self.name.clone(), self.world());
        marker.parent = self.parent.clone();
        SceneObject {
            kind: self.kind,
            marker,
        }
    }
}

/// A named rig: scene objects in selection order and the active object.
#[derive(Debug, Clone, Deserialize)]
pub struct RigFixture {
    pub name: String,
    pub objects: Vec<ObjectFixture>,
    #[serde(default)]
    pub active: Option<String>,
}

impl RigFixture {
    pub fn objects(&self) -> Vec<SceneObject> {
        self.objects.iter().map(ObjectFixture::to_object).collect()
    }

    /// Scene holding every object, all selected, with the fixture's active object last.
    pub fn scene(&self) -> MemoryScene {
        let mut scene = MemoryScene::new();
        for obj in self.objects() {
            scene.insert(obj);
        }
        let mut order: Vec<&str> = self
            .objects
            .iter()
            .map(|o| o.name.as_str())
            .filter(|n| Some(*n) != self.active.as_deref())
            .collect();
        if let Some(active) = self.active.as_deref() {
            order.push(active);
        }
        scene.select(order);
        scene
    }
}

pub mod rigs {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.rigs.keys().cloned().collect()
    }

    pub fn load(name: &str) -> Result<RigFixture> {
        let rel = lookup(&MANIFEST.rigs, "rig", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.rigs, "rig", name)?;
        Ok(resolve_path(rel))
    }
}
