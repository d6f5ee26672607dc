//! Loads mesh files into a [`Scene`] of named polygonal objects.
//!
//! Faces keep every vertex index they were written with, so quads stay quads
//! and n-gons stay n-gons. Vertex positions are kept exactly as stored in the
//! file (object-local space), no object transform is applied.

use std::fmt::{self, Display};

use anyhow::{bail, Result};
use common::{format::Format, serde::Deserializer};
use nalgebra::Vector3;
use tracing::info;

mod obj;
mod stl;
mod util;

/// What kind of geometry an object carries. Only [`ObjectKind::Mesh`]
/// objects have faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    #[default]
    Mesh,
    /// Only line elements.
    Curve,
    /// Only point elements.
    Points,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshObject {
    pub name: String,
    pub kind: ObjectKind,
    pub verts: Vec<Vector3<f32>>,
    pub faces: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<MeshObject>,
    /// Index into `objects` of the object exported when none is named.
    pub active: Option<usize>,
}

impl MeshObject {
    pub fn new(name: impl Into<String>, verts: Vec<Vector3<f32>>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            verts,
            faces,
        }
    }

    pub fn is_mesh(&self) -> bool {
        self.kind == ObjectKind::Mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl Scene {
    /// Creates a scene holding a single object, which is also the active one.
    pub fn single(object: MeshObject) -> Self {
        Self {
            objects: vec![object],
            active: Some(0),
        }
    }

    pub fn active_object(&self) -> Option<&MeshObject> {
        self.objects.get(self.active?)
    }

    pub fn find(&self, name: &str) -> Option<&MeshObject> {
        self.objects.iter().find(|x| x.name == name)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Mesh => "mesh",
            ObjectKind::Curve => "curve",
            ObjectKind::Points => "point cloud",
        })
    }
}

/// Parses every object out of a mesh file. `fallback_name` names geometry
/// that the file itself does not name, usually the file stem.
pub fn load_scene<T: Deserializer>(
    mut des: T,
    format: Format,
    fallback_name: &str,
) -> Result<Scene> {
    let scene = match format {
        Format::Obj => obj::parse(&mut des, fallback_name)?,
        Format::Stl => stl::parse(&mut des, fallback_name)?,
        _ => bail!("Can't load meshes from {} files", format.name()),
    };

    info!(
        "Loaded {} object(s) from {} file",
        scene.objects.len(),
        format.name()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use common::serde::SliceDeserializer;

    use super::*;

    #[test]
    fn tetra_is_not_a_mesh_source() {
        let des = SliceDeserializer::new(b"# .tetra file\n");
        let err = load_scene(des, Format::Tetra, "mesh").unwrap_err();
        assert!(err.to_string().contains("Tetrahedral Mesh"));
    }

    #[test]
    fn scene_selection() {
        let mut scene = Scene::single(MeshObject::new("a", Vec::new(), Vec::new()));
        scene.objects.push(MeshObject::new("b", Vec::new(), Vec::new()));

        assert_eq!(scene.active_object().map(|x| x.name.as_str()), Some("a"));
        assert_eq!(scene.find("b").map(|x| x.name.as_str()), Some("b"));
        assert!(scene.find("c").is_none());

        scene.active = None;
        assert!(scene.active_object().is_none());
    }
}
