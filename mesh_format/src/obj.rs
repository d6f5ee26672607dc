use std::{collections::HashMap, ops::Range};

use anyhow::{ensure, Context, Result};
use common::serde::Deserializer;
use itertools::Itertools;
use nalgebra::Vector3;
use tracing::debug;

use crate::{util::tokenize, MeshObject, ObjectKind, Scene};

/// Vertices are numbered across the whole file. An object whose faces only
/// use the vertices declared inside its `o` block keeps exactly that block,
/// otherwise it gets the vertices its faces use, in the order they are first
/// used. Vertices before the first `o` line can be such a shared pool.
pub fn parse<T: Deserializer>(des: &mut T, fallback_name: &str) -> Result<Scene> {
    let mut builder = SceneBuilder::new(fallback_name);

    tokenize(des, b"\r\n", |line| {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("o") => builder.begin_object(parts.join(" ")),
            Some("v") => {
                let vert = next_vertex(parts)
                    .with_context(|| format!("Invalid vertex `{line}`"))?;
                builder.push_vertex(vert);
            }
            Some("f") => {
                let face = next_face(parts, builder.verts.len())
                    .with_context(|| format!("Invalid face `{line}`"))?;
                builder.current().faces.push(face);
            }
            Some("l") => builder.current().lines += 1,
            Some("p") => builder.current().points += 1,
            _ => {}
        }
        Ok(())
    })?;

    builder.finish()
}

struct SceneBuilder {
    objects: Vec<ObjectBuilder>,
    verts: Vec<Vector3<f32>>,
}

struct ObjectBuilder {
    name: String,
    /// Vertices declared inside this object's block.
    block: Range<usize>,
    /// Zero based, global to the file.
    faces: Vec<Vec<usize>>,
    lines: usize,
    points: usize,
}

impl SceneBuilder {
    fn new(fallback_name: &str) -> Self {
        Self {
            objects: vec![ObjectBuilder::new(fallback_name.to_owned(), 0)],
            verts: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut ObjectBuilder {
        // There is always at least the implicit object
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    fn begin_object(&mut self, name: String) {
        let start = self.verts.len();
        self.objects.push(ObjectBuilder::new(name, start));
    }

    fn push_vertex(&mut self, vert: Vector3<f32>) {
        self.verts.push(vert);
        self.current().block.end += 1;
    }

    fn finish(self) -> Result<Scene> {
        let named = self.objects.len() > 1;

        let mut objects = Vec::new();
        for (idx, object) in self.objects.into_iter().enumerate() {
            // Geometry before the first `o` line is only kept if it has
            // elements of its own, or if it is all there is
            if idx == 0 && !object.has_elements() && (named || object.block.is_empty()) {
                continue;
            }
            objects.push(object.finish(&self.verts)?);
        }

        let active = (!objects.is_empty()).then_some(0);
        Ok(Scene { objects, active })
    }
}

impl ObjectBuilder {
    fn new(name: String, first_vertex: usize) -> Self {
        Self {
            name,
            block: first_vertex..first_vertex,
            faces: Vec::new(),
            lines: 0,
            points: 0,
        }
    }

    fn has_elements(&self) -> bool {
        !self.faces.is_empty() || self.lines > 0 || self.points > 0
    }

    fn kind(&self) -> ObjectKind {
        if !self.faces.is_empty() {
            ObjectKind::Mesh
        } else if self.lines > 0 {
            ObjectKind::Curve
        } else if self.points > 0 {
            ObjectKind::Points
        } else {
            ObjectKind::Mesh
        }
    }

    fn finish(self, pool: &[Vector3<f32>]) -> Result<MeshObject> {
        let kind = self.kind();

        let mut local = true;
        for &idx in self.faces.iter().flatten() {
            ensure!(
                idx < pool.len(),
                "Face in object `{}` references vertex {} but the file only has {}",
                self.name,
                idx + 1,
                pool.len()
            );
            local &= self.block.contains(&idx);
        }

        let (verts, faces) = if local {
            let start = self.block.start;
            let faces: Vec<Vec<u32>> = (self.faces.into_iter())
                .map(|face| face.into_iter().map(|x| (x - start) as u32).collect())
                .collect();
            (pool[self.block].to_vec(), faces)
        } else {
            gather(pool, self.faces)
        };

        debug!(
            "Parsed {kind} object `{}` {{ vert: {}, face: {} }}",
            self.name,
            verts.len(),
            faces.len()
        );

        Ok(MeshObject {
            name: self.name,
            kind,
            verts,
            faces,
        })
    }
}

/// Copies the vertices used by `faces` out of `pool`, numbered in the order
/// they are first used.
fn gather(pool: &[Vector3<f32>], faces: Vec<Vec<usize>>) -> (Vec<Vector3<f32>>, Vec<Vec<u32>>) {
    let mut verts = Vec::new();
    let mut remap = HashMap::new();

    let mut out = Vec::with_capacity(faces.len());
    for face in faces {
        let mut local = Vec::with_capacity(face.len());
        for idx in face {
            let new = *remap.entry(idx).or_insert_with(|| {
                verts.push(pool[idx]);
                verts.len() as u32 - 1
            });
            local.push(new);
        }
        out.push(local);
    }

    (verts, out)
}

fn next_vertex<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<Vector3<f32>> {
    Some(Vector3::new(
        parts.next()?.parse().ok()?,
        parts.next()?.parse().ok()?,
        parts.next()?.parse().ok()?,
    ))
}

/// Resolves `v`, `v/vt`, `v//vn` and `v/vt/vn` references, including negative
/// ones counted back from the last vertex declared so far.
fn next_face<'a>(parts: impl Iterator<Item = &'a str>, vertex_total: usize) -> Option<Vec<usize>> {
    let face = parts
        .map(|part| {
            let number = part.split_once('/').map(|x| x.0).unwrap_or(part);
            match number.parse::<i64>().ok()? {
                0 => None,
                idx if idx > 0 => Some(idx as usize - 1),
                idx => vertex_total.checked_sub(idx.unsigned_abs() as usize),
            }
        })
        .collect::<Option<Vec<_>>>()?;

    (!face.is_empty()).then_some(face)
}
