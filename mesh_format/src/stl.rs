use std::collections::HashMap;

use anyhow::{ensure, Context, Result};
use common::serde::Deserializer;
use nalgebra::Vector3;

use crate::{util::tokenize, MeshObject, Scene};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// STL files hold a single triangle soup. Identical vertices are merged in
/// first-seen order so faces can share them.
pub fn parse<T: Deserializer>(des: &mut T, fallback_name: &str) -> Result<Scene> {
    let size = des.size()?;
    let has_magic = &*des.read_bytes(5)? == b"solid";
    let is_ascii = has_magic && !is_binary_size(des, size)?;
    des.jump_to(0)?;

    let object = if is_ascii {
        ascii::parse(des, fallback_name)?
    } else {
        binary::parse(des, size, fallback_name)?
    };

    Ok(Scene::single(object))
}

/// Some exporters start binary headers with `solid` too, so the triangle
/// count is checked against the file size before trusting the magic.
fn is_binary_size<T: Deserializer>(des: &mut T, size: usize) -> Result<bool> {
    if size < HEADER_SIZE + 4 {
        return Ok(false);
    }

    des.jump_to(HEADER_SIZE)?;
    let count = des.read_u32_le()? as usize;
    Ok(HEADER_SIZE + 4 + count * TRIANGLE_SIZE == size)
}

/// ```text
/// UINT8[80]    – Header                 - 80 bytes
/// UINT32       – Number of triangles    - 04 bytes
/// foreach triangle                      - 50 bytes
///     REAL32[3] – Normal vector         - 12 bytes
///     REAL32[3] – Vertex 1              - 12 bytes
///     REAL32[3] – Vertex 2              - 12 bytes
///     REAL32[3] – Vertex 3              - 12 bytes
///     UINT16    – Attribute byte count  - 02 bytes
/// end
/// ```
mod binary {
    use super::*;

    pub fn parse<T: Deserializer>(
        des: &mut T,
        size: usize,
        fallback_name: &str,
    ) -> Result<MeshObject> {
        des.advance_by(HEADER_SIZE)?;
        let tri_count = des.read_u32_le()? as usize;
        ensure!(
            HEADER_SIZE + 4 + tri_count * TRIANGLE_SIZE <= size,
            "Binary STL declares {tri_count} triangles but is only {size} bytes"
        );

        let mut builder = Builder::default();
        for _ in 0..tri_count {
            des.advance_by(4 * 3)?; // normal
            let face = [
                read_vec3f(des)?,
                read_vec3f(des)?,
                read_vec3f(des)?,
            ];
            builder.push_face(face);
            des.advance_by(2)?;
        }

        Ok(builder.finish(fallback_name.to_owned()))
    }

    fn read_vec3f<T: Deserializer>(des: &mut T) -> Result<Vector3<f32>> {
        Ok(Vector3::new(
            des.read_f32_le()?,
            des.read_f32_le()?,
            des.read_f32_le()?,
        ))
    }
}

/// ```text
/// solid name
/// facet normal ni nj nk
///     outer loop
///         vertex v1x v1y v1z
///         vertex v2x v2y v2z
///         vertex v3x v3y v3z
///     endloop
/// endfacet
/// endsolid name
/// ```
mod ascii {
    use super::*;

    pub fn parse<T: Deserializer>(des: &mut T, fallback_name: &str) -> Result<MeshObject> {
        let mut name = None;
        let mut builder = Builder::default();
        let mut corners = Vec::with_capacity(3);

        tokenize(des, b"\r\n", |line| {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("solid") if name.is_none() => {
                    let rest = line.trim_start()["solid".len()..].trim();
                    name = Some(rest.to_owned());
                }
                Some("vertex") => {
                    let vert = next_vertex(parts)
                        .with_context(|| format!("Invalid vertex `{line}`"))?;
                    corners.push(vert);
                }
                Some("endloop") => {
                    let face = <[Vector3<f32>; 3]>::try_from(corners.as_slice())
                        .ok()
                        .with_context(|| format!("Facet with {} vertices", corners.len()))?;
                    builder.push_face(face);
                    corners.clear();
                }
                _ => {}
            }
            Ok(())
        })?;

        let name = name
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| fallback_name.to_owned());
        Ok(builder.finish(name))
    }

    fn next_vertex<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<Vector3<f32>> {
        Some(Vector3::new(
            parts.next()?.parse().ok()?,
            parts.next()?.parse().ok()?,
            parts.next()?.parse().ok()?,
        ))
    }
}

#[derive(Default)]
struct Builder {
    lookup: HashMap<Vector3<u32>, u32>,
    verts: Vec<Vector3<f32>>,
    faces: Vec<Vec<u32>>,
}

impl Builder {
    fn push_face(&mut self, corners: [Vector3<f32>; 3]) {
        let face = corners.iter().map(|x| self.vert_idx(*x)).collect();
        self.faces.push(face);
    }

    fn vert_idx(&mut self, vert: Vector3<f32>) -> u32 {
        let next = self.verts.len() as u32;
        let idx = *self.lookup.entry(vert.map(f32::to_bits)).or_insert(next);
        if idx == next {
            self.verts.push(vert);
        }
        idx
    }

    fn finish(self, name: String) -> MeshObject {
        MeshObject::new(name, self.verts, self.faces)
    }
}
