use std::fmt::{self, Display};

/// How a polygon is written to a `.tetra` file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceClass {
    /// Exactly four indices, written as a `t` record in their original order.
    Tetrahedron([u32; 4]),
    /// Any other vertex count, left out of the file.
    Skipped(usize),
}

/// A face that was left out of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedFace {
    /// Position of the face in the input face list.
    pub index: usize,
    pub vertex_count: usize,
}

pub fn classify(face: &[u32]) -> FaceClass {
    match <[u32; 4]>::try_from(face) {
        Ok(indices) => FaceClass::Tetrahedron(indices),
        Err(_) => FaceClass::Skipped(face.len()),
    }
}

impl Display for SkippedFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipped non-quad face #{} with {} vertices",
            self.index, self.vertex_count
        )
    }
}
