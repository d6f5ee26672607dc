//! Remapping between coordinate conventions described by a forward and an up
//! axis.
//!
//! Source geometry uses forward = -Z, up = +Y and right = +X. The right axis
//! of both conventions is derived as `forward × up`, so source and target
//! bases always share their handedness and every transform is a pure
//! rotation (determinant +1). Mirrored output, and with it flipped tetrahedron
//! orientation, can not be produced.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Pos, Result, TetraError};

pub const SOURCE_FORWARD: Axis = Axis::NegZ;
pub const SOURCE_UP: Axis = Axis::PosY;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    #[serde(rename = "X")]
    PosX,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "Y")]
    PosY,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "Z")]
    PosZ,
    #[serde(rename = "-Z")]
    NegZ,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisConfig {
    pub forward: Axis,
    pub up: Axis,
}

/// Orthonormal matrix taking positions from the source convention to the
/// target one. Built once per export and applied to every vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisTransform {
    matrix: Matrix3<f32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown axis `{0}`, expected one of X, Y, Z, -X, -Y, -Z")]
pub struct ParseAxisError(String);

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::PosX,
        Axis::NegX,
        Axis::PosY,
        Axis::NegY,
        Axis::PosZ,
        Axis::NegZ,
    ];

    pub fn vector(self) -> Vector3<f32> {
        match self {
            Axis::PosX => Vector3::x(),
            Axis::NegX => -Vector3::x(),
            Axis::PosY => Vector3::y(),
            Axis::NegY => -Vector3::y(),
            Axis::PosZ => Vector3::z(),
            Axis::NegZ => -Vector3::z(),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Axis::PosX => Axis::NegX,
            Axis::NegX => Axis::PosX,
            Axis::PosY => Axis::NegY,
            Axis::NegY => Axis::PosY,
            Axis::PosZ => Axis::NegZ,
            Axis::NegZ => Axis::PosZ,
        }
    }

    /// Same or opposite direction.
    pub fn is_parallel(self, other: Axis) -> bool {
        self == other || self == other.opposite()
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::PosX => "X",
            Axis::NegX => "-X",
            Axis::PosY => "Y",
            Axis::NegY => "-Y",
            Axis::PosZ => "Z",
            Axis::NegZ => "-Z",
        }
    }
}

impl AxisConfig {
    pub fn new(forward: Axis, up: Axis) -> Self {
        Self { forward, up }
    }

    pub fn transform(&self) -> Result<AxisTransform> {
        AxisTransform::new(self.forward, self.up)
    }
}

impl AxisTransform {
    pub fn new(forward: Axis, up: Axis) -> Result<Self> {
        if forward.is_parallel(up) {
            return Err(TetraError::InvalidAxisConfig { forward, up });
        }

        // Source basis is orthonormal so its inverse is the transpose
        let source = basis(SOURCE_FORWARD, SOURCE_UP);
        let target = basis(forward, up);
        Ok(Self {
            matrix: target * source.transpose(),
        })
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn apply(&self, pos: &Pos) -> Pos {
        self.matrix * pos
    }

    pub fn apply_all(&self, verts: &[Pos]) -> Vec<Pos> {
        verts.iter().map(|x| self.apply(x)).collect()
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.matrix
    }

    /// The transform as a 4x4 matrix with no translation.
    pub fn to_homogeneous(&self) -> Matrix4<f32> {
        self.matrix.to_homogeneous()
    }

    pub fn determinant(&self) -> f32 {
        self.matrix.determinant()
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }
}

/// Columns are right, up and forward.
fn basis(forward: Axis, up: Axis) -> Matrix3<f32> {
    let (forward, up) = (forward.vector().normalize(), up.vector().normalize());
    let right = forward.cross(&up).normalize();
    Matrix3::from_columns(&[right, up, forward])
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            forward: SOURCE_FORWARD,
            up: SOURCE_UP,
        }
    }
}

impl Default for AxisTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = ParseAxisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, letter) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let axis = match letter.to_ascii_uppercase().as_str() {
            "X" => Axis::PosX,
            "Y" => Axis::PosY,
            "Z" => Axis::PosZ,
            _ => return Err(ParseAxisError(s.to_owned())),
        };

        Ok(if negative { axis.opposite() } else { axis })
    }
}
