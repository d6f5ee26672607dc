//! Exports polygonal mesh objects to the `.tetra` tetrahedral mesh format.
//!
//! ```text
//! # .tetra file exported from <object name>
//! # Vertices:
//! v <x> <y> <z>
//! # Tetrahedra:
//! t <i0> <i1> <i2> <i3>
//! ```
//!
//! Vertex indices are the zero based position of a `v` line among all `v`
//! lines. Every quad face of the source mesh becomes one `t` line, all other
//! faces are skipped with a warning.

use nalgebra::Vector3;

pub mod axis;
pub mod config;
mod error;
pub mod export;
pub mod face;
pub mod serialize;

pub use axis::{Axis, AxisConfig, AxisTransform};
pub use error::{Result, TetraError};
pub use export::{export, export_scene, ExportResult};
pub use face::{classify, FaceClass, SkippedFace};
pub use serialize::{serialize, ExportStats, SerializeOptions};

pub type Pos = Vector3<f32>;
