use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Obj,
    Stl,
    Tetra,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Obj, Format::Stl, Format::Tetra];

    pub fn from_extension(extension: &str) -> Option<Self> {
        Some(match extension.to_lowercase().as_str() {
            "obj" => Format::Obj,
            "stl" => Format::Stl,
            "tetra" => Format::Tetra,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Obj => "Wavefront OBJ",
            Format::Stl => "Stereolithography",
            Format::Tetra => "Tetrahedral Mesh",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Obj => "obj",
            Format::Stl => "stl",
            Format::Tetra => "tetra",
        }
    }

    /// Whether meshes can be loaded from this format. `.tetra` files are
    /// only ever written.
    pub fn is_mesh_source(&self) -> bool {
        match self {
            Format::Obj | Format::Stl => true,
            Format::Tetra => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Format;

    #[test]
    fn extension_lookup_ignores_case() {
        assert_eq!(Format::from_extension("OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_extension("Tetra"), Some(Format::Tetra));
        assert_eq!(Format::from_extension("goo"), None);

        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
        }
    }
}
