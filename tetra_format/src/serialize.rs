use std::{
    fmt::{self, Write as _},
    io::{self, Write},
};

use tracing::debug;

use crate::{
    face::{classify, FaceClass, SkippedFace},
    Pos, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Fixed number of decimals for coordinates. A coordinate that would not
    /// read back to the same `f32` with this many decimals is written in its
    /// shortest exact form instead. `None` always writes the shortest form.
    pub precision: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub vertex_count: usize,
    pub tetrahedron_count: usize,
    pub warnings: Vec<SkippedFace>,
}

/// Writes one `.tetra` line at a time. Lines are formatted in full before
/// any of it reaches the sink.
pub struct TetraWriter<W: Write> {
    inner: W,
    line: String,
    precision: Option<usize>,
}

/// Writes `vertices` and the quads of `faces` to `writer`. Vertices must
/// already be in the target convention. Faces with any other vertex count are
/// returned as warnings and don't stop the export.
pub fn serialize<W: Write, F: AsRef<[u32]>>(
    vertices: &[Pos],
    faces: &[F],
    object_name: &str,
    writer: W,
    options: &SerializeOptions,
) -> Result<ExportStats> {
    let mut out = TetraWriter::new(writer, options);
    out.header(object_name)?;

    out.comment("Vertices:")?;
    for vert in vertices {
        out.vertex(vert)?;
    }

    out.comment("Tetrahedra:")?;
    let mut stats = ExportStats {
        vertex_count: vertices.len(),
        ..Default::default()
    };
    for (index, face) in faces.iter().enumerate() {
        match classify(face.as_ref()) {
            FaceClass::Tetrahedron(indices) => {
                out.tetrahedron(&indices)?;
                stats.tetrahedron_count += 1;
            }
            FaceClass::Skipped(vertex_count) => stats.warnings.push(SkippedFace {
                index,
                vertex_count,
            }),
        }
    }

    out.flush()?;
    debug!(
        "Serialized `{object_name}` {{ vert: {}, tetra: {}, skipped: {} }}",
        stats.vertex_count,
        stats.tetrahedron_count,
        stats.warnings.len()
    );
    Ok(stats)
}

impl<W: Write> TetraWriter<W> {
    pub fn new(inner: W, options: &SerializeOptions) -> Self {
        Self {
            inner,
            line: String::new(),
            precision: options.precision,
        }
    }

    pub fn header(&mut self, object_name: &str) -> io::Result<()> {
        // Keep the header on one line whatever the object is called
        let name = object_name.replace(['\r', '\n'], " ");
        self.comment(&format!(".tetra file exported from {name}"))
    }

    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        self.write_line(format_args!("# {text}"))
    }

    pub fn vertex(&mut self, pos: &Pos) -> io::Result<()> {
        let [x, y, z] = [pos.x, pos.y, pos.z].map(|x| coordinate(x, self.precision));
        self.write_line(format_args!("v {x} {y} {z}"))
    }

    pub fn tetrahedron(&mut self, indices: &[u32; 4]) -> io::Result<()> {
        let [a, b, c, d] = indices;
        self.write_line(format_args!("t {a} {b} {c} {d}"))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn write_line(&mut self, args: fmt::Arguments) -> io::Result<()> {
        self.line.clear();
        self.line.write_fmt(args).map_err(io::Error::other)?;
        self.line.push('\n');
        self.inner.write_all(self.line.as_bytes())
    }
}

fn coordinate(value: f32, precision: Option<usize>) -> String {
    if let Some(p) = precision {
        let fixed = format!("{value:.p$}");
        if fixed.parse::<f32>().is_ok_and(|x| x == value) {
            return fixed;
        }
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use nalgebra::Vector3;
    use proptest::prelude::*;

    use super::*;
    use crate::TetraError;

    fn render(vertices: &[Pos], faces: &[Vec<u32>]) -> (String, ExportStats) {
        let mut out = Vec::new();
        let options = SerializeOptions::default();
        let stats = serialize(vertices, faces, "Cube", &mut out, &options).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    fn render_vertex(vertex: Pos, precision: Option<usize>) -> String {
        let mut out = Vec::new();
        let options = SerializeOptions { precision };
        serialize::<_, [u32; 4]>(&[vertex], &[], "a", &mut out, &options).unwrap();

        let text = String::from_utf8(out).unwrap();
        lines_with(&text, "v")[0].to_owned()
    }

    fn parse_vertex(line: &str) -> Vec<f32> {
        (line[2..].split(' '))
            .map(|x| x.parse::<f32>().unwrap())
            .collect()
    }

    fn lines_with<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
        let prefix = format!("{tag} ");
        text.lines().filter(|x| x.starts_with(&prefix)).collect()
    }

    /// Accepts `budget` bytes and fails every write after that, without
    /// taking any part of a write that doesn't fit.
    struct FailingWriter {
        written: Vec<u8>,
        budget: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "sink closed"));
            }
            self.budget -= buf.len();
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn single_tetrahedron() {
        let vertices = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 1.0),
        ];
        let (text, stats) = render(&vertices, &[vec![0, 1, 2, 3]]);

        assert_eq!(
            text,
            "# .tetra file exported from Cube\n\
             # Vertices:\n\
             v 0 0 0\n\
             v 1 0 0\n\
             v 1 1 0\n\
             v 0 1 1\n\
             # Tetrahedra:\n\
             t 0 1 2 3\n"
        );
        assert_eq!(
            stats,
            ExportStats {
                vertex_count: 4,
                tetrahedron_count: 1,
                warnings: Vec::new(),
            }
        );
    }

    #[test]
    fn triangle_is_skipped_with_warning() {
        let vertices = vec![Vector3::zeros(); 5];
        let (text, stats) = render(&vertices, &[vec![0, 1, 2], vec![1, 2, 3, 4]]);

        assert_eq!(lines_with(&text, "t"), vec!["t 1 2 3 4"]);
        assert_eq!(stats.tetrahedron_count, 1);
        assert_eq!(
            stats.warnings,
            vec![SkippedFace {
                index: 0,
                vertex_count: 3
            }]
        );
    }

    #[test]
    fn winding_and_duplicates_pass_through() {
        let vertices = vec![Vector3::zeros(); 3];
        let (text, stats) = render(&vertices, &[vec![2, 0, 1, 0], vec![2, 0, 1, 0]]);

        assert_eq!(lines_with(&text, "t"), vec!["t 2 0 1 0", "t 2 0 1 0"]);
        assert_eq!(stats.tetrahedron_count, 2);
    }

    #[test]
    fn empty_mesh() {
        let (text, stats) = render(&[], &[]);

        assert_eq!(
            text,
            "# .tetra file exported from Cube\n# Vertices:\n# Tetrahedra:\n"
        );
        assert_eq!(stats, ExportStats::default());
    }

    #[test]
    fn fixed_precision() {
        let line = render_vertex(Vector3::new(0.5, -1.0, 0.125), Some(3));
        assert_eq!(line, "v 0.500 -1.000 0.125");
    }

    #[test]
    fn fixed_precision_keeps_every_f32() {
        let vertex = Vector3::new(0.000123456, 1.0 / 3.0, 12345.678);
        let line = render_vertex(vertex, Some(3));

        assert_eq!(line, "v 0.000123456 0.33333334 12345.678");
        assert_eq!(parse_vertex(&line), vec![vertex.x, vertex.y, vertex.z]);
    }

    #[test]
    fn multiline_names_stay_in_the_header() {
        let mut out = Vec::new();
        let options = SerializeOptions::default();
        serialize::<_, Vec<u32>>(&[], &[], "two\nlines", &mut out, &options).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# .tetra file exported from two lines\n# Vertices:\n"));
    }

    #[test]
    fn write_failure_stops_on_a_line_boundary() {
        let vertices = vec![Vector3::new(1.0, 2.0, 3.0); 100];
        let mut sink = FailingWriter {
            written: Vec::new(),
            budget: 128,
        };

        let options = SerializeOptions::default();
        let result = serialize(&vertices, &[[0_u32, 1, 2, 3]], "Cube", &mut sink, &options);
        assert!(matches!(result, Err(TetraError::Io(_))));
        assert!(sink.written.ends_with(b"\n"));
        assert!(sink.written.len() <= 128);
    }

    proptest! {
        #[test]
        fn one_line_per_vertex_and_quad(
            vertices in prop::collection::vec(
                (-1e3_f32..1e3, -1e3_f32..1e3, -1e3_f32..1e3),
                1..64,
            ),
            seeds in prop::collection::vec(prop::array::uniform4(any::<u32>()), 0..64),
        ) {
            let vertices = (vertices.into_iter())
                .map(|(x, y, z)| Vector3::new(x, y, z))
                .collect::<Vec<_>>();
            let n = vertices.len() as u32;
            let faces = seeds.iter().map(|x| x.map(|i| i % n).to_vec()).collect::<Vec<_>>();

            let (text, stats) = render(&vertices, &faces);
            let v_lines = lines_with(&text, "v");
            let t_lines = lines_with(&text, "t");

            prop_assert_eq!(v_lines.len(), vertices.len());
            prop_assert_eq!(t_lines.len(), faces.len());
            prop_assert_eq!(stats.tetrahedron_count, faces.len());
            prop_assert!(stats.warnings.is_empty());

            for (line, vert) in v_lines.iter().zip(&vertices) {
                prop_assert_eq!(parse_vertex(line), vec![vert.x, vert.y, vert.z]);
            }

            for (line, face) in t_lines.iter().zip(&faces) {
                let parsed = (line[2..].split(' '))
                    .map(|x| x.parse::<u32>().unwrap())
                    .collect::<Vec<_>>();
                prop_assert!(parsed.iter().all(|x| *x < n));
                prop_assert_eq!(&parsed, face);
            }
        }

        #[test]
        fn any_precision_reads_back_exactly(
            x in any::<f32>().prop_filter("finite", |x| x.is_finite()),
            y in -1e-3_f32..1e-3,
            precision in 0_usize..12,
        ) {
            let line = render_vertex(Vector3::new(x, y, 1.0), Some(precision));
            prop_assert_eq!(parse_vertex(&line), vec![x, y, 1.0]);
        }
    }
}
