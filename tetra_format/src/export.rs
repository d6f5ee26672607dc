use std::{
    ffi::OsString,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use mesh_format::{MeshObject, Scene};
use tracing::{debug, info, warn};

use crate::{
    serialize::{serialize, ExportStats, SerializeOptions},
    AxisConfig, Result, TetraError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportResult {
    pub path: PathBuf,
    pub stats: ExportStats,
}

/// Remaps `object` into the `axes` convention and writes it to `path`.
///
/// The file is written next to `path` first and only renamed into place once
/// everything is flushed, so a failed export never leaves a truncated file at
/// `path`.
pub fn export(
    object: &MeshObject,
    axes: AxisConfig,
    path: impl AsRef<Path>,
    options: &SerializeOptions,
) -> Result<ExportResult> {
    let path = path.as_ref();
    if !object.is_mesh() {
        return Err(TetraError::invalid_selection(format!(
            "object `{}` is a {}, not a mesh",
            object.name, object.kind
        )));
    }

    let transform = axes.transform()?;
    debug!(
        "Exporting `{}` with forward {} and up {}",
        object.name, axes.forward, axes.up
    );
    let verts = transform.apply_all(&object.verts);

    let stats = write_atomic(path, |writer| {
        serialize(&verts, object.faces.as_slice(), &object.name, writer, options)
    })?;

    for warning in &stats.warnings {
        warn!("{warning}");
    }
    info!(
        "Exported `{}` to {} {{ vert: {}, tetra: {} }}",
        object.name,
        path.display(),
        stats.vertex_count,
        stats.tetrahedron_count
    );

    Ok(ExportResult {
        path: path.to_path_buf(),
        stats,
    })
}

/// Exports the object called `name`, or the scene's active object if no name
/// is given.
pub fn export_scene(
    scene: &Scene,
    name: Option<&str>,
    axes: AxisConfig,
    path: impl AsRef<Path>,
    options: &SerializeOptions,
) -> Result<ExportResult> {
    let object = select_object(scene, name)?;
    export(object, axes, path, options)
}

pub fn select_object<'a>(scene: &'a Scene, name: Option<&str>) -> Result<&'a MeshObject> {
    match name {
        Some(name) => scene
            .find(name)
            .ok_or_else(|| TetraError::invalid_selection(format!("no object named `{name}`"))),
        None => scene
            .active_object()
            .ok_or_else(|| TetraError::invalid_selection("no active object")),
    }
}

fn write_atomic<T>(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let partial = partial_path(path);
    let result = (|| -> Result<T> {
        let mut writer = BufWriter::new(File::create(&partial)?);
        let out = write(&mut writer)?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&partial, path)?;
        Ok(out)
    })();

    if result.is_err() && partial.exists() {
        if let Err(err) = fs::remove_file(&partial) {
            warn!("Failed to remove `{}`: {err}", partial.display());
        }
    }

    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|x| x.to_os_string())
        .unwrap_or_else(|| OsString::from("export"));
    name.push(".partial");
    path.with_file_name(name)
}
