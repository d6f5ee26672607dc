use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use common::{format::Format, serde::ReaderDeserializer};
use mesh_format::load_scene;
use tetra_format::{config::ExportConfig, export_scene, Axis};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
/// Export a mesh object to the .tetra tetrahedral mesh format. Every quad face
/// becomes one tetrahedron, other faces are skipped with a warning.
struct Args {
    #[clap(required_unless_present = "list_presets")]
    /// Path to a .obj or .stl file
    input: Option<PathBuf>,

    /// Path to write the .tetra file to. Defaults to the input path with a
    /// .tetra extension.
    output: Option<PathBuf>,

    #[clap(short, long)]
    /// Name of the object to export. Defaults to the first object in the
    /// file.
    object: Option<String>,

    #[clap(long, allow_hyphen_values = true)]
    /// Forward axis of the exported mesh: X, Y, Z, -X, -Y or -Z.
    forward: Option<Axis>,

    #[clap(long, allow_hyphen_values = true)]
    /// Up axis of the exported mesh: X, Y, Z, -X, -Y or -Z.
    up: Option<Axis>,

    #[clap(long)]
    /// Write coordinates with this many decimals. Coordinates that need more
    /// to stay exact are written in full.
    precision: Option<usize>,

    #[clap(long)]
    /// Load export options from a saved preset instead of the config file.
    /// Flags override its values.
    preset: Option<String>,

    #[clap(long)]
    /// Save the effective export options as a preset.
    save_preset: Option<String>,

    #[clap(long)]
    /// Print the objects in the input file and exit.
    list_objects: bool,

    #[clap(long)]
    /// Print the saved presets and exit.
    list_presets: bool,

    #[clap(short, long, action = clap::ArgAction::Count)]
    /// Log more detail, can be repeated.
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_presets {
        let dir = ExportConfig::preset_dir().context("No config directory for presets")?;
        for name in ExportConfig::list_presets(&dir)? {
            println!("{name}");
        }
        return Ok(());
    }

    let input = args.input.as_deref().context("No input file given")?;
    let config = export_config(&args)?;

    let format = (input.extension())
        .and_then(|x| Format::from_extension(&x.to_string_lossy()))
        .filter(Format::is_mesh_source)
        .with_context(|| format!("`{}` is not a .obj or .stl file", input.display()))?;
    let name = (input.file_stem())
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file =
        File::open(input).with_context(|| format!("Failed to open `{}`", input.display()))?;
    let des = ReaderDeserializer::new(BufReader::new(file));
    let scene = load_scene(des, format, &name)?;

    if args.list_objects {
        for (i, object) in scene.objects.iter().enumerate() {
            println!(
                "{i}: `{}` ({}) {{ vert: {}, face: {} }}",
                object.name,
                object.kind,
                object.vertex_count(),
                object.face_count()
            );
        }
        return Ok(());
    }

    if let Some(name) = &args.save_preset {
        let dir = ExportConfig::preset_dir().context("No config directory for presets")?;
        config.save_preset(&dir, name)?;
    }

    let output = (args.output.clone())
        .unwrap_or_else(|| input.with_extension(Format::Tetra.extension()));

    let now = Instant::now();
    let result = export_scene(
        &scene,
        args.object.as_deref(),
        config.axes(),
        &output,
        &config.serialize_options(),
    )?;

    println!(
        "Exported `{}`. {{ vert: {}, tetra: {}, skipped: {} }}",
        result.path.display(),
        result.stats.vertex_count,
        result.stats.tetrahedron_count,
        result.stats.warnings.len()
    );
    println!("Done. Elapsed: {:.1}s", now.elapsed().as_secs_f32());

    Ok(())
}

/// The preset or config file, with any flags layered on top.
fn export_config(args: &Args) -> Result<ExportConfig> {
    let mut config = match &args.preset {
        Some(name) => {
            let dir = ExportConfig::preset_dir().context("No config directory for presets")?;
            ExportConfig::load_preset(&dir, name)?
        }
        None => match ExportConfig::config_file() {
            Some(path) => ExportConfig::load_or_default(&path),
            None => ExportConfig::default(),
        },
    };

    if let Some(forward) = args.forward {
        config.forward = forward;
    }
    if let Some(up) = args.up {
        config.up = up;
    }
    if args.precision.is_some() {
        config.precision = args.precision;
    }

    Ok(config)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = filter::Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target("tetra_format", level)
        .with_target("tetra_export", level)
        .with_target("mesh_format", level);
    let format = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
