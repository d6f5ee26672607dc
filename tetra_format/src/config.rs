use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Axis, AxisConfig, SerializeOptions};

/// Export options that can be stored in a config file or named preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub forward: Axis,
    pub up: Axis,
    pub precision: Option<usize>,
}

impl ExportConfig {
    pub fn axes(&self) -> AxisConfig {
        AxisConfig::new(self.forward, self.up)
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            precision: self.precision,
        }
    }

    /// `None` if the platform has no config directory.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|x| x.join("tetra_format"))
    }

    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|x| x.join("config.toml"))
    }

    pub fn preset_dir() -> Option<PathBuf> {
        Self::config_dir().map(|x| x.join("presets"))
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load config, using defaults: {err:#}");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(if path.exists() {
            let string = fs::read_to_string(path)
                .with_context(|| format!("Failed to read `{}`", path.display()))?;
            let config = toml::from_str(&string)
                .with_context(|| format!("Invalid config `{}`", path.display()))?;
            info!("Loaded export config from {}", path.display());
            config
        } else {
            info!("No config file at {}, using defaults", path.display());
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    /// Unlike [`ExportConfig::load`] a missing preset is an error.
    pub fn load_preset(dir: &Path, name: &str) -> Result<Self> {
        let path = preset_path(dir, name)?;
        ensure!(path.exists(), "No preset named `{name}`");
        Self::load(&path)
    }

    /// Fails without writing anything if the axes can't be exported with.
    pub fn save_preset(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = preset_path(dir, name)?;
        self.axes().transform()?;
        self.save(&path)?;
        info!("Saved preset `{name}` to {}", path.display());
        Ok(path)
    }

    pub fn list_presets(dir: &Path) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|x| x == "toml") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

fn preset_path(dir: &Path, name: &str) -> Result<PathBuf> {
    ensure!(
        !name.is_empty() && !name.contains(['/', '\\', '.']),
        "Invalid preset name `{name}`"
    );
    Ok(dir.join(format!("{name}.toml")))
}

impl Default for ExportConfig {
    fn default() -> Self {
        let axes = AxisConfig::default();
        Self {
            forward: axes.forward,
            up: axes.up,
            precision: None,
        }
    }
}
