//! Optional TOML configuration for the command line tool.

use crate::error::{Error, Result};
use crate::store::SnapSettings;
use crate::text::FontSpec;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "thumbstudio.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub font: Option<FontSpec>,
    #[serde(default)]
    pub export: ExportConfig,
    /// Snap-assist for front ends that place overlays through a
    /// [`SceneStore`](crate::store::SceneStore), see `SceneStore::with_snap`.
    /// Exporting a saved project places nothing, so the binary ignores it.
    #[serde(default)]
    pub snap: SnapSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub upscale: u32,
    /// JPEG quality, from 1 to 100.
    pub quality: i32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            upscale: 2,
            quality: 95,
        }
    }
}

impl Config {
    /// With a name, opens `<config folder>/<name>.toml`, which must exist.
    /// Without one, opens `./thumbstudio.toml` if present, or uses the defaults.
    pub fn find(name: Option<&str>) -> Result<(PathBuf, Self)> {
        match name {
            Some(name) => {
                let mut path = Self::config_folder()?;
                path.push(format!("{name}.toml"));
                Self::open(&path)
            }
            None => {
                let path = PathBuf::from(".").join(FILE_NAME);
                if path.exists() {
                    Self::open(&path)
                } else {
                    Ok((PathBuf::from("."), Self::default()))
                }
            }
        }
    }

    /// Reads a config file. Relative font paths are resolved against the folder
    /// the file is in, which is returned alongside.
    pub fn open(path: impl AsRef<Path>) -> Result<(PathBuf, Self)> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::config_open(path, e))?;
        let raw: Self = toml::from_str(&content).map_err(|e| Error::config_deser(path, e))?;
        let folder = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let font = raw.font.map(|f| Self::prefix_font_path(&folder, f));
        Ok((folder, Self { font, ..raw }))
    }

    #[cfg(target_os = "windows")]
    fn config_folder() -> Result<PathBuf> {
        let home = std::env::var("APPDATA").map_err(|_| Error::no_env_variable("APPDATA"))?;
        let mut home = PathBuf::from(home);
        home.push("thumbstudio");
        Ok(home)
    }

    #[cfg(not(target_os = "windows"))]
    fn config_folder() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| Error::no_env_variable("HOME"))?;
        let mut home = PathBuf::from(home);
        home.push(".thumbstudio");
        Ok(home)
    }

    fn prefix_font_path(folder: &Path, spec: FontSpec) -> FontSpec {
        match spec {
            FontSpec::Path(path) if path.is_relative() => FontSpec::Path(folder.join(path)),
            spec => spec,
        }
    }
}
