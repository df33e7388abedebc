//! Common error types.

use std::path::Path;

/// A shortcut type equivalent to `Result<T, thumbstudio::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error that occurs within the crate.
#[derive(Debug)]
pub enum Error {
    EmptyScene,
    VipsError(String),
    CairoError(String),
    ImageConversionError(&'static str, &'static str),
    FailedOpenImage(String, String),
    FailedWriteImage(String, String),
    UnsupportedFormat(String),
    FontconfigUnavailable,
    LoadFontError(String),
    InvalidCString(String),
    ConfigOpen(String, String),
    ConfigDeser(String, String),
    ProjectOpen(String, String),
    ProjectDeser(String, String),
    ProjectWrite(String, String),
    MissingVariable(&'static str),
    LayerNotFound(String),
    LayerLocked(String),
    NoUndoHistory,
    UnknownTheme(String),
    UnknownPreset(String),
}

impl Error {
    pub fn failed_open(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::FailedOpenImage(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn failed_write(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::FailedWriteImage(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn config_open(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::ConfigOpen(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn config_deser(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::ConfigDeser(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn project_open(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::ProjectOpen(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn project_deser(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::ProjectDeser(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn project_write(path: impl AsRef<Path>, e: impl ToString) -> Self {
        Self::ProjectWrite(path.as_ref().display().to_string(), e.to_string())
    }

    pub fn no_env_variable(var: &'static str) -> Self {
        Self::MissingVariable(var)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EmptyScene => write!(f, "Scene has no background, nothing to compose"),
            Error::VipsError(e) => write!(f, "libvips error: {e}"),
            Error::CairoError(e) => write!(f, "cairo error: {e}"),
            Error::ImageConversionError(from, to) => {
                write!(f, "Failed to convert image from {from} to {to}")
            }
            Error::FailedOpenImage(path, e) => write!(f, "Failed to open image `{path}`: {e}"),
            Error::FailedWriteImage(path, e) => write!(f, "Failed to write image `{path}`: {e}"),
            Error::UnsupportedFormat(ext) => {
                write!(f, "Unsupported export format `{ext}`, expected jpg, jpeg or png")
            }
            Error::FontconfigUnavailable => write!(f, "Failed to initialize fontconfig"),
            Error::LoadFontError(font) => write!(f, "Failed to load font `{font}`"),
            Error::InvalidCString(s) => write!(f, "String contains a nul byte: {s:?}"),
            Error::ConfigOpen(path, e) => write!(f, "Failed to open config `{path}`: {e}"),
            Error::ConfigDeser(path, e) => write!(f, "Invalid config `{path}`: {e}"),
            Error::ProjectOpen(path, e) => write!(f, "Failed to open project `{path}`: {e}"),
            Error::ProjectDeser(path, e) => write!(f, "Invalid project `{path}`: {e}"),
            Error::ProjectWrite(path, e) => write!(f, "Failed to save project `{path}`: {e}"),
            Error::MissingVariable(e) => write!(f, "Missing environment variable: {e}"),
            Error::LayerNotFound(layer) => write!(f, "No such layer: {layer}"),
            Error::LayerLocked(layer) => write!(f, "Layer is locked: {layer}"),
            Error::NoUndoHistory => write!(f, "No undo history"),
            Error::UnknownTheme(name) => {
                write!(f, "Unknown theme `{name}`, expected Dark, Light or Neon")
            }
            Error::UnknownPreset(name) => write!(f, "Unknown preset `{name}`"),
        }
    }
}

impl std::error::Error for Error {}
