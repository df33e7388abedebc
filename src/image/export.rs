//! Output format selection.

use crate::error::{Error, Result};

use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
    Png,
}

impl ExportFormat {
    /// Picks the encoder from the destination extension, case-insensitively.
    /// Paths without an extension default to JPEG.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        match path.as_ref().extension() {
            None => Ok(Self::Jpeg),
            Some(ext) => {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                match ext.as_str() {
                    "jpg" | "jpeg" => Ok(Self::Jpeg),
                    "png" => Ok(Self::Png),
                    _ => Err(Error::UnsupportedFormat(ext)),
                }
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}
