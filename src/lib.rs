//! # Thumbstudio
//!
//! A library to compose thumbnails from a background, image overlays and
//! outlined text, and export them as JPEG or PNG.

pub mod adjust;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod error;
pub mod image;
pub mod layer;
pub mod logs;
pub mod project;
pub mod scene;
pub mod snap;
pub mod store;
pub mod text;

pub use compose::Compositor;
pub use error::{Error, Result};
pub use project::ProjectFile;
pub use scene::Scene;
pub use snap::snap;
pub use store::SceneStore;
