//! The scene: a background, overlays and text layers, in paint order.

use crate::image::Color;

use libvips::VipsImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub struct Background {
    pub image: VipsImage,
    pub path: Option<PathBuf>,
}

impl Background {
    pub fn new(image: VipsImage, path: Option<PathBuf>) -> Self {
        Self { image, path }
    }

    pub fn size(&self) -> (i32, i32) {
        (self.image.get_width(), self.image.get_height())
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Background")
            .field("size", &self.size())
            .field("path", &self.path)
            .finish()
    }
}

/// An RGBA image placed on the background.
pub struct Overlay {
    pub image: VipsImage,
    pub path: Option<PathBuf>,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Counter-clockwise, in degrees.
    pub angle: f64,
    pub visible: bool,
    pub locked: bool,
}

impl Overlay {
    pub fn new(image: VipsImage, name: impl Into<String>) -> Self {
        Self {
            image,
            path: None,
            name: name.into(),
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            angle: 0.0,
            visible: true,
            locked: false,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Size of the overlay once scaled, before rotation.
    pub fn scaled_size(&self) -> (f64, f64) {
        let s = self.scale.max(0.0);
        (
            self.image.get_width() as f64 * s,
            self.image.get_height() as f64 * s,
        )
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("name", &self.name)
            .field("size", &(self.image.get_width(), self.image.get_height()))
            .field("path", &self.path)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("scale", &self.scale)
            .field("angle", &self.angle)
            .field("visible", &self.visible)
            .field("locked", &self.locked)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_bold")]
    pub bold: i32,
    #[serde(default = "default_color")]
    pub color: Color,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_font_size() -> f64 {
    80.0
}

fn default_bold() -> i32 {
    2
}

const fn default_color() -> Color {
    Color::WHITE
}

fn default_true() -> bool {
    true
}

impl Default for TextLayer {
    fn default() -> Self {
        Self {
            text: String::from("New Text"),
            font_size: default_font_size(),
            bold: default_bold(),
            color: default_color(),
            x: 200,
            y: 300,
            visible: true,
            locked: false,
        }
    }
}

/// Points at one layer of a scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerRef {
    Overlay(usize),
    Text(usize),
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlay(i) => write!(f, "overlay #{i}"),
            Self::Text(i) => write!(f, "text #{i}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub background: Option<Background>,
    pub overlays: Vec<Overlay>,
    pub text_layers: Vec<TextLayer>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(image: VipsImage) -> Self {
        Self {
            background: Some(Background::new(image, None)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.background.is_none()
    }

    /// References to every layer, bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = LayerRef> + '_ {
        (0..self.overlays.len())
            .map(LayerRef::Overlay)
            .chain((0..self.text_layers.len()).map(LayerRef::Text))
    }

    pub fn contains(&self, layer: LayerRef) -> bool {
        match layer {
            LayerRef::Overlay(i) => i < self.overlays.len(),
            LayerRef::Text(i) => i < self.text_layers.len(),
        }
    }

    pub fn is_visible(&self, layer: LayerRef) -> Option<bool> {
        match layer {
            LayerRef::Overlay(i) => self.overlays.get(i).map(|o| o.visible),
            LayerRef::Text(i) => self.text_layers.get(i).map(|t| t.visible),
        }
    }

    pub fn is_locked(&self, layer: LayerRef) -> Option<bool> {
        match layer {
            LayerRef::Overlay(i) => self.overlays.get(i).map(|o| o.locked),
            LayerRef::Text(i) => self.text_layers.get(i).map(|t| t.locked),
        }
    }
}
