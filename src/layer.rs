//! Implements the layers that can be painted onto a background.

mod overlay;
mod text;

use crate::error::Result;
use crate::image::ImgBackend;
use crate::logs::{LogEvent, Logger};
use crate::scene::Scene;
use crate::text::FontMap;

use core::fmt::Debug;
use libvips::VipsImage;

pub struct RenderContext<'a> {
    pub backend: &'a ImgBackend,
    pub font_map: &'a FontMap,
    /// Integer factor applied to every position and size.
    pub factor: u32,
}

pub trait Layer: Debug {
    /// Human readable name, for log messages.
    fn label(&self) -> String;

    /// Whether rendering this layer would paint anything.
    fn is_drawable(&self) -> bool;

    /// Paints the layer onto `img`, returning a new image. `img` is left as is.
    fn render(&self, img: &VipsImage, ctx: &RenderContext) -> Result<VipsImage>;
}

/// Layers in paint order, bottom first.
#[derive(Debug)]
pub struct LayerStack<'a>(pub Vec<&'a dyn Layer>);

impl<'a> LayerStack<'a> {
    /// Every overlay in list order, followed by every text layer in list order.
    pub fn from_scene(scene: &'a Scene) -> Self {
        let overlays = scene.overlays.iter().map(|o| o as &dyn Layer);
        let texts = scene.text_layers.iter().map(|t| t as &dyn Layer);
        Self(overlays.chain(texts).collect())
    }

    /// Paints every drawable layer onto `base`. A layer that fails to render is
    /// reported and skipped; the layers above it are still painted.
    pub fn render(
        &self,
        base: VipsImage,
        ctx: &RenderContext,
        logger: &mut dyn Logger,
    ) -> VipsImage {
        let LayerStack(layers) = self;
        let mut img = base;
        for layer in layers.iter().filter(|l| l.is_drawable()) {
            match layer.render(&img, ctx) {
                Ok(painted) => img = painted,
                Err(e) => logger.log(LogEvent::Warn(format!(
                    "skipping {}: {e}",
                    layer.label()
                ))),
            }
        }
        img
    }
}
