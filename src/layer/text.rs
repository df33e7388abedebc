//! Paints a line of text with a black outline.

use crate::error::Result;
use crate::image::Stroke;
use crate::layer::{Layer, RenderContext};
use crate::scene::TextLayer;

use libvips::VipsImage;

impl TextLayer {
    fn stroke(&self, factor: u32) -> Stroke {
        Stroke::outline(self.bold, factor)
    }

    /// Where the top-left corner of the printed text lands, given the offset of
    /// the text origin inside it. Saturates at the `i32` range.
    fn corner(&self, factor: u32, (ox, oy): (i32, i32)) -> (i32, i32) {
        let place = |pos: i32, off: i32| {
            let v = pos as i64 * factor as i64 - off as i64;
            v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        };
        (place(self.x, ox), place(self.y, oy))
    }
}

impl Layer for TextLayer {
    fn label(&self) -> String {
        format!("text `{}`", self.text)
    }

    fn is_drawable(&self) -> bool {
        self.visible && !self.text.is_empty()
    }

    fn render(&self, img: &VipsImage, ctx: &RenderContext) -> Result<VipsImage> {
        let ib = ctx.backend;
        let size = self.font_size * ctx.factor as f64;
        let (text_img, ox, oy) =
            ib.print(&self.text, ctx.font_map, size, self.color, self.stroke(ctx.factor))?;
        let (x, y) = self.corner(ctx.factor, (ox, oy));
        ib.overlay(img, &text_img, x, y)
    }
}
