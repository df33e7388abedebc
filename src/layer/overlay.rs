//! Paints a scaled, rotated RGBA overlay.

use crate::error::Result;
use crate::layer::{Layer, RenderContext};
use crate::scene::Overlay;

use libvips::VipsImage;

impl Overlay {
    /// Pixel size after scaling by `scale * factor`, never below 1x1.
    pub fn target_size(&self, factor: u32) -> (i32, i32) {
        let s = self.scale.max(0.0) * factor as f64;
        let w = (self.image.get_width() as f64 * s).floor() as i32;
        let h = (self.image.get_height() as f64 * s).floor() as i32;
        (w.max(1), h.max(1))
    }
}

impl Layer for Overlay {
    fn label(&self) -> String {
        format!("overlay `{}`", self.name)
    }

    fn is_drawable(&self) -> bool {
        self.visible
    }

    fn render(&self, img: &VipsImage, ctx: &RenderContext) -> Result<VipsImage> {
        let ib = ctx.backend;
        let f = ctx.factor as f64;
        let (w, h) = self.target_size(ctx.factor);
        let overlay = ib.resize_to(&self.image, w, h)?;
        let overlay = if self.angle != 0.0 {
            ib.rotate(&overlay, self.angle)?
        } else {
            ib.with_alpha(&overlay)?
        };
        let (x, y) = ((self.x * f).trunc() as i32, (self.y * f).trunc() as i32);
        ib.overlay(img, &overlay, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::pixel;
    use crate::image::{Color, ImgBackend};
    use crate::text::FontMap;

    fn ctx<'a>(ib: &'a ImgBackend, fm: &'a FontMap, factor: u32) -> RenderContext<'a> {
        RenderContext {
            backend: ib,
            font_map: fm,
            factor,
        }
    }

    #[test]
    fn target_size_is_floored_and_clamped() {
        let ib = ImgBackend::new().unwrap();
        let img = ib.new_canvas(&Color::WHITE, 10, 7).unwrap();
        let mut ov = Overlay::new(img, "logo");
        ov.scale = 0.55;
        assert_eq!(ov.target_size(1), (5, 3));
        assert_eq!(ov.target_size(2), (11, 7));
        ov.scale = 0.0;
        assert_eq!(ov.target_size(2), (1, 1));
        ov.scale = -1.0;
        assert_eq!(ov.target_size(1), (1, 1));
    }

    #[test]
    fn paints_at_scaled_position() {
        let ib = ImgBackend::new().unwrap();
        let fm = FontMap::default();
        let base = ib.new_background(&Color::BLACK, 40, 40).unwrap();
        let img = ib.new_canvas(&Color::WHITE, 4, 4).unwrap();
        let ov = Overlay::new(img, "square").at(5.0, 6.0);

        let out = ov.render(&base, &ctx(&ib, &fm, 1)).unwrap();
        assert_eq!(pixel(&out, 6, 7)[0], 255);
        assert_eq!(pixel(&out, 4, 7)[0], 0);
        assert_eq!(pixel(&out, 10, 7)[0], 0);

        let base = ib.new_background(&Color::BLACK, 80, 80).unwrap();
        let out = ov.render(&base, &ctx(&ib, &fm, 2)).unwrap();
        assert_eq!(pixel(&out, 11, 13)[0], 255);
        assert_eq!(pixel(&out, 17, 19)[0], 255);
        assert_eq!(pixel(&out, 18, 13)[0], 0);
    }

    #[test]
    fn hidden_overlay_is_not_drawable() {
        let ib = ImgBackend::new().unwrap();
        let img = ib.new_canvas(&Color::WHITE, 4, 4).unwrap();
        let mut ov = Overlay::new(img, "square");
        assert!(ov.is_drawable());
        ov.visible = false;
        assert!(!ov.is_drawable());
    }
}
