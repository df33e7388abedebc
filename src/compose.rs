//! Flattens a scene into a single raster image.

use crate::error::{Error, Result};
use crate::image::ImgBackend;
use crate::layer::{LayerStack, RenderContext};
use crate::logs::{LogEvent, Logger};
use crate::scene::Scene;
use crate::text::FontMap;

use libvips::VipsImage;

/// Sharpness enhancement applied after an upscale, to make up for the
/// softness introduced by resampling.
pub const UPSCALE_SHARPNESS: f64 = 1.5;

pub struct Compositor<'a> {
    pub backend: &'a ImgBackend,
    pub font_map: &'a FontMap,
}

impl<'a> Compositor<'a> {
    pub fn new(backend: &'a ImgBackend, font_map: &'a FontMap) -> Self {
        Self { backend, font_map }
    }

    /// Paints every visible overlay, then every visible text layer, onto a copy of
    /// the scene background. With `upscale > 1` the background is resampled first
    /// and all geometry is multiplied by `upscale`, so the result matches the 1x
    /// render at a higher resolution.
    ///
    /// The result is an 8 bit RGB image the size of the (upscaled) background.
    /// Fails only when the scene has no background: layers that cannot be
    /// rendered are reported to `logger` and skipped.
    pub fn compose(
        &self,
        scene: &Scene,
        upscale: u32,
        logger: &mut dyn Logger,
    ) -> Result<VipsImage> {
        let background = scene.background.as_ref().ok_or(Error::EmptyScene)?;
        let ib = self.backend;
        let factor = if upscale == 0 {
            logger.log(LogEvent::Warn(String::from(
                "upscale factor 0 is not valid, composing at 1x",
            )));
            1
        } else {
            upscale
        };

        let surface = if factor == 1 {
            ib.with_alpha(&background.image)?
        } else {
            let f = factor as f64;
            let img = ib.scale(&background.image, f, f)?;
            ib.with_alpha(&img)?
        };

        let ctx = RenderContext {
            backend: ib,
            font_map: self.font_map,
            factor,
        };
        let stack = LayerStack::from_scene(scene);
        let img = stack.render(surface, &ctx, logger);

        if factor == 1 {
            ib.to_rgb(&img)
        } else {
            ib.enhance_sharpness(&img, UPSCALE_SHARPNESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::pixel;
    use crate::image::Color;
    use crate::logs::Quiet;
    use crate::scene::{Overlay, TextLayer};

    use libvips::ops;

    fn setup() -> (ImgBackend, FontMap) {
        (ImgBackend::new().unwrap(), FontMap::default())
    }

    fn square(ib: &ImgBackend, color: Color, size: i32, x: f64, y: f64) -> Overlay {
        Overlay::new(ib.new_canvas(&color, size, size).unwrap(), "square").at(x, y)
    }

    fn mean_abs_diff(a: &VipsImage, b: &VipsImage) -> f64 {
        let d = ops::subtract(a, b).unwrap();
        let d = ops::abs(&d).unwrap();
        ops::avg(&d).unwrap()
    }

    #[test]
    fn empty_scene_is_an_error() {
        let (ib, fm) = setup();
        let result = Compositor::new(&ib, &fm).compose(&Scene::new(), 1, &mut Quiet);
        assert!(matches!(result, Err(Error::EmptyScene)));
    }

    #[test]
    fn background_only_is_copied_as_is() {
        let (ib, fm) = setup();
        let bg = ib.new_background(&Color::from_rgb8(12, 34, 56), 64, 48).unwrap();
        let expected = bg.image_write_to_memory();
        let scene = Scene::with_background(bg);

        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!((out.get_width(), out.get_height(), out.get_bands()), (64, 48, 3));
        assert_eq!(out.image_write_to_memory(), expected);
        // the scene's own background is untouched
        let bg = &scene.background.as_ref().unwrap().image;
        assert_eq!(bg.get_bands(), 3);
        assert_eq!(bg.image_write_to_memory(), expected);
    }

    #[test]
    fn later_overlays_paint_on_top() {
        let (ib, fm) = setup();
        let mut scene = Scene::with_background(ib.new_background(&Color::BLACK, 50, 50).unwrap());
        scene.overlays.push(square(&ib, Color::opaque(1.0, 0.0, 0.0), 20, 10.0, 10.0));
        scene.overlays.push(square(&ib, Color::opaque(0.0, 0.0, 1.0), 20, 20.0, 20.0));

        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(pixel(&out, 15, 15), vec![255, 0, 0]);
        assert_eq!(pixel(&out, 25, 25), vec![0, 0, 255]);
        assert_eq!(pixel(&out, 35, 35), vec![0, 0, 255]);
        assert_eq!(pixel(&out, 45, 5), vec![0, 0, 0]);

        scene.overlays.swap(0, 1);
        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(pixel(&out, 25, 25), vec![255, 0, 0]);
    }

    #[test]
    fn hidden_layers_change_nothing() {
        let (ib, fm) = setup();
        let bg = ib.new_background(&Color::from_rgb8(40, 80, 120), 60, 40).unwrap();
        let mut scene = Scene::with_background(bg);
        scene.overlays.push(square(&ib, Color::WHITE, 10, 5.0, 5.0));
        let compositor = Compositor::new(&ib, &fm);
        let without = compositor.compose(&scene, 1, &mut Quiet).unwrap();

        let mut hidden = square(&ib, Color::opaque(1.0, 0.0, 0.0), 30, 0.0, 0.0);
        hidden.visible = false;
        scene.overlays.insert(0, hidden);
        scene.text_layers.push(TextLayer {
            text: String::from("HIDDEN"),
            visible: false,
            x: 0,
            y: 0,
            ..Default::default()
        });
        scene.text_layers.push(TextLayer {
            text: String::new(),
            ..Default::default()
        });
        let with = compositor.compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(with.image_write_to_memory(), without.image_write_to_memory());
    }

    #[test]
    fn rotated_overlay_turns_counter_clockwise() {
        let (ib, fm) = setup();
        let mut scene = Scene::with_background(ib.new_background(&Color::BLACK, 100, 100).unwrap());
        // left half red, right half transparent
        let clear = ib.new_canvas(&Color::TRANSPARENT, 40, 20).unwrap();
        let red = ib.new_canvas(&Color::opaque(1.0, 0.0, 0.0), 20, 20).unwrap();
        let mut ov = Overlay::new(ib.overlay(&clear, &red, 0, 0).unwrap(), "half").at(30.0, 30.0);
        ov.angle = 90.0;
        scene.overlays.push(ov);

        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(pixel(&out, 40, 62), vec![255, 0, 0]);
        assert_eq!(pixel(&out, 40, 38), vec![0, 0, 0]);
        assert_eq!(pixel(&out, 60, 40), vec![0, 0, 0]);
    }

    #[test]
    fn text_far_off_the_canvas_is_skipped_quietly() {
        let (ib, fm) = setup();
        let bg = ib.new_background(&Color::from_rgb8(40, 80, 120), 30, 20).unwrap();
        let mut scene = Scene::with_background(bg);
        let compositor = Compositor::new(&ib, &fm);
        let without = compositor.compose(&scene, 2, &mut Quiet).unwrap();

        scene.text_layers.push(TextLayer {
            text: String::from("FAR"),
            x: 1_200_000_000,
            y: 10,
            ..Default::default()
        });
        let mut events: Vec<LogEvent> = Vec::new();
        let with = compositor.compose(&scene, 2, &mut events).unwrap();
        assert!(!events.iter().any(LogEvent::is_warning), "{events:?}");
        assert_eq!(with.image_write_to_memory(), without.image_write_to_memory());
    }

    #[test]
    fn upscaled_composite_matches_1x_geometry() {
        let (ib, fm) = setup();
        let bg = ib.new_background(&Color::from_rgb8(30, 60, 90), 80, 60).unwrap();
        let mut scene = Scene::with_background(bg);
        let mut ov = square(&ib, Color::from_rgb8(220, 200, 20), 16, 30.0, 20.0);
        ov.scale = 1.5;
        scene.overlays.push(ov);

        let compositor = Compositor::new(&ib, &fm);
        let one = compositor.compose(&scene, 1, &mut Quiet).unwrap();
        let two = compositor.compose(&scene, 2, &mut Quiet).unwrap();
        assert_eq!((two.get_width(), two.get_height()), (160, 120));

        let down = ib.scale(&two, 0.5, 0.5).unwrap();
        assert_eq!((down.get_width(), down.get_height()), (80, 60));
        assert!(mean_abs_diff(&down, &one) < 4.0);
        // overlay interior keeps its color at both resolutions
        for p in [pixel(&one, 40, 30), pixel(&two, 80, 60)] {
            assert!((p[0] as i32 - 220).abs() <= 2, "{p:?}");
            assert!((p[1] as i32 - 200).abs() <= 2, "{p:?}");
            assert!((p[2] as i32 - 20).abs() <= 2, "{p:?}");
        }
    }

    #[test]
    fn zero_upscale_is_clamped_with_a_warning() {
        let (ib, fm) = setup();
        let scene = Scene::with_background(ib.new_background(&Color::WHITE, 10, 10).unwrap());
        let mut events: Vec<LogEvent> = Vec::new();
        let out = Compositor::new(&ib, &fm).compose(&scene, 0, &mut events).unwrap();
        assert_eq!(out.get_width(), 10);
        assert!(events.iter().any(LogEvent::is_warning));
    }

    #[test]
    fn transparent_and_opaque_overlays() {
        let (ib, fm) = setup();
        let bg = ib.new_background(&Color::from_rgb8(9, 99, 199), 30, 30).unwrap();
        let mut scene = Scene::with_background(bg);
        scene.overlays.push(square(&ib, Color::TRANSPARENT, 30, 0.0, 0.0));
        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(pixel(&out, 12, 17), vec![9, 99, 199]);

        scene.overlays.push(square(&ib, Color::from_rgb8(1, 2, 3), 10, 10.0, 10.0));
        let out = Compositor::new(&ib, &fm).compose(&scene, 1, &mut Quiet).unwrap();
        assert_eq!(pixel(&out, 12, 17), vec![1, 2, 3]);
        assert_eq!(pixel(&out, 25, 25), vec![9, 99, 199]);
    }
}
