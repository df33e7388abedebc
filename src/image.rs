//! Image backend implementations.

mod color;
mod export;
mod stroke;

use crate::error::{Error, Result};
pub use crate::image::color::Color;
pub use crate::image::export::ExportFormat;
pub use crate::image::stroke::Stroke;
use crate::text::FontMap;

use cairo::ImageSurface;
use libvips::{ops, VipsApp, VipsImage};
use pango::prelude::FontMapExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Weights of the 3x3 "smooth" filter that sharpness enhancement blends away from.
const SMOOTH_KERNEL: [f64; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];
const SMOOTH_SCALE: f64 = 13.0;

/// Rec. 601 luma weights.
const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// libvips is initialized once per process and never shut down while the
/// process runs: dropping a `VipsApp` tears down the whole library.
fn vips_app() -> Result<&'static VipsApp> {
    static APP: OnceLock<std::result::Result<VipsApp, String>> = OnceLock::new();
    APP.get_or_init(|| VipsApp::default("thumbstudio").map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| Error::VipsError(e.clone()))
}

pub struct ImgBackend {
    vips_app: &'static VipsApp,
    jpeg_quality: i32,
}

impl ImgBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            vips_app: vips_app()?,
            jpeg_quality: 95,
        })
    }

    pub fn with_jpeg_quality(mut self, quality: i32) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn err(&self, e: libvips::error::Error) -> Error {
        Error::VipsError(format!(
            "{e}\n{}",
            self.vips_app.error_buffer().unwrap_or_default()
        ))
    }

    /// Casts to 8 bit sRGB, keeping the number of bands.
    fn reinterpret(&self, img: &VipsImage) -> Result<VipsImage> {
        let img = ops::cast(img, ops::BandFormat::Uchar).map_err(|e| self.err(e))?;
        ops::copy_with_opts(
            &img,
            &ops::CopyOptions {
                interpretation: ops::Interpretation::Srgb,
                width: img.get_width(),
                height: img.get_height(),
                bands: img.get_bands(),
                format: ops::BandFormat::Uchar,
                ..Default::default()
            },
        )
        .map_err(|e| self.err(e))
    }

    /// Adds an opaque alpha band to RGB images.
    pub fn with_alpha(&self, img: &VipsImage) -> Result<VipsImage> {
        let img = self.reinterpret(img)?;
        if img.get_bands() == 3 {
            let img = ops::bandjoin_const(&img, &mut [255.0]).map_err(|e| self.err(e))?;
            self.reinterpret(&img)
        } else {
            Ok(img)
        }
    }

    /// Keeps only the color bands, discarding alpha.
    pub fn to_rgb(&self, img: &VipsImage) -> Result<VipsImage> {
        if img.get_bands() > 3 {
            let rgb = ops::extract_band_with_opts(img, 0, &ops::ExtractBandOptions { n: 3 })
                .map_err(|e| self.err(e))?;
            self.reinterpret(&rgb)
        } else {
            self.reinterpret(img)
        }
    }

    pub fn new_canvas(&self, bg: &Color, width: i32, height: i32) -> Result<VipsImage> {
        let (r, g, b, a) = bg.scaled_rgba();
        let img = ops::black_with_opts(width, height, &ops::BlackOptions { bands: 4 })
            .map_err(|e| self.err(e))?;
        let img = VipsImage::new_from_image(&img, &[r, g, b, a]).map_err(|e| self.err(e))?;
        self.reinterpret(&img)
    }

    /// A solid, opaque RGB image.
    pub fn new_background(&self, bg: &Color, width: i32, height: i32) -> Result<VipsImage> {
        let (r, g, b) = bg.scaled_rgb();
        let img = ops::black_with_opts(width, height, &ops::BlackOptions { bands: 3 })
            .map_err(|e| self.err(e))?;
        let img = VipsImage::new_from_image(&img, &[r, g, b]).map_err(|e| self.err(e))?;
        self.reinterpret(&img)
    }

    pub fn cairo_to_vips(&self, img: ImageSurface) -> Result<VipsImage> {
        let mut buffer = Vec::new();
        img.write_to_png(&mut buffer)
            .map_err(|_| Error::ImageConversionError("cairo", "vips"))?;
        let mut img = VipsImage::new_from_buffer(&buffer, "").map_err(|e| self.err(e))?;
        img.image_wio_input().map_err(|e| self.err(e))?;
        self.with_alpha(&img)
    }

    fn load(&self, path: &Path) -> Result<VipsImage> {
        let fp = path.to_string_lossy();
        let img = VipsImage::new_from_file(&fp).map_err(|e| Error::failed_open(path, e))?;
        ops::colourspace(&img, ops::Interpretation::Srgb).map_err(|e| self.err(e))
    }

    /// Opens an overlay image as 8 bit RGBA.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<VipsImage> {
        let img = self.load(path.as_ref())?;
        self.with_alpha(&img)
    }

    /// Opens a background image as 8 bit RGB. Any alpha band is dropped.
    pub fn open_background(&self, path: impl AsRef<Path>) -> Result<VipsImage> {
        let img = self.load(path.as_ref())?;
        self.to_rgb(&img)
    }

    /// High quality (Lanczos3) resampling by independent horizontal and vertical factors.
    pub fn scale(&self, img: &VipsImage, sx: f64, sy: f64) -> Result<VipsImage> {
        let options = ops::ResizeOptions {
            vscale: sy,
            kernel: ops::Kernel::Lanczos3,
            ..Default::default()
        };
        if img.get_bands() == 4 {
            let img = ops::premultiply(img).map_err(|e| self.err(e))?;
            let img = ops::resize_with_opts(&img, sx, &options).map_err(|e| self.err(e))?;
            let img = ops::unpremultiply(&img).map_err(|e| self.err(e))?;
            self.reinterpret(&img)
        } else {
            let img = ops::resize_with_opts(img, sx, &options).map_err(|e| self.err(e))?;
            self.reinterpret(&img)
        }
    }

    /// Resamples to an exact size. Sizes below one pixel are clamped to one.
    pub fn resize_to(&self, img: &VipsImage, width: i32, height: i32) -> Result<VipsImage> {
        let (w, h) = (width.max(1), height.max(1));
        let (iw, ih) = (img.get_width() as f64, img.get_height() as f64);
        if w == img.get_width() && h == img.get_height() {
            return self.reinterpret(img);
        }
        self.scale(img, w as f64 / iw, h as f64 / ih)
    }

    /// Rotates counter-clockwise about the image center. The canvas grows to fit
    /// the rotated corners and the uncovered area is transparent.
    pub fn rotate(&self, img: &VipsImage, deg: f64) -> Result<VipsImage> {
        let img = self.with_alpha(img)?;
        if deg.rem_euclid(360.0) == 0.0 {
            return Ok(img);
        }
        // y grows downwards, so this matrix turns the picture counter-clockwise
        let (sin, cos) = deg.to_radians().sin_cos();
        let img = ops::premultiply(&img).map_err(|e| self.err(e))?;
        let img = ops::affine(&img, cos, sin, -sin, cos).map_err(|e| self.err(e))?;
        let img = ops::unpremultiply(&img).map_err(|e| self.err(e))?;
        self.reinterpret(&img)
    }

    /// Alpha-composites `src` over `base` with the top-left corner of `src` at `(x, y)`.
    /// A `src` lying entirely off the canvas leaves `base` as is.
    pub fn overlay(&self, base: &VipsImage, src: &VipsImage, x: i32, y: i32) -> Result<VipsImage> {
        let (bw, bh) = (base.get_width(), base.get_height());
        let base = self.with_alpha(base)?;
        let right = x as i64 + src.get_width() as i64;
        let bottom = y as i64 + src.get_height() as i64;
        if right <= 0 || bottom <= 0 || x >= bw || y >= bh {
            return Ok(base);
        }
        let src = self.with_alpha(src)?;
        let src = ops::embed(&src, x, y, bw, bh).map_err(|e| self.err(e))?;
        let img = ops::composite_2(&base, &src, ops::BlendMode::Over).map_err(|e| self.err(e))?;
        self.reinterpret(&img)
    }

    /// `degenerate + factor * (img - degenerate)`, band by band.
    fn blend(&self, degenerate: &VipsImage, img: &VipsImage, factor: f64) -> Result<VipsImage> {
        let a = ops::linear(degenerate, &mut [1.0 - factor], &mut [0.0]).map_err(|e| self.err(e))?;
        let b = ops::linear(img, &mut [factor], &mut [0.0]).map_err(|e| self.err(e))?;
        let out = ops::add(&a, &b).map_err(|e| self.err(e))?;
        self.reinterpret(&out)
    }

    /// Scales every color value towards black.
    pub fn enhance_brightness(&self, img: &VipsImage, factor: f64) -> Result<VipsImage> {
        let img = self.to_rgb(img)?;
        let out = ops::linear(&img, &mut [factor], &mut [0.0]).map_err(|e| self.err(e))?;
        self.reinterpret(&out)
    }

    /// Moves every color value away from (or towards) the mean luma.
    pub fn enhance_contrast(&self, img: &VipsImage, factor: f64) -> Result<VipsImage> {
        let img = self.to_rgb(img)?;
        let mut mean = 0.0;
        for (band, weight) in LUMA.iter().enumerate() {
            let channel = ops::extract_band(&img, band as i32).map_err(|e| self.err(e))?;
            mean += weight * ops::avg(&channel).map_err(|e| self.err(e))?;
        }
        let mean = mean.round();
        let out = ops::linear(&img, &mut [factor], &mut [mean * (1.0 - factor)])
            .map_err(|e| self.err(e))?;
        self.reinterpret(&out)
    }

    /// Saturation: blends with the per-pixel grayscale version of the image.
    pub fn enhance_color(&self, img: &VipsImage, factor: f64) -> Result<VipsImage> {
        let img = self.to_rgb(img)?;
        let weights =
            VipsImage::image_new_matrix_from_array(3, 1, &LUMA).map_err(|e| self.err(e))?;
        let gray = ops::recomb(&img, &weights).map_err(|e| self.err(e))?;
        let gray = ops::linear(&gray, &mut [1.0, 1.0, 1.0], &mut [0.0, 0.0, 0.0])
            .map_err(|e| self.err(e))?;
        self.blend(&gray, &img, factor)
    }

    /// Blends with the image filtered by the 3x3 smooth kernel. Factors above one sharpen.
    pub fn enhance_sharpness(&self, img: &VipsImage, factor: f64) -> Result<VipsImage> {
        let img = self.to_rgb(img)?;
        let weights: Vec<f64> = SMOOTH_KERNEL.iter().map(|w| w / SMOOTH_SCALE).collect();
        let mask =
            VipsImage::image_new_matrix_from_array(3, 3, &weights).map_err(|e| self.err(e))?;
        let smooth = ops::conv_with_opts(
            &img,
            &mask,
            &ops::ConvOptions {
                precision: ops::Precision::Float,
                ..Default::default()
            },
        )
        .map_err(|e| self.err(e))?;
        self.blend(&smooth, &img, factor)
    }

    pub fn blur(&self, img: &VipsImage, sigma: f64) -> Result<VipsImage> {
        if sigma <= 0.0 {
            return self.reinterpret(img);
        }
        let out = ops::gaussblur(img, sigma).map_err(|e| self.err(e))?;
        self.reinterpret(&out)
    }

    /// Rasterizes `text` with an outline and returns the image together with the
    /// offset of the text origin inside it.
    pub fn print(
        &self,
        text: &str,
        fm: &FontMap,
        size: f64,
        color: Color,
        stroke: Stroke,
    ) -> Result<(VipsImage, i32, i32)> {
        let err = |e: cairo::Error| Error::CairoError(e.to_string());
        let ctx = pangocairo::FontMap::new().create_context();
        let layout = pango::Layout::new(&ctx);

        let mut opt = cairo::FontOptions::new().map_err(err)?;
        opt.set_antialias(cairo::Antialias::Good);
        pangocairo::functions::context_set_font_options(&ctx, Some(&opt));

        layout.set_font_description(Some(&fm.description(size)));
        layout.set_text(text);

        let (ink, logical) = layout.pixel_extents();
        let left = ink.x().min(logical.x());
        let top = ink.y().min(logical.y());
        let right = (ink.x() + ink.width()).max(logical.x() + logical.width());
        let bottom = (ink.y() + ink.height()).max(logical.y() + logical.height());
        let pad = stroke.size;
        let (ox, oy) = (pad - left, pad - top);

        let surface = cairo::ImageSurface::create(
            cairo::Format::ARgb32,
            (right - left + 2 * pad).max(1),
            (bottom - top + 2 * pad).max(1),
        )
        .map_err(err)?;
        {
            let cr = cairo::Context::new(&surface).map_err(err)?;
            let (r, g, b, a) = stroke.color.rgba();
            cr.set_source_rgba(r, g, b, a);
            for (dx, dy) in stroke.offsets() {
                cr.move_to((ox + dx) as f64, (oy + dy) as f64);
                pangocairo::functions::show_layout(&cr, &layout);
            }
            let (r, g, b, a) = color.rgba();
            cr.set_source_rgba(r, g, b, a);
            cr.move_to(ox as f64, oy as f64);
            pangocairo::functions::show_layout(&cr, &layout);
        }
        surface.flush();
        Ok((self.cairo_to_vips(surface)?, ox, oy))
    }

    /// Writes the image, picking the encoder from the file extension. A path
    /// without an extension is saved as JPEG. Returns the path written.
    pub fn write(&self, img: &VipsImage, path: impl AsRef<Path>) -> Result<PathBuf> {
        let mut path = path.as_ref().to_path_buf();
        let format = ExportFormat::from_path(&path)?;
        if path.extension().is_none() {
            path.set_extension(format.extension());
        }
        let fp = path.to_string_lossy().to_string();
        match format {
            ExportFormat::Jpeg => {
                let img = self.to_rgb(img)?;
                ops::jpegsave_with_opts(
                    &img,
                    &fp,
                    &ops::JpegsaveOptions {
                        q: self.jpeg_quality,
                        ..Default::default()
                    },
                )
                .map_err(|e| Error::failed_write(&path, self.err(e)))?;
            }
            ExportFormat::Png => {
                let img = self.reinterpret(img)?;
                ops::pngsave(&img, &fp).map_err(|e| Error::failed_write(&path, self.err(e)))?;
            }
        }
        Ok(path)
    }
}
