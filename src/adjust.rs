//! Background adjustments and the named presets built from them.

use crate::error::{Error, Result};
use crate::image::ImgBackend;

use libvips::VipsImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Enhancement factors, applied in field order. A factor of 1 (0 for blur)
/// leaves the image as is.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub brightness: f64,
    pub contrast: f64,
    pub color: f64,
    pub sharpness: f64,
    /// Gaussian blur sigma, in pixels.
    pub blur: f64,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Adjustments {
    pub const NEUTRAL: Adjustments = Adjustments {
        brightness: 1.0,
        contrast: 1.0,
        color: 1.0,
        sharpness: 1.0,
        blur: 0.0,
    };

    pub const BRIGHTNESS_RANGE: RangeInclusive<f64> = 0.2..=2.0;
    pub const CONTRAST_RANGE: RangeInclusive<f64> = 0.2..=2.0;
    pub const COLOR_RANGE: RangeInclusive<f64> = 0.0..=2.0;
    pub const SHARPNESS_RANGE: RangeInclusive<f64> = 0.0..=4.0;
    pub const BLUR_RANGE: RangeInclusive<f64> = 0.0..=10.0;

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Brings every factor back into the range an editor would offer.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64, r: RangeInclusive<f64>| {
            if v.is_nan() {
                1.0_f64.clamp(*r.start(), *r.end())
            } else {
                v.clamp(*r.start(), *r.end())
            }
        };
        Self {
            brightness: clamp(self.brightness, Self::BRIGHTNESS_RANGE),
            contrast: clamp(self.contrast, Self::CONTRAST_RANGE),
            color: clamp(self.color, Self::COLOR_RANGE),
            sharpness: clamp(self.sharpness, Self::SHARPNESS_RANGE),
            blur: if self.blur.is_nan() {
                0.0
            } else {
                self.blur.clamp(*Self::BLUR_RANGE.start(), *Self::BLUR_RANGE.end())
            },
        }
    }

    /// Returns the adjusted image as 8 bit RGB. `img` is left as is.
    pub fn apply(&self, ib: &ImgBackend, img: &VipsImage) -> Result<VipsImage> {
        let mut out = ib.to_rgb(img)?;
        if self.brightness != 1.0 {
            out = ib.enhance_brightness(&out, self.brightness)?;
        }
        if self.contrast != 1.0 {
            out = ib.enhance_contrast(&out, self.contrast)?;
        }
        if self.color != 1.0 {
            out = ib.enhance_color(&out, self.color)?;
        }
        if self.sharpness != 1.0 {
            out = ib.enhance_sharpness(&out, self.sharpness)?;
        }
        if self.blur > 0.0 {
            out = ib.blur(&out, self.blur)?;
        }
        Ok(out)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Preset {
    Cinematic,
    Bright,
    Gaming,
    Warm,
    Cold,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Cinematic,
        Preset::Bright,
        Preset::Gaming,
        Preset::Warm,
        Preset::Cold,
    ];

    pub fn adjustments(&self) -> Adjustments {
        let (brightness, contrast, color, sharpness, blur) = match self {
            Preset::Cinematic => (1.1, 1.4, 0.8, 2.0, 1.0),
            Preset::Bright => (1.4, 1.2, 1.2, 1.0, 0.0),
            Preset::Gaming => (1.2, 1.5, 1.3, 2.5, 0.0),
            Preset::Warm => (1.1, 1.0, 1.5, 1.5, 0.0),
            Preset::Cold => (0.9, 1.3, 0.7, 1.5, 0.0),
        };
        Adjustments {
            brightness,
            contrast,
            color,
            sharpness,
            blur,
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Cinematic => "Cinematic",
            Preset::Bright => "Bright",
            Preset::Gaming => "Gaming",
            Preset::Warm => "Warm",
            Preset::Cold => "Cold",
        };
        f.write_str(name)
    }
}
