//! Implements utilities to create color values.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: Option<f64>,
}

/// Basic named colors accepted in place of a hex value.
const NAMED: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("lime", (0, 255, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("pink", (255, 192, 203)),
    ("gold", (255, 215, 0)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("maroon", (128, 0, 0)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("olive", (128, 128, 0)),
];

impl Color {
    pub const BLACK: Color = Color::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::opaque(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: Some(0.0),
    };

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: None }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::opaque(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn rgb(&self) -> (f64, f64, f64) {
        (self.r, self.g, self.b)
    }

    pub fn scaled_rgb(&self) -> (f64, f64, f64) {
        (self.r * 255.0, self.g * 255.0, self.b * 255.0)
    }

    pub fn rgba(&self) -> (f64, f64, f64, f64) {
        (self.r, self.g, self.b, self.a.unwrap_or(1.0))
    }

    pub fn scaled_rgba(&self) -> (f64, f64, f64, f64) {
        (
            self.r * 255.0,
            self.g * 255.0,
            self.b * 255.0,
            self.a.map(|a| a * 255.0).unwrap_or(255.0),
        )
    }

    pub fn has_alpha(&self) -> bool {
        self.a.is_some()
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, (r, g, b))| Self::from_rgb8(r, g, b))
    }
}

impl FromStr for Color {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(color) = Self::from_name(s) {
            return Ok(color);
        }
        let re =
            Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})?$")
                .map_err(|_| "invalid color pattern")?;

        let captures = re
            .captures(s.trim())
            .ok_or("string not a color name or in form #RRGGBB or #RRGGBBAA")?;
        let channel = |i: usize| {
            captures
                .get(i)
                .and_then(|m| u8::from_str_radix(m.as_str(), 16).ok())
                .map(|x| x as f64 / 255.0)
        };
        Ok(Color {
            r: channel(1).unwrap_or(0.0),
            g: channel(2).unwrap_or(0.0),
            b: channel(3).unwrap_or(0.0),
            a: channel(4),
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b, a } = *self;
        let r = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
        if let Some(a) = a {
            let a = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
        }
    }
}

struct ColorVisitor;

impl<'de> Visitor<'de> for ColorVisitor {
    type Value = Color;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a color name or a string in the form #RRGGBBAA or #RRGGBB")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse::<Color>().map_err(|e| E::custom(e))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Color, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ColorVisitor)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
