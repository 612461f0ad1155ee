//! CSS color values in the two encodings the palette uses.
//!
//! `#rrggbb` hex blends in integer RGB, rounding half away from zero, so
//! `#000000 -> #ffffff` at 0.5 gives `#808080`. `rgba(r, g, b, a)` blends RGB
//! the same way and alpha in floating point, printed to three decimals.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Encoding {
    Hex,
    Rgba,
}

impl Encoding {
    /// Guess from the text alone, so malformed input still picks a fallback.
    pub fn detect(text: &str) -> Self {
        if text.trim_start().to_ascii_lowercase().starts_with("rgb") {
            Self::Rgba
        } else {
            Self::Hex
        }
    }

    /// Zero-intensity, fully opaque.
    pub fn fallback(self) -> Color {
        match self {
            Self::Hex => Color::Hex { r: 0, g: 0, b: 0 },
            Self::Rgba => Color::Rgba {
                r: 0,
                g: 0,
                b: 0,
                a: 1.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum Color {
    Hex { r: u8, g: u8, b: u8 },
    Rgba { r: u8, g: u8, b: u8, a: f64 },
}

impl Color {
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Hex { .. } => Encoding::Hex,
            Self::Rgba { .. } => Encoding::Rgba,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match *self {
            Self::Hex { r, g, b } | Self::Rgba { r, g, b, .. } => [r, g, b],
        }
    }

    pub fn alpha(&self) -> f64 {
        match *self {
            Self::Hex { .. } => 1.0,
            Self::Rgba { a, .. } => a,
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let [r, g, b] = self.rgb();
        [r, g, b, (self.alpha().clamp(0.0, 1.0) * 255.0).round() as u8]
    }

    pub fn parse(text: &str) -> Result<Self, SceneError> {
        let malformed = || SceneError::MalformedColor(text.to_string());
        let trimmed = text.trim();
        match Encoding::detect(trimmed) {
            Encoding::Hex => parse_hex(trimmed).ok_or_else(malformed),
            Encoding::Rgba => parse_rgba(trimmed).ok_or_else(malformed),
        }
    }

    /// Parses `text`, substituting the detected encoding's fallback and
    /// logging when it is malformed.
    pub fn parse_or_fallback(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|err| {
            warn!("{err}; using fallback color");
            Encoding::detect(text).fallback()
        })
    }

    /// Linear blend from `self` to `other`. The result is `rgba` if either end
    /// is, otherwise hex.
    pub fn blend(&self, other: &Color, t: f64) -> Color {
        let [r0, g0, b0] = self.rgb();
        let [r1, g1, b1] = other.rgb();
        let (r, g, b) = (lerp_u8(r0, r1, t), lerp_u8(g0, g1, t), lerp_u8(b0, b1, t));
        match (self.encoding(), other.encoding()) {
            (Encoding::Hex, Encoding::Hex) => Color::Hex { r, g, b },
            _ => {
                let (a0, a1) = (self.alpha(), other.alpha());
                Color::Rgba {
                    r,
                    g,
                    b,
                    a: a0 + (a1 - a0) * t,
                }
            }
        }
    }
}

impl FromStr for Color {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Self::Rgba { r, g, b, a } => write!(f, "rgba({r}, {g}, {b}, {a:.3})"),
        }
    }
}

/// Blends two color strings, each parsed in its own encoding.
pub fn blend_str(from: &str, to: &str, t: f64) -> String {
    Color::parse_or_fallback(from)
        .blend(&Color::parse_or_fallback(to), t)
        .to_string()
}

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (f64::from(a), f64::from(b));
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn parse_hex(text: &str) -> Option<Color> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Hex {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

fn parse_rgba(text: &str) -> Option<Color> {
    let lower = text.to_ascii_lowercase();
    let body = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let a = match parts.get(3) {
        Some(p) => p.parse::<f64>().ok().filter(|a| a.is_finite())?,
        None => 1.0,
    };
    Some(Color::Rgba {
        r: parts[0].parse().ok()?,
        g: parts[1].parse().ok()?,
        b: parts[2].parse().ok()?,
        a,
    })
}
