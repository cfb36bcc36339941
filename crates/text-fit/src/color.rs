//! RGBA colors and color string parsing

use crate::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA color (values 0 - 255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a color from RGBA components
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Black color
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// White color
    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Red color
    pub const fn red() -> Self {
        Self::rgb(255, 0, 0)
    }

    /// Green color
    pub const fn green() -> Self {
        Self::rgb(0, 128, 0)
    }

    /// Blue color
    pub const fn blue() -> Self {
        Self::rgb(0, 0, 255)
    }

    /// Gray color
    pub const fn gray() -> Self {
        Self::rgb(128, 128, 128)
    }

    /// Fully transparent color
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a color specification
    ///
    /// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA` (the leading `#` is optional)
    /// and the names `black`, `white`, `red`, `green`, `blue`, `gray`/`grey`
    /// and `transparent` (case-insensitive).
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(FitError::InvalidColor("empty color".to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::black()),
            "white" => return Ok(Self::white()),
            "red" => return Ok(Self::red()),
            "green" => return Ok(Self::green()),
            "blue" => return Ok(Self::blue()),
            "gray" | "grey" => return Ok(Self::gray()),
            "transparent" => return Ok(Self::transparent()),
            _ => {}
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FitError::InvalidColor(spec.to_string()));
        }

        let byte = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| FitError::InvalidColor(spec.to_string()))
        };
        // Single hex digit expands to a doubled pair (#abc == #aabbcc)
        let nibble = |s: &str| byte(s).map(|v| v * 17);

        match hex.len() {
            3 => Ok(Self::rgb(
                nibble(&hex[0..1])?,
                nibble(&hex[1..2])?,
                nibble(&hex[2..3])?,
            )),
            6 => Ok(Self::rgb(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
            )),
            8 => Ok(Self::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => Err(FitError::InvalidColor(spec.to_string())),
        }
    }

    /// Format as `#RRGGBBAA`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

impl FromStr for Rgba {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rgba {
    type Error = FitError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(color: Rgba) -> Self {
        image::Rgba([color.r, color.g, color.b, color.a])
    }
}

impl From<image::Rgba<u8>> for Rgba {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self::new(r, g, b, a)
    }
}
