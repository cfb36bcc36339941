//! Render options as received from callers (JSON / JS objects)

use crate::clock::Clock;
use crate::font::FontRegistry;
use crate::render::{TextRenderer, MAX_CANVAS_SIZE};
use crate::{FitError, Result, Rgba};
use serde::{Deserialize, Serialize};

fn default_size() -> i64 {
    512
}

/// Caller-facing render configuration
///
/// Every field is optional in the serialized form:
///
/// ```json
/// { "size": 512, "text": "Confidential", "background": "#FFFFFF", "foreground": "black" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Square canvas side length in pixels (ignored when rendering on an image)
    #[serde(default = "default_size")]
    pub size: i64,

    /// User text shown under the timestamp line
    pub text: Option<String>,

    /// Canvas fill color, white when absent
    pub background: Option<Rgba>,

    /// Text color, black when absent
    pub foreground: Option<Rgba>,

    /// Ordered font family preferences; empty means the built-in defaults
    pub font_families: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: default_size(),
            text: None,
            background: None,
            foreground: None,
            font_families: Vec::new(),
        }
    }
}

impl RenderOptions {
    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        parse_json(json)
    }

    /// Renderer over `fonts` honoring [`RenderOptions::font_families`]
    pub fn renderer<'a>(&self, fonts: &'a FontRegistry) -> TextRenderer<'a> {
        TextRenderer::new(fonts).with_families(self.font_families.as_slice())
    }

    /// Canvas size as a validated pixel count
    pub fn canvas_size(&self) -> Result<u32> {
        if self.size <= 0 {
            return Err(FitError::InvalidArgument(format!(
                "size must be positive, got {}",
                self.size
            )));
        }
        u32::try_from(self.size)
            .ok()
            .filter(|size| *size <= MAX_CANVAS_SIZE)
            .ok_or_else(|| {
                FitError::InvalidArgument(format!(
                    "size {} exceeds the maximum of {MAX_CANVAS_SIZE}",
                    self.size
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        self.canvas_size().map(|_| ())
    }

    /// Render a square canvas with these options
    pub fn render_square<C: Clock>(&self, renderer: &TextRenderer<'_, C>) -> Result<Vec<u8>> {
        renderer.render_square(
            self.canvas_size()?,
            self.text.as_deref(),
            self.background,
            self.foreground,
        )
    }

    /// Render onto an encoded base image with these options
    pub fn render_on_image<C: Clock>(
        &self,
        renderer: &TextRenderer<'_, C>,
        image: &[u8],
    ) -> Result<Vec<u8>> {
        renderer.render_on_image(image, self.text.as_deref(), self.foreground)
    }
}

const COLOR_FIELDS: [&str; 2] = ["background", "foreground"];

/// Color fields are parsed up front so their failures keep the `InvalidColor`
/// variant; every other decoding failure is an `InvalidArgument`
fn parse_json(json: &str) -> Result<RenderOptions> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| FitError::InvalidArgument(e.to_string()))?;

    for field in COLOR_FIELDS {
        if let Some(spec) = value.get(field).and_then(serde_json::Value::as_str) {
            Rgba::parse(spec)?;
        }
    }

    serde_json::from_value(value).map_err(|e| FitError::InvalidArgument(e.to_string()))
}
