//! Rendering entry points

use crate::clock::{Clock, SystemClock};
use crate::fit::fit_text;
use crate::font::{FontRegistry, DEFAULT_FAMILIES};
use crate::layout::layout_text;
use crate::raster::{decode_image, draw_layout, encode_png, filled_canvas};
use crate::{FitError, FittedLayout, Result, Rgba};
use image::RgbaImage;
use log::debug;

/// Largest accepted square canvas side, in pixels
pub const MAX_CANVAS_SIZE: u32 = 16384;

/// Surface the text is drawn on
#[derive(Debug, Clone)]
pub enum Canvas {
    /// Fresh square canvas filled with `background`
    Square { size: u32, background: Rgba },
    /// Existing image; text is fitted into the square inscribed at its top-left
    Image(RgbaImage),
}

impl Canvas {
    /// Square canvas, validating the side length
    pub fn square(size: u32, background: Rgba) -> Result<Self> {
        if size == 0 {
            return Err(FitError::InvalidArgument(
                "canvas size must be positive".to_string(),
            ));
        }
        if size > MAX_CANVAS_SIZE {
            return Err(FitError::InvalidArgument(format!(
                "canvas size {size} exceeds the maximum of {MAX_CANVAS_SIZE}"
            )));
        }
        Ok(Self::Square { size, background })
    }

    /// Canvas from encoded image bytes (PNG, JPEG, GIF, BMP, WebP)
    pub fn from_encoded(data: &[u8]) -> Result<Self> {
        Self::from_image(decode_image(data)?)
    }

    /// Canvas from an already decoded image
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FitError::InvalidArgument(
                "base image has no pixels".to_string(),
            ));
        }
        Ok(Self::Image(image))
    }

    /// Side length of the square the text is fitted into
    pub fn fit_size(&self) -> u32 {
        match self {
            Canvas::Square { size, .. } => *size,
            Canvas::Image(image) => image.width().min(image.height()),
        }
    }

    /// Pixel dimensions of the produced image
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Canvas::Square { size, .. } => (*size, *size),
            Canvas::Image(image) => image.dimensions(),
        }
    }

    fn into_pixels(self) -> RgbaImage {
        match self {
            Canvas::Square { size, background } => filled_canvas(size, size, background),
            Canvas::Image(image) => image,
        }
    }
}

/// Everything needed for one render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub canvas: Canvas,
    pub text: String,
    pub foreground: Rgba,
}

impl RenderRequest {
    pub fn new(canvas: Canvas, text: Option<&str>, foreground: Option<Rgba>) -> Self {
        Self {
            canvas,
            text: text.unwrap_or_default().to_string(),
            foreground: foreground.unwrap_or_default(),
        }
    }
}

/// Timestamp line followed by the trimmed user text
pub fn compose_display_text(timestamp: &str, text: &str) -> String {
    format!("{timestamp}\n{}", text.trim())
}

/// Renders fitted text using a font registry and a clock
pub struct TextRenderer<'a, C = SystemClock> {
    fonts: &'a FontRegistry,
    clock: C,
    families: Vec<String>,
}

impl<'a> TextRenderer<'a, SystemClock> {
    /// Renderer using the wall clock and [`DEFAULT_FAMILIES`]
    pub fn new(fonts: &'a FontRegistry) -> Self {
        Self {
            fonts,
            clock: SystemClock,
            families: DEFAULT_FAMILIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl<'a, C: Clock> TextRenderer<'a, C> {
    /// Replace the timestamp source
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TextRenderer<'a, C2> {
        TextRenderer {
            fonts: self.fonts,
            clock,
            families: self.families,
        }
    }

    /// Replace the ordered family preference list
    ///
    /// An empty list keeps the current preferences.
    pub fn with_families<S: AsRef<str>>(mut self, families: &[S]) -> Self {
        if !families.is_empty() {
            self.families = families.iter().map(|s| s.as_ref().to_string()).collect();
        }
        self
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Render text centered on a new `size` x `size` canvas
    pub fn render_square(
        &self,
        size: u32,
        text: Option<&str>,
        background: Option<Rgba>,
        foreground: Option<Rgba>,
    ) -> Result<Vec<u8>> {
        let canvas = Canvas::square(size, background.unwrap_or(Rgba::white()))?;
        self.render(RenderRequest::new(canvas, text, foreground))
    }

    /// Render text onto an encoded base image, keeping its dimensions
    pub fn render_on_image(
        &self,
        image: &[u8],
        text: Option<&str>,
        foreground: Option<Rgba>,
    ) -> Result<Vec<u8>> {
        let canvas = Canvas::from_encoded(image)?;
        self.render(RenderRequest::new(canvas, text, foreground))
    }

    /// Render a request to PNG bytes
    pub fn render(&self, request: RenderRequest) -> Result<Vec<u8>> {
        let (pixels, _) = self.render_pixels(request)?;
        encode_png(pixels)
    }

    /// Render a request and return the raw canvas with the layout that was used
    pub fn render_pixels(&self, request: RenderRequest) -> Result<(RgbaImage, FittedLayout)> {
        let display_text = compose_display_text(&self.clock.timestamp(), &request.text);
        let fit_size = request.canvas.fit_size();

        let font = self.fonts.resolve(self.families.as_slice())?;
        let fitted = fit_text(&font, &display_text, fit_size);
        let layout = layout_text(
            &font,
            &display_text,
            fitted.font_size(),
            fitted.attempt.wrap_width,
        );

        let mut pixels = request.canvas.into_pixels();
        draw_layout(
            &mut pixels,
            &font,
            &layout,
            fitted.origin,
            request.foreground,
        );
        debug!(
            "rendered {} line(s) with '{}' at {:.2}px onto {}x{}",
            layout.lines.len(),
            font.family(),
            fitted.font_size(),
            pixels.width(),
            pixels.height()
        );

        Ok((pixels, fitted))
    }
}

/// Render onto a square canvas with the system fonts and the wall clock
pub fn render_square(
    size: u32,
    text: Option<&str>,
    background: Option<Rgba>,
    foreground: Option<Rgba>,
) -> Result<Vec<u8>> {
    TextRenderer::new(FontRegistry::system()).render_square(size, text, background, foreground)
}

/// Render onto an encoded base image with the system fonts and the wall clock
pub fn render_on_image(image: &[u8], text: Option<&str>, foreground: Option<Rgba>) -> Result<Vec<u8>> {
    TextRenderer::new(FontRegistry::system()).render_on_image(image, text, foreground)
}
