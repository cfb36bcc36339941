//! Text Fit - auto-fitted, centered text rendered to PNG
//!
//! This crate provides functionality for:
//! - Resolving a font from a process-wide font registry with family fallback
//! - Wrapping and measuring text with center alignment
//! - Shrinking the font size until the text block fits a margin box
//! - Drawing the block centered on a square canvas or on a base image
//! - Encoding the result as PNG
//!
//! # Example
//!
//! ```ignore
//! use text_fit::{FontRegistry, Rgba, TextRenderer};
//!
//! let renderer = TextRenderer::new(FontRegistry::system());
//! let png = renderer.render_square(512, Some("Confidential"), None, Some(Rgba::black()))?;
//! std::fs::write("watermark.png", png)?;
//! ```

mod clock;
mod color;
mod fit;
mod font;
mod layout;
mod options;
mod raster;
mod render;

pub use clock::{Clock, FixedClock, SystemClock, TIMESTAMP_FORMAT};
pub use color::Rgba;
pub use fit::{
    fit_text, FitBox, FittedLayout, LayoutAttempt, Point, TextExtent, TextMeasurer,
    MAX_ATTEMPTS, MIN_FONT_SIZE, MIN_MARGIN, SHRINK_FACTOR,
};
pub use font::{FontHandle, FontRegistry, DEFAULT_FAMILIES};
pub use layout::{layout_text, wrap_lines, Line, TextLayout};
pub use options::RenderOptions;
pub use render::{
    compose_display_text, render_on_image, render_square, Canvas, RenderRequest, TextRenderer,
    MAX_CANVAS_SIZE,
};

use thiserror::Error;

/// Errors that can occur while rendering fitted text
#[derive(Debug, Error)]
pub enum FitError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to decode base image: {0}")]
    DecodeError(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("No fonts available in the font registry")]
    NoFontsAvailable,

    #[error("Failed to load font: {0}")]
    FontLoad(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),
}

/// Result type for text fitting operations
pub type Result<T> = std::result::Result<T, FitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FitError::InvalidArgument("size must be positive".to_string()).to_string(),
            "Invalid argument: size must be positive"
        );
        assert_eq!(
            FitError::NoFontsAvailable.to_string(),
            "No fonts available in the font registry"
        );
    }
}
