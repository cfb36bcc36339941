//! Font size search
//!
//! Starting from a font size proportional to the canvas, the size is shrunk
//! geometrically until the measured text block fits the margin box, the
//! attempt budget runs out, or the next size would fall under the legibility
//! floor. An oversized layout is accepted rather than reported as an error.

use log::{debug, warn};

/// Smallest margin between the canvas edge and the fitting box, in pixels
pub const MIN_MARGIN: u32 = 20;

/// The margin is `canvas / MARGIN_DIVISOR` once that exceeds [`MIN_MARGIN`]
pub const MARGIN_DIVISOR: u32 = 20;

/// Initial font size is `canvas / INITIAL_SIZE_DIVISOR`
pub const INITIAL_SIZE_DIVISOR: f32 = 8.0;

/// Font sizes below this are never used
pub const MIN_FONT_SIZE: f32 = 8.0;

/// Multiplier applied to the font size on every shrink iteration
pub const SHRINK_FACTOR: f32 = 0.92;

/// Upper bound on shrink iterations
pub const MAX_ATTEMPTS: u32 = 50;

/// Size of a laid-out text block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

impl TextExtent {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A 2D point in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Measures wrapped, center-aligned text
pub trait TextMeasurer {
    /// Bounding box of `text` at `font_size`, wrapped at `wrap_width`
    fn measure(&self, text: &str, font_size: f32, wrap_width: f32) -> TextExtent;
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for &M {
    fn measure(&self, text: &str, font_size: f32, wrap_width: f32) -> TextExtent {
        (**self).measure(text, font_size, wrap_width)
    }
}

/// The square region inside the canvas margin where text must fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBox {
    /// Side length of the (square) working canvas
    pub canvas_size: u32,
    /// Distance from each canvas edge to the box
    pub margin: u32,
    /// Side length of the box; zero when the margin consumes the canvas
    pub side: f32,
}

impl FitBox {
    /// Fitting box for a square canvas of side `canvas_size`
    pub fn for_canvas(canvas_size: u32) -> Self {
        let margin = MIN_MARGIN.max(canvas_size / MARGIN_DIVISOR);
        let side = (canvas_size as f32 - 2.0 * margin as f32).max(0.0);
        Self {
            canvas_size,
            margin,
            side,
        }
    }

    /// Whether an extent fits on both axes
    pub fn contains(&self, extent: TextExtent) -> bool {
        extent.width <= self.side && extent.height <= self.side
    }

    /// Starting font size for this canvas
    pub fn initial_font_size(&self) -> f32 {
        (self.canvas_size as f32 / INITIAL_SIZE_DIVISOR).max(MIN_FONT_SIZE)
    }
}

/// One measured candidate font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutAttempt {
    pub font_size: f32,
    pub wrap_width: f32,
    pub extent: TextExtent,
}

impl LayoutAttempt {
    fn measure<M: TextMeasurer + ?Sized>(
        measurer: &M,
        text: &str,
        font_size: f32,
        wrap_width: f32,
    ) -> Self {
        Self {
            font_size,
            wrap_width,
            extent: measurer.measure(text, font_size, wrap_width),
        }
    }
}

/// The accepted attempt and where to anchor it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLayout {
    pub fit_box: FitBox,
    pub attempt: LayoutAttempt,
    /// Shrink iterations spent, at most [`MAX_ATTEMPTS`]
    pub attempts: u32,
    /// Horizontal center of the canvas and top edge of the vertically centered block
    pub origin: Point,
}

impl FittedLayout {
    pub fn font_size(&self) -> f32 {
        self.attempt.font_size
    }

    /// Whether the accepted layout lies inside the fitting box
    pub fn fits(&self) -> bool {
        self.fit_box.contains(self.attempt.extent)
    }
}

/// Pick the font size for `text` on a square canvas and center the block
pub fn fit_text<M: TextMeasurer + ?Sized>(
    measurer: &M,
    text: &str,
    canvas_size: u32,
) -> FittedLayout {
    let fit_box = FitBox::for_canvas(canvas_size);
    let wrap_width = fit_box.side;

    let mut attempt =
        LayoutAttempt::measure(measurer, text, fit_box.initial_font_size(), wrap_width);
    let mut attempts = 0;

    while !fit_box.contains(attempt.extent) && attempts < MAX_ATTEMPTS {
        attempts += 1;
        let next_size = attempt.font_size * SHRINK_FACTOR;
        if next_size < MIN_FONT_SIZE {
            break;
        }
        attempt = LayoutAttempt::measure(measurer, text, next_size, wrap_width);
    }

    let origin = Point {
        x: canvas_size as f32 / 2.0,
        y: (canvas_size as f32 - attempt.extent.height) / 2.0,
    };

    let fitted = FittedLayout {
        fit_box,
        attempt,
        attempts,
        origin,
    };

    debug!(
        "fitted text on {canvas_size}px canvas: font size {:.2} after {attempts} shrink(s), block {:.1}x{:.1} in box {:.1}",
        attempt.font_size, attempt.extent.width, attempt.extent.height, fit_box.side
    );
    if !fitted.fits() {
        warn!(
            "text block {:.1}x{:.1} overflows the {:.1}px fitting box at font size {:.2}",
            attempt.extent.width, attempt.extent.height, fit_box.side, attempt.font_size
        );
    }

    fitted
}
