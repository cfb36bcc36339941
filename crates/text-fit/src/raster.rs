//! Pixel operations: fill, text drawing, decode and PNG encoding

use crate::fit::Point;
use crate::font::FontHandle;
use crate::layout::TextLayout;
use crate::{FitError, Result, Rgba};
use ab_glyph::Font;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

impl From<image::ImageError> for FitError {
    fn from(err: image::ImageError) -> Self {
        FitError::EncodeError(err.to_string())
    }
}

/// Create a canvas filled with a single color
pub fn filled_canvas(width: u32, height: u32, color: Rgba) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color.into())
}

/// Composite `color` over `dst` with the given glyph coverage (0.0 - 1.0)
pub fn blend(dst: &mut image::Rgba<u8>, color: Rgba, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0) * color.a as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }

    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return;
    }

    let channel = |src: u8, dst: u8| {
        let src = src as f32;
        let dst = dst as f32;
        ((src * alpha + dst * dst_alpha * (1.0 - alpha)) / out_alpha).round() as u8
    };

    dst[0] = channel(color.r, dst[0]);
    dst[1] = channel(color.g, dst[1]);
    dst[2] = channel(color.b, dst[2]);
    dst[3] = (out_alpha * 255.0).round() as u8;
}

/// Draw a laid-out text block onto `canvas`
///
/// `origin.x` is the horizontal center every line is aligned on, `origin.y`
/// is the top of the block. Pixels falling outside the canvas are clipped.
pub fn draw_layout(
    canvas: &mut RgbaImage,
    font: &FontHandle,
    layout: &TextLayout,
    origin: Point,
    color: Rgba,
) {
    let (width, height) = canvas.dimensions();

    for (index, line) in layout.lines.iter().enumerate() {
        let baseline = origin.y + layout.ascent + index as f32 * layout.line_advance;
        let start_x = origin.x - line.width / 2.0;

        for glyph in font.positioned_glyphs(&line.text, layout.font_size, start_x, baseline) {
            let Some(outlined) = font.font().outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    return;
                }
                blend(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
            });
        }
    }
}

/// Decode any supported raster format into an RGBA buffer
pub fn decode_image(data: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(data)
        .map(|img| img.to_rgba8())
        .map_err(|e| FitError::DecodeError(e.to_string()))
}

/// Encode an RGBA buffer as PNG
pub fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
