//! Integration tests for text-fit
//!
//! These render real PNGs with the fonts installed on the machine. Tests that
//! need a font return early when the system has none.

use chrono::NaiveDate;
use image::{GenericImageView, RgbaImage};
use text_fit::{
    Canvas, FitError, FixedClock, FontRegistry, RenderOptions, RenderRequest, Rgba, TextRenderer,
    MAX_ATTEMPTS, MIN_FONT_SIZE,
};

fn system_fonts() -> Option<&'static FontRegistry> {
    let fonts = FontRegistry::system();
    if fonts.is_empty() {
        eprintln!("no system fonts installed, skipping");
        return None;
    }
    Some(fonts)
}

fn frozen_clock() -> FixedClock {
    FixedClock::new(
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap(),
    )
}

fn renderer(fonts: &FontRegistry) -> TextRenderer<'_, FixedClock> {
    TextRenderer::new(fonts).with_clock(frozen_clock())
}

/// Bounding box (min_x, min_y, max_x, max_y) of pixels that differ from `background`
fn ink_bounds(image: &RgbaImage, background: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0 != background {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

fn png_of(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba(color));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[test]
fn test_square_output_dimensions() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);

    for size in [1, 17, 100, 512] {
        let png = renderer
            .render_square(size, Some("Confidential"), None, None)
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (size, size), "size {size}");
    }
}

#[test]
fn test_confidential_scenario() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);

    let request = RenderRequest::new(
        Canvas::square(512, Rgba::white()).unwrap(),
        Some("Confidential"),
        Some(Rgba::black()),
    );
    let (pixels, fitted) = renderer.render_pixels(request).unwrap();

    assert_eq!(pixels.dimensions(), (512, 512));
    assert!(fitted.font_size() <= 64.0);
    assert!(fitted.font_size() >= MIN_FONT_SIZE);
    assert!(fitted.fits());

    let block_center = fitted.origin.y + fitted.attempt.extent.height / 2.0;
    assert!((block_center - 256.0).abs() <= 1.0);
    assert_eq!(fitted.origin.x, 256.0);

    // Ink stays inside the margin box (margin is 25px on a 512 canvas)
    let (x0, y0, x1, y1) = ink_bounds(&pixels, [255, 255, 255, 255]).expect("text was drawn");
    assert!(x0 >= 23 && y0 >= 23, "ink starts at ({x0}, {y0})");
    assert!(x1 <= 489 && y1 <= 489, "ink ends at ({x1}, {y1})");

    // Horizontally centered ink
    let ink_center = (x0 + x1) as f32 / 2.0;
    assert!((ink_center - 256.0).abs() < 12.0, "ink center {ink_center}");
}

#[test]
fn test_renders_are_deterministic_with_fixed_clock() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);

    let first = renderer.render_square(256, Some("Draft"), None, None).unwrap();
    let second = renderer.render_square(256, Some("Draft"), None, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_timestamp_changes_output() {
    let Some(fonts) = system_fonts() else { return };

    let earlier = renderer(fonts)
        .render_square(256, Some("Draft"), None, None)
        .unwrap();
    let later = TextRenderer::new(fonts)
        .with_clock(FixedClock::from_millis(1_000_000_000_000).unwrap())
        .render_square(256, Some("Draft"), None, None)
        .unwrap();
    assert_ne!(earlier, later);
}

#[test]
fn test_empty_text_renders_timestamp_only() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);

    let request = RenderRequest::new(Canvas::square(300, Rgba::white()).unwrap(), None, None);
    let (pixels, fitted) = renderer.render_pixels(request).unwrap();

    let (_, top, _, bottom) = ink_bounds(&pixels, [255, 255, 255, 255]).unwrap();
    let ink_center = (top + bottom) as f32 / 2.0;
    assert!(
        (ink_center - 150.0).abs() <= fitted.font_size() * 0.2,
        "timestamp ink centered at {ink_center}, font size {}",
        fitted.font_size()
    );
}

#[test]
fn test_pathological_text_terminates() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);
    let text = vec!["overflow"; 500].join(" ");

    let request = RenderRequest::new(
        Canvas::square(100, Rgba::white()).unwrap(),
        Some(&text),
        None,
    );
    let (pixels, fitted) = renderer.render_pixels(request).unwrap();

    assert!(fitted.attempts <= MAX_ATTEMPTS);
    assert!(fitted.font_size() >= MIN_FONT_SIZE);
    assert_eq!(pixels.dimensions(), (100, 100));

    let png = renderer.render_square(100, Some(&text), None, None).unwrap();
    assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (100, 100));
}

#[test]
fn test_background_and_foreground_colors() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);

    let png = renderer
        .render_square(200, Some("X"), Some(Rgba::blue()), Some(Rgba::red()))
        .unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert!(decoded.pixels().any(|p| p.0 == [255, 0, 0, 255]));
}

#[test]
fn test_render_on_wide_image() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);
    let base_color = [90, 120, 150, 255];
    let base = png_of(2000, 1000, base_color);

    let png = renderer
        .render_on_image(&base, Some("Draft"), Some(Rgba::white()))
        .unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2000, 1000));

    // Base pixels are kept as the backdrop
    assert_eq!(decoded.get_pixel(0, 0).0, base_color);

    // Text lives in the top-left 1000x1000 square, inside its 50px margin
    let (x0, y0, x1, y1) = ink_bounds(&decoded, base_color).expect("text was drawn");
    assert!(x0 >= 48 && y0 >= 48, "ink starts at ({x0}, {y0})");
    assert!(x1 <= 952 && y1 <= 952, "ink ends at ({x1}, {y1})");
}

#[test]
fn test_render_on_image_fit_geometry() {
    let Some(fonts) = system_fonts() else { return };
    let renderer = renderer(fonts);
    let base = RgbaImage::from_pixel(2000, 1000, image::Rgba([0, 0, 0, 255]));

    let request = RenderRequest::new(Canvas::from_image(base).unwrap(), Some("Draft"), None);
    let (_, fitted) = renderer.render_pixels(request).unwrap();

    assert_eq!(fitted.fit_box.canvas_size, 1000);
    assert_eq!(fitted.fit_box.margin, 50);
    assert_eq!(fitted.fit_box.side, 900.0);
    assert_eq!(fitted.origin.x, 500.0);
}

#[test]
fn test_invalid_inputs() {
    let fonts = FontRegistry::new();
    let renderer = TextRenderer::new(&fonts);

    assert!(matches!(
        renderer.render_square(0, Some("x"), None, None),
        Err(FitError::InvalidArgument(_))
    ));
    assert!(matches!(
        renderer.render_on_image(b"definitely not an image", None, None),
        Err(FitError::DecodeError(_))
    ));
}

#[test]
fn test_options_end_to_end() {
    let Some(fonts) = system_fonts() else { return };
    let options = RenderOptions::from_json(
        r##"{"size": 128, "text": "Internal", "background": "#eeeeee", "foreground": "#333"}"##,
    )
    .unwrap();

    let renderer = options.renderer(fonts).with_clock(frozen_clock());
    let png = options.render_square(&renderer).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (128, 128));
    assert_eq!(decoded.get_pixel(0, 0).0, [0xEE, 0xEE, 0xEE, 255]);
}

#[test]
fn test_concurrent_renders() {
    let Some(fonts) = system_fonts() else { return };

    let outputs: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    renderer(fonts)
                        .render_square(160, Some("Shared"), None, None)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}
