//! WASM bindings for fitmark
//!
//! This crate provides JavaScript-friendly API for:
//! - Registering fonts (browsers expose no system fonts)
//! - Rendering timestamped, auto-fitted text to PNG
//! - Stamping that PNG centered on the pages of a PDF
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { FontRegistry, renderSquare, watermarkPdf } from 'fitmark-wasm';
//!
//! await init();
//!
//! const fonts = new FontRegistry();
//! fonts.loadFont(fontBytes);
//!
//! const png = renderSquare(fonts, { size: 512, text: "Confidential" });
//! const pdf = watermarkPdf(fonts, pdfBytes, { text: "Draft" }, { opacity: 0.3 });
//! ```

use pdf_stamp::StampOptions;
use serde::de::DeserializeOwned;
use text_fit::{FixedClock, RenderOptions};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Fonts available to the renderers
#[wasm_bindgen]
pub struct FontRegistry {
    inner: text_fit::FontRegistry,
}

#[wasm_bindgen]
impl FontRegistry {
    /// Create an empty registry
    #[wasm_bindgen(constructor)]
    pub fn new() -> FontRegistry {
        FontRegistry {
            inner: text_fit::FontRegistry::new(),
        }
    }

    /// Load a font file
    ///
    /// @param data - TTF, OTF or TTC file bytes (Uint8Array)
    /// @returns Number of faces added
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, data: &[u8]) -> Result<usize, JsValue> {
        self.inner
            .load_font_data(data.to_vec())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Family names of the loaded faces
    ///
    /// @returns Array of family names
    pub fn families(&self) -> Vec<JsValue> {
        self.inner
            .families()
            .into_iter()
            .map(|family| JsValue::from_str(&family))
            .collect()
    }

    /// Number of loaded faces
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Render text centered on a new square canvas
///
/// @param registry - FontRegistry with at least one font
/// @param options - { size, text, background, foreground, fontFamilies }, all optional
/// @returns PNG bytes (Uint8Array)
#[wasm_bindgen(js_name = renderSquare)]
pub fn render_square(registry: &FontRegistry, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let options: RenderOptions = parse_options(options)?;
    let renderer = options.renderer(&registry.inner).with_clock(browser_clock()?);

    options
        .render_square(&renderer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render text onto an existing image, keeping its dimensions
///
/// @param registry - FontRegistry with at least one font
/// @param image - PNG, JPEG, GIF, BMP or WebP bytes (Uint8Array)
/// @param options - { text, foreground, fontFamilies }, all optional
/// @returns PNG bytes (Uint8Array)
#[wasm_bindgen(js_name = renderOnImage)]
pub fn render_on_image(
    registry: &FontRegistry,
    image: &[u8],
    options: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let options: RenderOptions = parse_options(options)?;
    let renderer = options.renderer(&registry.inner).with_clock(browser_clock()?);

    options
        .render_on_image(&renderer, image)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render a square text stamp and place it centered on the pages of a PDF
///
/// @param registry - FontRegistry with at least one font
/// @param pdf - PDF file bytes (Uint8Array)
/// @param renderOptions - Options for the rendered stamp, see renderSquare
/// @param stampOptions - { scale, opacity, pages }, all optional
/// @returns PDF bytes (Uint8Array)
#[wasm_bindgen(js_name = watermarkPdf)]
pub fn watermark_pdf(
    registry: &FontRegistry,
    pdf: &[u8],
    render_options: JsValue,
    stamp_options: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let stamp_options: StampOptions = parse_options(stamp_options)?;
    stamp_options
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let stamp = render_square(registry, render_options)?;

    pdf_stamp::watermark_pdf(pdf, &stamp, &stamp_options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Options object from JS, defaults when `undefined` or `null`
fn parse_options<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// The browser's local wall-clock time
fn browser_clock() -> Result<FixedClock, JsValue> {
    let now = js_sys::Date::new_0();
    let local_millis = now.get_time() - now.get_timezone_offset() * 60_000.0;

    FixedClock::from_millis(local_millis as i64)
        .ok_or_else(|| JsValue::from_str("Browser clock is out of range"))
}
