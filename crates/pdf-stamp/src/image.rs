//! Image handling for PDF stamps

use crate::{Result, StampError};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for StampError {
    fn from(err: image::ImageError) -> Self {
        StampError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// Anything else the `image` crate may still decode
    Other,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(StampError::ImageError("Image data too short".to_string()));
    }

    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Ok(ImageFormat::Jpeg);
    }

    if data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }

    Ok(ImageFormat::Other)
}

/// JPEG info including dimensions and color components
#[derive(Debug, Clone, Copy)]
struct JpegInfo {
    width: u32,
    height: u32,
    num_components: u8,
}

/// Read the SOF segment of a JPEG without decoding it
fn get_jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    // SOF: marker (2) + length (2) + precision (1) + height (2) + width (2) + components (1)
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        if (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            let num_components = data[i + 9];
            return Ok(JpegInfo {
                width,
                height,
                num_components,
            });
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }

    Err(StampError::ImageError(
        "Could not parse JPEG info".to_string(),
    ))
}

fn deflate(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Image XObject ready for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// "DeviceRGB", "DeviceGray" or "DeviceCMYK"
    pub color_space: String,
    pub bits_per_component: u8,
    /// "DCTDecode" for JPEG passthrough, "FlateDecode" otherwise
    pub filter: String,
    /// Compressed sample data
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha plane, present only when some pixel is not opaque
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Create an XObject from any supported image
    ///
    /// JPEG data is embedded as-is, everything else is decoded.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png | ImageFormat::Other => Self::from_raster(data),
        }
    }

    /// Create an XObject from JPEG data, embedded directly with DCTDecode
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let info = get_jpeg_info(data)?;

        let color_space = match info.num_components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "DCTDecode".to_string(),
            data: data.to_vec(),
            soft_mask: None,
        })
    }

    /// Create an XObject by decoding PNG (or another raster format)
    ///
    /// Color samples are re-encoded with FlateDecode. The alpha channel, if
    /// any pixel uses it, becomes a separate soft mask.
    pub fn from_raster(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;

        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        if width == 0 || height == 0 {
            return Err(StampError::ImageError("Image has no pixels".to_string()));
        }

        let (samples, alpha, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), None, "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = image.to_luma_alpha8();
                let gray: Vec<u8> = la.pixels().map(|p| p[0]).collect();
                let alpha: Vec<u8> = la.pixels().map(|p| p[1]).collect();
                (gray, Some(alpha), "DeviceGray")
            }
            color if color.has_alpha() => {
                let rgba = image.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel[3]);
                }
                (rgb, Some(alpha), "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), None, "DeviceRGB"),
        };

        let soft_mask = match alpha {
            Some(alpha) if alpha.iter().any(|&a| a < u8::MAX) => Some(deflate(&alpha)?),
            _ => None,
        };

        Ok(Self {
            width,
            height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data: deflate(&samples)?,
            soft_mask,
        })
    }

    /// Image stream, linking the soft mask object when one was embedded
    pub fn to_pdf_stream(&self, soft_mask: Option<ObjectId>) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        dict.set("Filter", Object::Name(self.filter.as_bytes().to_vec()));
        dict.set("Length", self.data.len() as i64);
        if let Some(id) = soft_mask {
            dict.set("SMask", Object::Reference(id));
        }

        Stream::new(dict, self.data.clone())
    }

    /// Grayscale soft-mask stream for the alpha plane
    pub fn soft_mask_stream(&self) -> Option<Stream> {
        let alpha = self.soft_mask.as_ref()?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
        dict.set("BitsPerComponent", 8);
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        dict.set("Length", alpha.len() as i64);

        Some(Stream::new(dict, alpha.clone()))
    }
}

/// Scale `width` x `height` to fit inside a box, preserving aspect ratio
pub fn fit_box_dimensions(
    original_width: u32,
    original_height: u32,
    box_width: f64,
    box_height: f64,
) -> (f64, f64) {
    let width_ratio = box_width / original_width as f64;
    let height_ratio = box_height / original_height as f64;
    let scale = width_ratio.min(height_ratio);
    (
        original_width as f64 * scale,
        original_height as f64 * scale,
    )
}

/// Where a stamp is drawn, in PDF user space (bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Center an image on a page box, fitting it in a square of side
/// `scale * min(page_width, page_height)`
pub fn centered_placement(
    image_width: u32,
    image_height: u32,
    page: crate::PageBox,
    scale: f64,
) -> Placement {
    let side = scale * page.width().min(page.height());
    let (width, height) = fit_box_dimensions(image_width, image_height, side, side);
    Placement {
        x: page.x0 + (page.width() - width) / 2.0,
        y: page.y0 + (page.height() - height) / 2.0,
        width,
        height,
    }
}

/// Generate operators drawing an image at `placement`
///
/// With a graphics state name, `/GSn gs` is applied inside the saved state
/// so the opacity does not leak into later content.
pub fn generate_stamp_operators(
    image_name: &str,
    graphics_state: Option<&str>,
    placement: Placement,
) -> Vec<u8> {
    let Placement {
        x,
        y,
        width,
        height,
    } = placement;

    let mut ops = String::from("q\n");
    if let Some(gs) = graphics_state {
        ops.push_str(&format!("/{gs} gs\n"));
    }
    ops.push_str(&format!(
        "{width:.4} 0 0 {height:.4} {x:.4} {y:.4} cm\n/{image_name} Do\nQ\n"
    ));
    ops.into_bytes()
}
