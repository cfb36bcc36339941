//! PDF Stamp - centered image watermarks for PDF documents
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Embedding JPEG and PNG images once per document (PNG alpha kept as a soft mask)
//! - Stamping an image centered on selected pages with a given scale and opacity
//!
//! # Example
//!
//! ```ignore
//! use pdf_stamp::{PdfDocument, StampOptions};
//!
//! let mut doc = PdfDocument::open("report.pdf")?;
//! doc.stamp_all(&std::fs::read("watermark.png")?, &StampOptions::default())?;
//! doc.save("report-stamped.pdf")?;
//! ```

mod document;
mod image;
mod options;

pub use document::{watermark_pdf, PageBox, PdfDocument};
pub use image::{centered_placement, fit_box_dimensions, ImageXObject, Placement};
pub use options::StampOptions;

use thiserror::Error;

/// Errors that can occur while stamping PDF documents
#[derive(Debug, Error)]
pub enum StampError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for stamping operations
pub type Result<T> = std::result::Result<T, StampError>;
