//! Font registry and font handles

use crate::fit::{TextExtent, TextMeasurer};
use crate::layout::layout_text;
use crate::{FitError, Result};
use ab_glyph::{point, Font, FontArc, FontVec, Glyph, PxScale, ScaleFont};
use fontdb::{Database, Family, Query, ID};
use log::{debug, warn};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Families tried, in order, when the caller does not name any
///
/// The first entry is the preferred face; the rest are metric-compatible or
/// widely installed sans-serif substitutes.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "Arial",
    "Liberation Sans",
    "Arimo",
    "Helvetica",
    "DejaVu Sans",
];

static SYSTEM_REGISTRY: OnceLock<FontRegistry> = OnceLock::new();

/// Collection of font faces that can be resolved by family name
#[derive(Clone)]
pub struct FontRegistry {
    db: Database,
}

impl FontRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { db: Database::new() }
    }

    /// Create a registry populated with the fonts installed on this system
    pub fn with_system_fonts() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("loaded {} system font faces", db.len());
        Self { db }
    }

    /// Process-wide registry of system fonts
    ///
    /// Populated on first use and never mutated afterwards.
    pub fn system() -> &'static FontRegistry {
        SYSTEM_REGISTRY.get_or_init(Self::with_system_fonts)
    }

    /// Add font faces from TTF/OTF/TTC bytes
    ///
    /// # Returns
    /// Number of faces added
    pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<usize> {
        let before = self.db.len();
        self.db.load_font_data(data);
        let added = self.db.len() - before;
        if added == 0 {
            return Err(FitError::FontLoad(
                "data contains no usable font faces".to_string(),
            ));
        }
        Ok(added)
    }

    /// Add font faces from a file on disk
    pub fn load_font_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.db
            .load_font_file(path)
            .map_err(|e| FitError::FontLoad(format!("{}: {e}", path.display())))
    }

    /// Number of registered faces
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Distinct family names in registration order
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for face in self.db.faces() {
            if let Some((name, _)) = face.families.first() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Resolve the first available family from `preferred`
    ///
    /// Falls back to the first face in the registry when none of the names
    /// match. Fails only when the registry is empty.
    pub fn resolve<S: AsRef<str>>(&self, preferred: &[S]) -> Result<FontHandle> {
        for name in preferred {
            let name = name.as_ref();
            let families = [Family::Name(name)];
            let query = Query {
                families: &families,
                ..Query::default()
            };
            if let Some(id) = self.db.query(&query) {
                debug!("resolved font family '{name}'");
                return self.load_face(id, name);
            }
        }

        let face = self.db.faces().next().ok_or(FitError::NoFontsAvailable)?;
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| face.post_script_name.clone());
        if !preferred.is_empty() {
            warn!("no preferred font family available, falling back to '{family}'");
        }
        self.load_face(face.id, &family)
    }

    /// Resolve using [`DEFAULT_FAMILIES`]
    pub fn resolve_default(&self) -> Result<FontHandle> {
        self.resolve(DEFAULT_FAMILIES)
    }

    fn load_face(&self, id: ID, family: &str) -> Result<FontHandle> {
        let font = self
            .db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
            })
            .ok_or_else(|| FitError::FontLoad(format!("face data for '{family}' is unavailable")))?
            .map_err(|e| FitError::FontLoad(format!("{family}: {e}")))?;

        Ok(FontHandle {
            family: family.to_string(),
            font: FontArc::new(font),
        })
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRegistry")
            .field("faces", &self.db.len())
            .finish()
    }
}

/// A parsed font face ready for measuring and drawing
#[derive(Clone)]
pub struct FontHandle {
    family: String,
    font: FontArc,
}

impl FontHandle {
    /// Create a handle directly from TTF/OTF bytes
    pub fn from_bytes(family: &str, data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| FitError::FontLoad(format!("{family}: {e}")))?;
        Ok(Self {
            family: family.to_string(),
            font: FontArc::new(font),
        })
    }

    /// Family name this handle was resolved as
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Underlying glyph source
    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// Pixel scale for a font size given as pixels per em
    pub fn px_scale(&self, font_size: f32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(font_size * self.font.height_unscaled() / units_per_em)
    }

    /// Distance from the baseline to the top of the tallest glyphs
    pub fn ascent(&self, font_size: f32) -> f32 {
        self.font.as_scaled(self.px_scale(font_size)).ascent()
    }

    /// Distance from the baseline to the bottom of the lowest glyphs (negative)
    pub fn descent(&self, font_size: f32) -> f32 {
        self.font.as_scaled(self.px_scale(font_size)).descent()
    }

    /// Extra spacing between lines
    pub fn line_gap(&self, font_size: f32) -> f32 {
        self.font.as_scaled(self.px_scale(font_size)).line_gap()
    }

    /// Advance width of a single line of text, including kerning
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.px_scale(font_size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Glyphs for one line, starting at `x` on the given baseline
    pub fn positioned_glyphs(&self, text: &str, font_size: f32, x: f32, baseline: f32) -> Vec<Glyph> {
        let scale = self.px_scale(font_size);
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = x;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        glyphs
    }
}

impl TextMeasurer for FontHandle {
    fn measure(&self, text: &str, font_size: f32, wrap_width: f32) -> TextExtent {
        layout_text(self, text, font_size, wrap_width).extent()
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("family", &self.family)
            .finish()
    }
}
