//! PDF document handling

use crate::image::{centered_placement, generate_stamp_operators, ImageXObject, Placement};
use crate::{Result, StampError, StampOptions};
use log::{debug, trace};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Parent chain depth searched for inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

/// Visible page rectangle in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBox {
    /// A4 portrait, used when a page declares no box at all
    pub fn a4() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 595.28,
            y1: 841.89,
        }
    }

    /// Build from a `[llx lly urx ury]` array, normalizing corner order
    pub fn from_array(values: &[Object]) -> Result<Self> {
        if values.len() < 4 {
            return Err(StampError::ParseError("Invalid MediaBox format".to_string()));
        }
        let mut coords = [0.0; 4];
        for (slot, value) in coords.iter_mut().zip(values) {
            *slot = number(value)
                .ok_or_else(|| StampError::ParseError("MediaBox entry is not a number".to_string()))?;
        }
        let [ax, ay, bx, by] = coords;
        Ok(Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        })
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// An image XObject already written into the document
#[derive(Debug, Clone, Copy)]
struct EmbeddedImage {
    id: ObjectId,
    width: u32,
    height: u32,
}

/// PDF document wrapper that stamps images onto pages
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Embedded images (data hash -> image object)
    embedded_images: HashMap<u64, EmbeddedImage>,
    /// Opacity graphics states (opacity bits -> ExtGState object ID)
    graphics_states: HashMap<u32, ObjectId>,
    /// Resource names already registered per page ((page, object ID) -> name)
    page_resources: HashMap<(usize, ObjectId), String>,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("report.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| StampError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| StampError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Wrap an already loaded lopdf document
    pub fn from_document(inner: Document) -> Self {
        Self {
            inner,
            embedded_images: HashMap::new(),
            graphics_states: HashMap::new(),
            page_resources: HashMap::new(),
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Visible area of a page (CropBox, else MediaBox, else A4)
    ///
    /// Both boxes may be inherited from ancestor `Pages` nodes.
    pub fn page_box(&self, page: usize) -> Result<PageBox> {
        let page_id = self.page_id(page)?;

        for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
            if let Some(value) = self.inherited_attribute(page_id, key)? {
                let array = self.resolve(&value)?.as_array().map_err(|_| {
                    StampError::ParseError("MediaBox is not an array".to_string())
                })?;
                return PageBox::from_array(array);
            }
        }

        Ok(PageBox::a4())
    }

    /// Stamp an image centered on one page
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG, other raster formats are decoded)
    /// * `page` - Page number (1-indexed)
    /// * `options` - Scale and opacity
    ///
    /// # Returns
    /// Where the image was placed, in PDF user space
    pub fn stamp_image(
        &mut self,
        data: &[u8],
        page: usize,
        options: &StampOptions,
    ) -> Result<Placement> {
        options.validate()?;
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(StampError::InvalidPage(page, page_count));
        }

        let image = self.embed_image(data)?;
        let image_name = self.register_resource(page, b"XObject", "Im", image.id)?;

        let gs_name = if options.is_translucent() {
            let gs_id = self.opacity_state(options.opacity);
            Some(self.register_resource(page, b"ExtGState", "GS", gs_id)?)
        } else {
            None
        };

        let placement = centered_placement(image.width, image.height, self.page_box(page)?, options.scale);
        let operators = generate_stamp_operators(&image_name, gs_name.as_deref(), placement);
        self.buffer_content(page, &operators);

        trace!(
            "stamped /{image_name} on page {page} at ({:.2}, {:.2}) size {:.2}x{:.2}",
            placement.x,
            placement.y,
            placement.width,
            placement.height
        );

        Ok(placement)
    }

    /// Stamp an image on every page, or on `options.pages` when set
    ///
    /// # Returns
    /// Number of pages stamped
    pub fn stamp_all(&mut self, data: &[u8], options: &StampOptions) -> Result<usize> {
        options.validate()?;
        let pages = options.target_pages(self.page_count())?;

        for &page in &pages {
            self.stamp_image(data, page, options)?;
        }

        debug!(
            "stamped {} of {} page(s) at scale {} opacity {}",
            pages.len(),
            self.page_count(),
            options.scale,
            options.opacity
        );
        Ok(pages.len())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;

        self.inner
            .save(path)
            .map_err(|e| StampError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| StampError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        u32::try_from(page)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or(StampError::InvalidPage(page, pages.len()))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| StampError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Follow an indirect reference, returning direct objects unchanged
    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.inner.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Look up `key` on a page, falling back to its `Pages` ancestors
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
        let mut current_id = page_id;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.page_dict(current_id)?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(value.clone()));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// Embed an image once per distinct content
    fn embed_image(&mut self, data: &[u8]) -> Result<EmbeddedImage> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(image) = self.embedded_images.get(&data_hash) {
            return Ok(*image);
        }

        let xobject = ImageXObject::from_bytes(data)
            .map_err(|e| StampError::ImageError(format!("Failed to create image XObject: {e}")))?;
        if xobject.width == 0 || xobject.height == 0 {
            return Err(StampError::ImageError("Image has no pixels".to_string()));
        }

        let soft_mask = xobject
            .soft_mask_stream()
            .map(|stream| self.inner.add_object(stream));
        let id = self.inner.add_object(xobject.to_pdf_stream(soft_mask));

        debug!(
            "embedded {}x{} {} image{}",
            xobject.width,
            xobject.height,
            xobject.filter,
            if soft_mask.is_some() { " with soft mask" } else { "" }
        );

        let image = EmbeddedImage {
            id,
            width: xobject.width,
            height: xobject.height,
        };
        self.embedded_images.insert(data_hash, image);
        Ok(image)
    }

    /// ExtGState object applying `opacity` to fills and strokes
    fn opacity_state(&mut self, opacity: f32) -> ObjectId {
        if let Some(id) = self.graphics_states.get(&opacity.to_bits()) {
            return *id;
        }

        let id = self.inner.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(opacity.into()),
            "CA" => Object::Real(opacity.into()),
        });
        self.graphics_states.insert(opacity.to_bits(), id);
        id
    }

    /// Add `object_id` to the page's `/Resources /<category>` under a fresh name
    ///
    /// Numbering starts at 1 on every page and skips names the page's
    /// resources already use. Inherited
    /// or indirect resource dictionaries are copied onto the page first.
    fn register_resource(
        &mut self,
        page: usize,
        category: &[u8],
        prefix: &str,
        object_id: ObjectId,
    ) -> Result<String> {
        if let Some(name) = self.page_resources.get(&(page, object_id)) {
            return Ok(name.clone());
        }

        let page_id = self.page_id(page)?;

        let mut resources = match self.inherited_attribute(page_id, b"Resources")? {
            Some(value) => self.resolve(&value)?.as_dict().cloned().unwrap_or_default(),
            None => Dictionary::new(),
        };

        let mut entries = match resources.get(category) {
            Ok(value) => self.resolve(value)?.as_dict().cloned().unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };

        let name = (1u32..)
            .map(|n| format!("{prefix}{n}"))
            .find(|candidate| !entries.has(candidate.as_bytes()))
            .ok_or_else(|| StampError::ParseError(format!("No free {prefix} resource name")))?;

        entries.set(name.as_bytes(), Object::Reference(object_id));
        resources.set(category, Object::Dictionary(entries));

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Resources", Object::Dictionary(resources));
        self.inner.objects.insert(page_id, page_dict.into());

        self.page_resources.insert((page, object_id), name.clone());
        Ok(name)
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Draw `content` after the page's existing content
    ///
    /// Existing streams are left untouched and wrapped in `q`/`Q` through
    /// two new streams, so the stamp starts from the default graphics state.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self.page_dict(page_id)?.clone();

        let existing: Vec<Object> = match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.inner.get_object(*id)? {
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Stream(stream)) => {
                let stream = stream.clone();
                vec![Object::Reference(self.inner.add_object(stream))]
            }
            _ => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        let mut stamp = Vec::with_capacity(content.len() + 3);
        if existing.is_empty() {
            stamp.extend_from_slice(content);
        } else {
            let prefix = self
                .inner
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(prefix));
            contents.extend(existing);
            stamp.extend_from_slice(b"\nQ\n");
            stamp.extend_from_slice(content);
        }

        let stamp_id = self.inner.add_object(Stream::new(Dictionary::new(), stamp));
        contents.push(Object::Reference(stamp_id));

        page_dict.set("Contents", Object::Array(contents));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

/// Stamp `image` on a PDF held in memory and return the new PDF bytes
pub fn watermark_pdf(pdf: &[u8], image: &[u8], options: &StampOptions) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::open_from_bytes(pdf)?;
    doc.stamp_all(image, options)?;
    doc.to_bytes()
}
