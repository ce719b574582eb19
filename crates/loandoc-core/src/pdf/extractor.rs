//! PDF text, metadata and page image access using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;
use crate::models::document::DocumentMetadata;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// Upper bound on either side of a rendered blank page.
const MAX_RENDER_DIM: u32 = 10_000;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: (f32, f32) = (612.0, 792.0);

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    /// Native text per page from pdf-extract, when it agreed with the page count.
    page_texts: Option<Vec<String>>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            page_texts: None,
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Decode every image XObject on a page.
    ///
    /// Returns the number of image objects seen alongside the ones that
    /// could be decoded.
    fn page_images(&self, doc: &Document, page_id: ObjectId) -> (usize, Vec<DynamicImage>) {
        let mut seen = 0;
        let mut images = Vec::new();

        let Some(resources) = inherited_attribute(doc, page_id, b"Resources")
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, o)| o.as_dict().ok())
        else {
            return (0, images);
        };

        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, o)| o.as_dict().ok())
        else {
            return (0, images);
        };

        for (name, obj_ref) in xobjects.iter() {
            let Ok((_, Object::Stream(stream))) = doc.dereference(obj_ref) else {
                continue;
            };
            if !is_image(&stream.dict) {
                continue;
            }
            seen += 1;

            match decode_image(doc, stream) {
                Some(img) => images.push(img),
                None => trace!(
                    "Could not decode image XObject {}",
                    String::from_utf8_lossy(name)
                ),
            }
        }

        debug!("Decoded {}/{} images on page", images.len(), seen);
        (seen, images)
    }

    /// Page size in points from the (possibly inherited) MediaBox.
    fn page_size(&self, doc: &Document, page_id: ObjectId) -> (f32, f32) {
        let media_box = inherited_attribute(doc, page_id, b"MediaBox")
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, o)| o.as_array().ok())
            .and_then(|arr| {
                let nums: Vec<f32> = arr
                    .iter()
                    .filter_map(|o| doc.dereference(o).ok())
                    .filter_map(|(_, o)| o.as_float().ok())
                    .collect();
                (nums.len() == 4).then(|| ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
            });

        match media_box {
            Some((w, h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    /// Per-page text from pdf-extract, when it agrees with the page count.
    fn native_page_texts(raw: &[u8], page_count: usize) -> Option<Vec<String>> {
        match pdf_extract::extract_text_from_mem_by_pages(raw) {
            Ok(pages) if pages.len() == page_count => Some(pages),
            Ok(pages) => {
                debug!(
                    "pdf-extract returned {} pages for a {} page document, using lopdf text",
                    pages.len(),
                    page_count
                );
                None
            }
            Err(e) => {
                debug!("pdf-extract failed ({}), using lopdf text", e);
                None
            }
        }
    }

    fn info_dictionary<'a>(&self, doc: &'a Document) -> Option<&'a Dictionary> {
        let info = doc.trailer.get(b"Info").ok()?;
        doc.dereference(info).ok()?.1.as_dict().ok()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let decrypted;
        let raw: &[u8] = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut buffer = Vec::new();
            doc.save_to(&mut buffer)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted = buffer;
            &decrypted
        } else {
            data
        };

        // An empty page tree is a valid document with nothing to extract.
        let page_count = doc.get_pages().len();

        self.page_texts = if page_count == 0 {
            None
        } else {
            Self::native_page_texts(raw, page_count)
        };

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn metadata(&self) -> DocumentMetadata {
        let Some(doc) = self.document.as_ref() else {
            return DocumentMetadata::default();
        };

        let field = |key: &[u8]| -> String {
            self.info_dictionary(doc)
                .and_then(|info| info.get(key).ok())
                .and_then(|o| doc.dereference(o).ok())
                .and_then(|(_, o)| decode_text_object(o))
                .unwrap_or_default()
        };

        DocumentMetadata {
            title: field(b"Title"),
            author: field(b"Author"),
            creation_date: field(b"CreationDate"),
            total_pages: self.page_count(),
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        if let Some(texts) = &self.page_texts {
            return texts
                .get((page - 1) as usize)
                .cloned()
                .ok_or(PdfError::InvalidPage(page));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let (seen, images) = self.page_images(doc, page_id);

        // A scanned page is normally one full-page image; take the largest.
        if let Some(image) = images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
        {
            return Ok(image);
        }

        if seen > 0 {
            return Err(PdfError::Render {
                page,
                reason: format!("{} embedded image(s) use unsupported encodings", seen),
            });
        }

        // No raster content: the page renders as an empty canvas.
        let (width_pt, height_pt) = self.page_size(doc, page_id);
        let scale = dpi.max(1) as f32 / POINTS_PER_INCH;
        let width = ((width_pt * scale).round() as u32).clamp(1, MAX_RENDER_DIM);
        let height = ((height_pt * scale).round() as u32).clamp(1, MAX_RENDER_DIM);

        warn!(
            "Page {} has no embedded images, rendering blank {}x{} canvas",
            page, width, height
        );
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            width,
            height,
            Luma([255]),
        )))
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
fn inherited_attribute<'a>(doc: &'a Document, node_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = node_id;
    // Bounded walk guards against cyclic Parent links.
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => return None,
        }
    }
    None
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .is_some_and(|name| name == b"Image")
}

fn decode_image(doc: &Document, stream: &Stream) -> Option<DynamicImage> {
    let dict = &stream.dict;

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

    trace!("Found image object: {}x{}", width, height);

    let filter_name = dict.get(b"Filter").ok().and_then(|filter| match filter {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter_name {
        Some(b"DCTDecode") => {
            // JPEG data is stored as-is in the stream
            trace!("Decoding JPEG image");
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!(
                "Unsupported image filter {}",
                String::from_utf8_lossy(filter_name.unwrap_or_default())
            );
            return None;
        }
        _ => {}
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    image_from_raw(&data, width, height, color_space, bits)
}

fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

/// Decode an Info dictionary value into text.
fn decode_text_object(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// PDFDocEncoding (treated as Latin-1).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
