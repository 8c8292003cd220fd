//! [`ContentModel`] implementation backed by lopdf.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::validate_pdf_path;
use crate::error::{Error, Result};
use crate::model::Metadata;

use super::backend::{ContentModel, ImageData, ImageRef, PageText, Span};
use super::content::{ContentInterpreter, PageContent, Ruling};
use super::grouping::{group_lines_into_blocks, group_spans_into_lines};

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Positioned text and rulings of one page, used by the table detectors.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// Page number (1-based)
    pub page_number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Text spans, in content-stream order
    pub spans: Vec<Span>,
    /// Axis-aligned ruling segments
    pub rulings: Vec<Ruling>,
}

/// lopdf-based content model.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Open a PDF file after checking its path and header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        validate_pdf_path(path)?;

        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Load a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// PDF version string (e.g., "1.7").
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Spans and rulings of one page, for table detection.
    pub fn page_layout(&self, page_index: u32) -> Result<PageLayout> {
        let page_id = self.page_id(page_index)?;
        let (width, height) = self.page_dimensions(page_id);
        let content = self.interpret(page_id, height)?;

        Ok(PageLayout {
            page_number: page_index + 1,
            width,
            height,
            spans: content.spans,
            rulings: content.rulings,
        })
    }

    fn page_id(&self, page_index: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&(page_index + 1))
            .copied()
            .ok_or(Error::PageOutOfRange(page_index + 1, pages.len() as u32))
    }

    /// Page width and height from the MediaBox, inherited if needed.
    fn page_dimensions(&self, page_id: ObjectId) -> (f32, f32) {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| self.resolve(obj).as_array().ok());

        if let Some(array) = media_box {
            if array.len() >= 4 {
                let coords: Vec<f32> = array
                    .iter()
                    .map(|o| self.resolve(o).as_float().unwrap_or(0.0))
                    .collect();
                let width = (coords[2] - coords[0]).abs();
                let height = (coords[3] - coords[1]).abs();
                if width > 0.0 && height > 0.0 {
                    return (width, height);
                }
            }
        }

        DEFAULT_PAGE_SIZE
    }

    /// Look up a page attribute, walking up the page tree.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page_id).ok();
        let mut depth = 0;
        while let Some(dict) = current {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            depth += 1;
            if depth > 32 {
                break;
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|r| self.doc.get_dictionary(r))
                .ok();
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            _ => obj,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Object::Stream(s) => decode_stream(s).map_err(|e| Error::PdfParse(e.to_string())),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        let data = decode_stream(s).map_err(|e| Error::PdfParse(e.to_string()))?;
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn interpret(&self, page_id: ObjectId, page_height: f32) -> Result<PageContent> {
        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let content = self.page_content(page_id)?;

        ContentInterpreter::new(&self.doc, fonts, page_height).run(&content)
    }

    /// XObject resource dictionary of a page.
    fn page_xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let resources = self
            .inherited(page_id, b"Resources")
            .and_then(|obj| self.resolve_dict(obj))?;
        resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
    }

    fn image_stream(&self, object: ObjectId) -> Result<&Stream> {
        match self.doc.get_object(object) {
            Ok(Object::Stream(stream)) => Ok(stream),
            Ok(_) => Err(Error::ImageExtract(format!(
                "Object {} {} R is not a stream",
                object.0, object.1
            ))),
            Err(e) => Err(Error::ImageExtract(e.to_string())),
        }
    }
}

impl ContentModel for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn metadata(&self) -> Result<Metadata> {
        let mut metadata = Metadata::new(self.version(), self.page_count());

        if let Some(info_dict) = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve_dict(info))
        {
            metadata.title = get_string_from_dict(info_dict, b"Title");
            metadata.author = get_string_from_dict(info_dict, b"Author");
            metadata.subject = get_string_from_dict(info_dict, b"Subject");
            metadata.creator = get_string_from_dict(info_dict, b"Creator");
            metadata.producer = get_string_from_dict(info_dict, b"Producer");

            if let Some(date_str) = get_string_from_dict(info_dict, b"CreationDate") {
                metadata.created = parse_pdf_date(&date_str);
            }
        }

        Ok(metadata)
    }

    fn page_text(&self, page_index: u32) -> Result<PageText> {
        let page_id = self.page_id(page_index)?;
        let (_, height) = self.page_dimensions(page_id);
        let content = self
            .interpret(page_id, height)
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page_index + 1, e)))?;

        let lines = group_spans_into_lines(content.spans);
        Ok(PageText {
            page_index,
            blocks: group_lines_into_blocks(lines),
        })
    }

    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(page_index)?;
        let xobjects = match self.page_xobjects(page_id) {
            Some(dict) => dict,
            None => return Ok(Vec::new()),
        };

        let (_, height) = self.page_dimensions(page_id);
        let content = self.interpret(page_id, height)?;

        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut images = Vec::new();

        for placement in content.placements {
            let object = match xobjects
                .get(&placement.name)
                .and_then(Object::as_reference)
            {
                Ok(r) => r,
                Err(_) => continue,
            };

            let is_image = matches!(
                self.doc.get_object(object),
                Ok(Object::Stream(s)) if s.dict.get(b"Subtype")
                    .and_then(Object::as_name_str)
                    .map(|n| n == "Image")
                    .unwrap_or(false)
            );
            if !is_image || !seen.insert(object) {
                continue;
            }

            images.push(ImageRef {
                page_index,
                name: String::from_utf8_lossy(&placement.name).to_string(),
                object,
                bbox: placement.bbox,
            });
        }

        Ok(images)
    }

    fn image_data(&self, image: &ImageRef) -> Result<ImageData> {
        let stream = self.image_stream(image.object)?;
        let dict = &stream.dict;

        match last_filter(dict).as_deref() {
            Some("DCTDecode") => {
                return Ok(ImageData {
                    bytes: stream.content.clone(),
                    extension: "jpg".to_string(),
                })
            }
            Some("JPXDecode") => {
                return Ok(ImageData {
                    bytes: stream.content.clone(),
                    extension: "jp2".to_string(),
                })
            }
            _ => {}
        }

        let decoded = decode_stream(stream)
            .map_err(|e| Error::ImageExtract(format!("{}: {}", image.name, e)))?;

        let width = dict_u32(dict, b"Width");
        let height = dict_u32(dict, b"Height");
        let bits = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);
        let color = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| self.resolve(cs).as_name_str().ok())
            .and_then(|name| match name {
                "DeviceGray" => Some(png::ColorType::Grayscale),
                "DeviceRGB" => Some(png::ColorType::Rgb),
                _ => None,
            });

        if let (Some(w), Some(h), Some(color), 8) = (width, height, color, bits) {
            let channels = if color == png::ColorType::Rgb { 3 } else { 1 };
            if decoded.len() == (w as usize) * (h as usize) * channels {
                return Ok(ImageData {
                    bytes: encode_png(&decoded, w, h, color)?,
                    extension: "png".to_string(),
                });
            }
        }

        Ok(ImageData {
            bytes: decoded,
            extension: "raw".to_string(),
        })
    }
}

/// Stream bytes with filters removed; unfiltered streams pass through.
fn decode_stream(stream: &Stream) -> std::result::Result<Vec<u8>, lopdf::Error> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream.decompressed_content()
}

fn last_filter(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        Object::Array(filters) => filters
            .last()
            .and_then(|f| f.as_name_str().ok())
            .map(String::from),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn encode_png(pixels: &[u8], width: u32, height: u32, color: png::ColorType) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
        writer.finish()?;
    }
    Ok(buf)
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => {
            // UTF-16BE with BOM is the PDF text string convention
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    })
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use lopdf::dictionary;

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.month(), 1);
        assert!(parse_pdf_date("D:20").is_none());
    }

    #[test]
    fn test_get_string_from_dict() {
        let dict = dictionary! {
            "Title" => Object::string_literal("Report"),
            "Author" => Object::String(vec![0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42], lopdf::StringFormat::Hexadecimal),
        };
        assert_eq!(get_string_from_dict(&dict, b"Title").as_deref(), Some("Report"));
        assert_eq!(get_string_from_dict(&dict, b"Author").as_deref(), Some("AB"));
        assert!(get_string_from_dict(&dict, b"Subject").is_none());
    }

    #[test]
    fn test_last_filter() {
        let single = dictionary! { "Filter" => "DCTDecode" };
        assert_eq!(last_filter(&single).as_deref(), Some("DCTDecode"));

        let chain = dictionary! {
            "Filter" => vec![Object::Name(b"FlateDecode".to_vec()), Object::Name(b"DCTDecode".to_vec())],
        };
        assert_eq!(last_filter(&chain).as_deref(), Some("DCTDecode"));
        assert!(last_filter(&Dictionary::new()).is_none());
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&[0, 255, 0, 255], 2, 2, png::ColorType::Grayscale).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
