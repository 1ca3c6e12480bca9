//! Text extraction from PDFs, plain text and images.
//!
//! [`TextExtractor::extract`] never fails: an unreadable document is logged
//! and yields an empty string, which ingestion reports as skipped.
//! [`TextExtractor::try_extract`] exposes the underlying error instead.
//!
//! PDFs are read through their text layer first. A PDF without one is
//! treated as scanned: the images drawn on each page are handed to the
//! configured [`OcrEngine`], and page results are joined with [`PAGE_BREAK`].
//! JPEG and JPEG 2000 streams are passed through as they are; Flate, LZW and
//! uncompressed bitmaps are rebuilt from their samples and re-encoded as PNG.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use tracing::{debug, error, info, warn};

use crate::document::{Document, DocumentKind};
use crate::error::{RagError, Result};

/// Separator placed between OCR results of consecutive pages.
pub const PAGE_BREAK: &str = "\n\u{000C}\n";

/// Image filters whose stream content is a complete, self-describing image file.
const ENCODED_IMAGE_FILTERS: &[&[u8]] = &[b"DCTDecode", b"JPXDecode"];

/// Optical character recognition over an encoded image (PNG, JPEG, TIFF, ...).
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in `image`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the image cannot be decoded or
    /// recognition fails.
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// An [`OcrEngine`] backed by the system Tesseract library.
///
/// Only available with the `ocr` feature. A fresh Tesseract handle is created
/// per image, so the engine can be shared across threads.
#[cfg(feature = "ocr")]
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    languages: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Create an engine for a `+`-separated language set such as `ita+eng`.
    pub fn new(languages: impl Into<String>) -> Self {
        Self { languages: languages.into() }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let fail = |message: String| RagError::ExtractionError {
            document: "image".to_string(),
            message,
        };
        let mut engine = tesseract::Tesseract::new(None, Some(self.languages.as_str()))
            .map_err(|e| fail(format!("tesseract init ({}) failed: {e}", self.languages)))?
            .set_image_from_mem(image)
            .map_err(|e| fail(format!("cannot load image: {e}")))?;
        engine.get_text().map_err(|e| fail(format!("recognition failed: {e}")))
    }
}

/// Turns [`Document`]s into plain text.
#[derive(Clone, Default)]
pub struct TextExtractor {
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor").field("ocr", &self.ocr.is_some()).finish()
    }
}

impl TextExtractor {
    /// An extractor without OCR. Images and scanned PDFs yield empty text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an OCR engine.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// The extractor for this build: Tesseract with `languages` when the
    /// `ocr` feature is enabled, no OCR otherwise.
    pub fn for_languages(languages: &str) -> Self {
        #[cfg(feature = "ocr")]
        {
            Self::new().with_ocr(Arc::new(TesseractOcr::new(languages)))
        }
        #[cfg(not(feature = "ocr"))]
        {
            debug!(languages, "built without the ocr feature; OCR disabled");
            Self::new()
        }
    }

    /// Whether an OCR engine is attached.
    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract text, logging failures and returning an empty string for them.
    pub fn extract(&self, document: &Document) -> String {
        match self.try_extract(document) {
            Ok(text) => text,
            Err(e) => {
                error!(document = %document.name, error = %e, "text extraction failed");
                String::new()
            }
        }
    }

    /// Extract text from `document`.
    ///
    /// An empty string means the document has no recoverable text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the document is corrupt or
    /// recognition fails.
    pub fn try_extract(&self, document: &Document) -> Result<String> {
        match document.kind {
            DocumentKind::Text => Ok(String::from_utf8_lossy(&document.content).into_owned()),
            DocumentKind::Image => self.ocr_image(document),
            DocumentKind::Pdf => self.extract_pdf(document),
        }
    }

    fn ocr_image(&self, document: &Document) -> Result<String> {
        let Some(ocr) = &self.ocr else {
            warn!(document = %document.name, "no OCR engine available, image skipped");
            return Ok(String::new());
        };
        ocr.recognize(&document.content).map_err(|e| with_document(e, &document.name))
    }

    fn extract_pdf(&self, document: &Document) -> Result<String> {
        let text = pdf_text_layer(document)?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        let Some(ocr) = &self.ocr else {
            warn!(
                document = %document.name,
                "PDF has no text layer and no OCR engine is available"
            );
            return Ok(String::new());
        };
        info!(document = %document.name, "PDF has no text layer, running OCR on page images");
        ocr_pdf_pages(document, ocr.as_ref())
    }
}

fn with_document(err: RagError, name: &str) -> RagError {
    match err {
        RagError::ExtractionError { message, .. } => {
            RagError::ExtractionError { document: name.to_string(), message }
        }
        other => other,
    }
}

fn extraction_error(document: &Document, message: impl Into<String>) -> RagError {
    RagError::ExtractionError { document: document.name.clone(), message: message.into() }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Read the text layer of every page, joined with newlines.
///
/// `pdf-extract` handles font encodings best but can panic on malformed
/// files; in that case the simpler `lopdf` extractor is tried.
fn pdf_text_layer(document: &Document) -> Result<String> {
    let bytes = document.content.as_slice();
    let attempt =
        catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(bytes)));

    let reason = match attempt {
        Ok(Ok(pages)) => return Ok(pages.join("\n")),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("parser panicked: {}", panic_message(payload.as_ref())),
    };
    warn!(document = %document.name, reason = %reason, "pdf-extract failed, trying lopdf");

    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| extraction_error(document, format!("{reason}; lopdf: {e}")))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages)
        .map_err(|e| extraction_error(document, format!("{reason}; lopdf: {e}")))
}

/// OCR the embedded images of every page.
fn ocr_pdf_pages(document: &Document, ocr: &dyn OcrEngine) -> Result<String> {
    let doc = lopdf::Document::load_mem(&document.content)
        .map_err(|e| extraction_error(document, format!("cannot parse PDF: {e}")))?;
    Ok(ocr_pages(&doc, &document.name, ocr))
}

fn ocr_pages(doc: &lopdf::Document, name: &str, ocr: &dyn OcrEngine) -> String {
    let mut pages = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let mut page_text = Vec::new();
        let mut readable = 0;
        for stream in page_images(doc, page_id) {
            let image = match image_file(doc, stream) {
                Ok(image) => image,
                Err(e) => {
                    warn!(
                        document = name,
                        page = number,
                        error = %e,
                        "page image cannot be decoded"
                    );
                    continue;
                }
            };
            readable += 1;
            match ocr.recognize(&image) {
                Ok(text) => page_text.push(text.trim().to_string()),
                Err(e) => {
                    warn!(document = name, page = number, error = %e, "OCR failed on page image")
                }
            }
        }
        if readable == 0 {
            warn!(document = name, page = number, "page has no image OCR can read");
        }
        debug!(document = name, page = number, images = page_text.len(), "page recognized");
        pages.push(page_text.join("\n"));
    }
    pages.join(PAGE_BREAK)
}

fn resolve<'a>(doc: &'a lopdf::Document, object: &'a Object) -> Option<&'a Object> {
    doc.dereference(object).ok().map(|(_, resolved)| resolved)
}

fn dict_entry<'a>(
    doc: &'a lopdf::Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// The page's resource dictionary, following `Parent` links for inherited resources.
fn page_resources(doc: &lopdf::Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(resources) = dict_entry(doc, node, b"Resources") {
            return Some(resources);
        }
        node = dict_entry(doc, node, b"Parent")?;
    }
    None
}

/// Image streams drawn on a page, in resource order.
fn page_images(doc: &lopdf::Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(xobjects) = page_resources(doc, page_id).and_then(|r| dict_entry(doc, r, b"XObject"))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, object)| match resolve(doc, object)? {
            Object::Stream(stream) => Some(stream),
            _ => None,
        })
        .filter(|stream| {
            matches!(
                stream.dict.get(b"Subtype"),
                Ok(Object::Name(name)) if name.as_slice() == b"Image"
            )
        })
        .collect()
}

fn image_error(message: impl Into<String>) -> RagError {
    RagError::ExtractionError { document: "image".to_string(), message: message.into() }
}

/// An image file OCR can decode: the stream itself for JPEG and JPEG 2000,
/// otherwise the decoded samples re-encoded as PNG.
fn image_file(doc: &lopdf::Document, stream: &Stream) -> Result<Vec<u8>> {
    let filters = stream.filters().unwrap_or_default();
    if let [filter] = filters.as_slice() {
        if ENCODED_IMAGE_FILTERS.contains(filter) {
            return Ok(stream.content.clone());
        }
    }
    if let Some(filter) = filters.iter().find(|f| !DECODABLE_FILTERS.contains(*f)) {
        return Err(image_error(format!(
            "unsupported image filter {}",
            String::from_utf8_lossy(filter)
        )));
    }

    let samples = stream
        .get_plain_content()
        .map_err(|e| image_error(format!("cannot decompress image: {e}")))?;
    let bitmap = Bitmap::describe(doc, &stream.dict)?;
    bitmap.to_png(&samples)
}

/// Stream filters lopdf can undo, leaving raw samples.
const DECODABLE_FILTERS: &[&[u8]] = &[b"FlateDecode", b"LZWDecode", b"ASCII85Decode"];

/// How a raw image stream lays out its samples.
#[derive(Debug)]
struct Bitmap {
    width: u32,
    height: u32,
    bits: u8,
    colour: Colour,
    invert: bool,
}

#[derive(Debug)]
enum Colour {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of `base` entries indexed by each sample.
    Indexed { base: Box<Colour>, palette: Vec<u8> },
}

impl Colour {
    fn components(&self) -> usize {
        match self {
            Colour::Gray | Colour::Indexed { .. } => 1,
            Colour::Rgb => 3,
            Colour::Cmyk => 4,
        }
    }

    fn from_object(doc: &lopdf::Document, object: &Object) -> Result<Self> {
        let object = resolve(doc, object).ok_or_else(|| image_error("dangling colour space"))?;
        match object {
            Object::Name(name) => Self::from_family(name),
            Object::Array(items) => {
                let family = items.first().and_then(|f| f.as_name().ok()).unwrap_or_default();
                match family {
                    b"ICCBased" => {
                        let n = items
                            .get(1)
                            .and_then(|s| resolve(doc, s))
                            .and_then(|s| s.as_stream().ok())
                            .and_then(|s| s.dict.get(b"N").and_then(Object::as_i64).ok());
                        match n {
                            Some(1) => Ok(Colour::Gray),
                            Some(3) => Ok(Colour::Rgb),
                            Some(4) => Ok(Colour::Cmyk),
                            other => {
                                Err(image_error(format!("ICC profile with {other:?} components")))
                            }
                        }
                    }
                    b"Indexed" | b"I" => {
                        let [_, base, _, lookup] = items.as_slice() else {
                            return Err(image_error("malformed indexed colour space"));
                        };
                        let base = Box::new(Self::from_object(doc, base)?);
                        let palette = match resolve(doc, lookup) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(stream)) => stream
                                .get_plain_content()
                                .map_err(|e| image_error(format!("cannot read palette: {e}")))?,
                            _ => return Err(image_error("missing palette")),
                        };
                        Ok(Colour::Indexed { base, palette })
                    }
                    other => Self::from_family(other),
                }
            }
            _ => Err(image_error("colour space is neither a name nor an array")),
        }
    }

    fn from_family(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(Colour::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(Colour::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(Colour::Cmyk),
            other => Err(image_error(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Append one pixel as gray or RGB bytes.
    fn push_pixel(&self, sample: &[u8], out: &mut Vec<u8>) {
        match self {
            Colour::Gray | Colour::Rgb => out.extend_from_slice(sample),
            Colour::Cmyk => {
                let k = 255 - u16::from(sample[3]);
                for &c in &sample[..3] {
                    out.push(((255 - u16::from(c)) * k / 255) as u8);
                }
            }
            Colour::Indexed { base, palette } => {
                let width = base.components();
                let start = usize::from(sample[0]) * width;
                match palette.get(start..start + width) {
                    Some(entry) => base.push_pixel(entry, out),
                    None => out.extend(std::iter::repeat_n(0, base.output_components())),
                }
            }
        }
    }

    fn output_components(&self) -> usize {
        match self {
            Colour::Gray => 1,
            Colour::Rgb | Colour::Cmyk => 3,
            Colour::Indexed { base, .. } => base.output_components(),
        }
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| image_error(format!("missing {}", String::from_utf8_lossy(key))))
}

impl Bitmap {
    fn describe(doc: &lopdf::Document, dict: &Dictionary) -> Result<Self> {
        let width = dimension(dict, b"Width")?;
        let height = dimension(dict, b"Height")?;
        let mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        let (bits, colour) = if mask {
            (1, Colour::Gray)
        } else {
            let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
            let colour = match dict.get(b"ColorSpace") {
                Ok(object) => Colour::from_object(doc, object)?,
                Err(_) => Colour::Gray,
            };
            (bits, colour)
        };
        let bits = match bits {
            1 | 2 | 4 | 8 | 16 => bits as u8,
            other => return Err(image_error(format!("{other} bits per component"))),
        };
        let invert = match dict.get(b"Decode").and_then(Object::as_array) {
            Ok(decode) => decode.first().and_then(|d| d.as_float().ok()).is_some_and(|d| d > 0.5),
            Err(_) => false,
        };
        Ok(Self { width, height, bits, colour, invert })
    }

    /// Every sample widened to one byte, row padding dropped.
    fn samples(&self, data: &[u8]) -> Result<Vec<u8>> {
        let per_row = self.width as usize * self.colour.components();
        let row_bytes = (per_row * usize::from(self.bits)).div_ceil(8);
        let rows = self.height as usize;
        if data.len() < row_bytes * rows {
            return Err(image_error(format!(
                "image data has {} bytes, expected {}",
                data.len(),
                row_bytes * rows
            )));
        }

        let indexed = matches!(self.colour, Colour::Indexed { .. });
        let max = (1u16 << self.bits.min(8)) - 1;
        let mut out = Vec::with_capacity(per_row * rows);
        for row in data.chunks(row_bytes).take(rows) {
            for i in 0..per_row {
                let value = match self.bits {
                    16 => u16::from(row[i * 2]),
                    8 => u16::from(row[i]),
                    bits => {
                        let bit = i * usize::from(bits);
                        let shift = 8 - usize::from(bits) - bit % 8;
                        u16::from(row[bit / 8] >> shift) & max
                    }
                };
                let value = if self.invert { max - value.min(max) } else { value };
                let scaled = if indexed || max == 255 { value } else { value * 255 / max };
                out.push(scaled as u8);
            }
        }
        Ok(out)
    }

    fn to_png(&self, data: &[u8]) -> Result<Vec<u8>> {
        let samples = self.samples(data)?;
        let components = self.colour.components();
        let mut pixels = Vec::with_capacity(samples.len());
        for sample in samples.chunks(components) {
            self.colour.push_pixel(sample, &mut pixels);
        }

        let image = match self.colour.output_components() {
            1 => GrayImage::from_raw(self.width, self.height, pixels).map(DynamicImage::ImageLuma8),
            _ => RgbImage::from_raw(self.width, self.height, pixels).map(DynamicImage::ImageRgb8),
        }
        .ok_or_else(|| image_error("pixel buffer does not match image size"))?;

        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| image_error(format!("cannot encode PNG: {e}")))?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;

    struct EchoOcr;

    impl OcrEngine for EchoOcr {
        fn recognize(&self, image: &[u8]) -> Result<String> {
            Ok(String::from_utf8_lossy(image).into_owned())
        }
    }

    #[test]
    fn text_is_decoded_lossily() {
        let doc = Document::new("appunti.txt", b"rendimento \xFF atteso".to_vec()).unwrap();
        let text = TextExtractor::new().extract(&doc);
        assert!(text.starts_with("rendimento "));
        assert!(text.ends_with(" atteso"));
    }

    #[test]
    fn corrupt_pdf_yields_empty_text() {
        let doc = Document::new("broken.pdf", b"%PDF-1.4 this is not a pdf".to_vec()).unwrap();
        let extractor = TextExtractor::new();
        assert_eq!(extractor.extract(&doc), "");
        match extractor.try_extract(&doc) {
            Err(e) => assert!(matches!(
                e,
                RagError::ExtractionError { ref document, .. } if document == "broken.pdf"
            )),
            Ok(text) => assert!(text.trim().is_empty()),
        }
    }

    #[test]
    fn image_without_ocr_is_empty() {
        let doc = Document::new("scan.png", vec![0x89, b'P', b'N', b'G']).unwrap();
        assert_eq!(TextExtractor::new().extract(&doc), "");
    }

    #[test]
    fn image_goes_through_ocr_engine() {
        let doc = Document::new("scan.png", b"Sharpe ratio".to_vec()).unwrap();
        let extractor = TextExtractor::new().with_ocr(Arc::new(EchoOcr));
        assert_eq!(extractor.extract(&doc), "Sharpe ratio");
    }

    /// Decodes the PNG it is given and reports its size and corner pixels.
    struct PixelOcr;

    impl OcrEngine for PixelOcr {
        fn recognize(&self, image: &[u8]) -> Result<String> {
            let decoded = image::load_from_memory_with_format(image, ImageFormat::Png)
                .map_err(|e| image_error(e.to_string()))?
                .to_rgb8();
            let (w, h) = decoded.dimensions();
            let (first, last) = (decoded.get_pixel(0, 0).0, decoded.get_pixel(w - 1, h - 1).0);
            Ok(format!("{w}x{h} {first:?} {last:?}"))
        }
    }

    fn image_stream(width: i64, height: i64, colour: Object, bits: i64, data: Vec<u8>) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => colour,
                "BitsPerComponent" => bits
            },
            data,
        )
    }

    /// A one-page PDF whose only content is `image`.
    fn scanned_page(image: Stream) -> lopdf::Document {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let image_id = pdf.add_object(image);
        let content_id =
            pdf.add_object(Stream::new(Dictionary::new(), b"q 16 0 0 8 0 0 cm /Im0 Do Q".to_vec()));
        let media_box: Vec<Object> = [0, 0, 16, 8].into_iter().map(Object::Integer).collect();
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => media_box,
            "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => image_id } }
        });
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1
            }),
        );
        let catalog_id = pdf.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        pdf.trailer.set("Root", catalog_id);
        pdf
    }

    #[test]
    fn flate_page_image_is_rebuilt_as_png() {
        let mut pixels = vec![255u8; 16 * 8];
        pixels[0] = 0;
        let mut image = image_stream(16, 8, "DeviceGray".into(), 8, pixels);
        image.compress().unwrap();
        assert_eq!(image.filters().unwrap(), vec![b"FlateDecode".as_slice()]);

        let pdf = scanned_page(image);
        assert_eq!(ocr_pages(&pdf, "scan.pdf", &PixelOcr), "16x8 [0, 0, 0] [255, 255, 255]");
        assert!(ocr_pages(&pdf, "scan.pdf", &EchoOcr).contains("PNG"));
    }

    #[test]
    fn jpeg_page_image_is_passed_through() {
        let mut image = image_stream(16, 8, "DeviceRGB".into(), 8, b"jpeg bytes".to_vec());
        image.dict.set("Filter", "DCTDecode");
        let pdf = scanned_page(image);
        assert_eq!(ocr_pages(&pdf, "scan.pdf", &EchoOcr), "jpeg bytes");
    }

    #[test]
    fn unsupported_filter_leaves_page_empty() {
        let mut image = image_stream(16, 8, "DeviceGray".into(), 1, vec![0; 16]);
        image.dict.set("Filter", "CCITTFaxDecode");
        let pdf = scanned_page(image);
        assert_eq!(ocr_pages(&pdf, "scan.pdf", &EchoOcr), "");
    }

    #[test]
    fn one_bit_rows_drop_their_padding() {
        let rows = vec![0b1010_0000, 0b1100_0000, 0xFF, 0xC0];
        let stream = image_stream(10, 2, "DeviceGray".into(), 1, rows);
        let bitmap = Bitmap::describe(&lopdf::Document::new(), &stream.dict).unwrap();
        let samples = bitmap.samples(&stream.content).unwrap();
        assert_eq!(&samples[..10], &[255, 0, 255, 0, 0, 0, 0, 0, 255, 255]);
        assert_eq!(&samples[10..], &[255; 10]);
        assert!(bitmap.samples(&[0xFF]).is_err());
    }

    #[test]
    fn indexed_palette_is_expanded() {
        let palette = Object::String(vec![255, 0, 0, 0, 0, 255], lopdf::StringFormat::Hexadecimal);
        let colour =
            Object::Array(vec!["Indexed".into(), "DeviceRGB".into(), Object::Integer(1), palette]);
        let image = image_stream(16, 8, colour, 8, [0u8, 1].repeat(64));
        let pdf = scanned_page(image);
        assert_eq!(ocr_pages(&pdf, "scan.pdf", &PixelOcr), "16x8 [255, 0, 0] [0, 0, 255]");
    }
}
