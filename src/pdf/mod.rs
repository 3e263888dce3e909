//! # PDF Serializer
//!
//! Writes finished comic pages to a PDF file. Each page is one full-page
//! raster image (the composited panels and bubble shapes) with the bubble
//! text set on top as real Helvetica text, so dialogue stays sharp and
//! selectable at any zoom.
//!
//! This is a from-scratch PDF 1.7 writer; the subset needed here is small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, font, images, pages
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Inputs use a top-left origin in points, like the rest of the crate. The
//! flip to PDF's bottom-left origin happens only here.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{PanelcraftError, Result};
use crate::geometry::{Orientation, Rect, Size};
use crate::model::PageEncoding;
use crate::style::Color;

/// A4 short side in points.
pub const A4_WIDTH_PT: f64 = 595.28;
/// A4 long side in points.
pub const A4_HEIGHT_PT: f64 = 841.89;

/// A4 in the given orientation.
pub fn page_size(orientation: Orientation) -> Size {
    let (width, height) = orientation.orient(A4_WIDTH_PT, A4_HEIGHT_PT);
    Size::new(width, height)
}

/// Encoded pixels of one page image.
#[derive(Debug, Clone)]
pub enum PageImageData {
    /// Baseline JPEG, embedded as-is with DCTDecode.
    Jpeg(Vec<u8>),
    /// Packed 8-bit RGB, deflated on write.
    Rgb(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct PageImage {
    pub width_px: u32,
    pub height_px: u32,
    pub data: PageImageData,
}

impl PageImage {
    /// Encode packed RGB rows the way `encoding` asks.
    pub fn encode(rgb: Vec<u8>, width_px: u32, height_px: u32, encoding: PageEncoding) -> Result<Self> {
        let expected = width_px as usize * height_px as usize * 3;
        if rgb.len() != expected {
            return Err(PanelcraftError::render(format!(
                "page image is {} bytes, expected {}",
                rgb.len(),
                expected
            )));
        }

        let data = match encoding {
            PageEncoding::Jpeg { quality } => {
                let mut buf = Vec::new();
                let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
                encoder
                    .encode(&rgb, width_px, height_px, image::ColorType::Rgb8)
                    .map_err(|e| PanelcraftError::render(format!("JPEG encoding failed: {}", e)))?;
                PageImageData::Jpeg(buf)
            }
            PageEncoding::Flate => PageImageData::Rgb(rgb),
        };

        Ok(Self {
            width_px,
            height_px,
            data,
        })
    }
}

/// One line of overlay text. `x` and `baseline` are in points from the
/// page's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    pub font_size: f64,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct PdfPage {
    pub size: Size,
    pub image: PageImage,
    /// Where the image is placed, in points from the top-left corner.
    pub image_rect: Rect,
    pub text: Vec<TextRun>,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict: &str, body: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict, body.len());
        data.extend_from_slice(body);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write pages to a PDF byte vector.
    pub fn write(&self, pages: &[PdfPage], metadata: &Metadata) -> Vec<u8> {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut builder = PdfBuilder {
            objects: (0..3).map(|_| PdfObject { data: Vec::new() }).collect(),
        };

        let font_id = builder.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec(),
        );

        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());
        for page in pages {
            let image_id = Self::write_image_xobject(&mut builder, &page.image);

            let content = self.build_content_stream(page);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << /F0 {} 0 R >> /XObject << /Im0 {} 0 R >> >> >>",
                page.size.width, page.size.height, content_id, font_id, image_id
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_obj_ids.len()).into_bytes();

        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
        }
        let _ = write!(info, "/Producer (Panelcraft {}) /Creator (Panelcraft) >>", env!("CARGO_PKG_VERSION"));
        let info_id = builder.push(info.into_bytes());

        self.serialize(&builder, info_id)
    }

    /// Image first, then every text line on top of it.
    fn build_content_stream(&self, page: &PdfPage) -> String {
        let mut stream = String::new();
        let page_height = page.size.height;
        let r = &page.image_rect;

        // The image XObject fills the unit square; cm maps it onto image_rect.
        let _ = write!(
            stream,
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im0 Do\nQ\n",
            r.width,
            r.height,
            r.x,
            page_height - r.y - r.height
        );

        if page.text.is_empty() {
            return stream;
        }

        let _ = write!(stream, "BT\n");
        for run in &page.text {
            if run.text.is_empty() {
                continue;
            }
            let _ = write!(
                stream,
                "{:.3} {:.3} {:.3} rg\n/F0 {:.2} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                run.color.r,
                run.color.g,
                run.color.b,
                run.font_size,
                run.x,
                page_height - run.baseline,
                Self::encode_text(&run.text)
            );
        }
        let _ = write!(stream, "ET\n");
        stream
    }

    fn write_image_xobject(builder: &mut PdfBuilder, image: &PageImage) -> usize {
        match &image.data {
            PageImageData::Jpeg(data) => {
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px, image.height_px
                );
                builder.push_stream(&dict, data)
            }
            PageImageData::Rgb(rgb) => {
                let compressed = compress_to_vec_zlib(rgb, 6);
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
                    image.width_px, image.height_px
                );
                builder.push_stream(&dict, &compressed)
            }
        }
    }

    /// Encode text as the body of a WinAnsi literal string. Characters the
    /// encoding lacks become `?`.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_page(encoding: PageEncoding) -> PdfPage {
        let image = PageImage::encode(vec![255; 4 * 4 * 3], 4, 4, encoding).unwrap();
        PdfPage {
            size: page_size(Orientation::Portrait),
            image,
            image_rect: Rect::new(10.0, 20.0, 100.0, 200.0),
            text: vec![],
        }
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_encode_text_escapes() {
        assert_eq!(PdfWriter::encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::encode_text("back\\slash"), "back\\\\slash");
        assert_eq!(PdfWriter::encode_text("caf\u{e9}"), "caf\\351");
        assert_eq!(PdfWriter::encode_text("\u{2014}"), "\\227");
        assert_eq!(PdfWriter::encode_text("\u{4e2d}"), "?");
    }

    #[test]
    fn test_page_size_orientation() {
        let portrait = page_size(Orientation::Portrait);
        let landscape = page_size(Orientation::Landscape);
        assert_eq!((portrait.width, portrait.height), (A4_WIDTH_PT, A4_HEIGHT_PT));
        assert_eq!((landscape.width, landscape.height), (A4_HEIGHT_PT, A4_WIDTH_PT));
    }

    #[test]
    fn test_document_structure() {
        let pages = vec![blank_page(PageEncoding::default()), blank_page(PageEncoding::Flate)];
        let metadata = Metadata {
            title: Some("My Comic".to_string()),
        };
        let bytes = PdfWriter::new().write(&pages, &metadata);

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, "/Count 2"));
        assert!(contains(&bytes, "/Filter /DCTDecode"));
        assert!(contains(&bytes, "/Title (My Comic)"));
        assert!(contains(&bytes, "/MediaBox [0 0 595.28 841.89]"));
        assert!(contains(&bytes, "/BaseFont /Helvetica"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = PdfWriter::new().write(&[blank_page(PageEncoding::Flate)], &Metadata::default());
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let xref = text.rfind("xref\n").unwrap();
        let entries: Vec<&str> = text[xref..].lines().skip(3).take_while(|l| l.ends_with(" n ")).collect();
        assert!(!entries.is_empty());
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(bytes[offset..].starts_with(format!("{} 0 obj", i + 1).as_bytes()));
        }
    }

    #[test]
    fn test_content_stream_flips_y() {
        let mut page = blank_page(PageEncoding::Flate);
        page.text.push(TextRun {
            text: "Hi".to_string(),
            x: 30.0,
            baseline: 41.89,
            font_size: 14.0,
            color: Color::BLACK,
        });
        let content = PdfWriter::new().build_content_stream(&page);
        // 841.89 - 20 - 200
        assert!(content.contains("100.0000 0 0 200.0000 10.0000 621.8900 cm"));
        assert!(content.contains("1 0 0 1 30.00 800.00 Tm"));
        assert!(content.contains("(Hi) Tj"));
        let image_at = content.find("/Im0 Do").unwrap();
        assert!(content.find("BT").unwrap() > image_at);
    }

    #[test]
    fn test_encode_rejects_wrong_length() {
        assert!(PageImage::encode(vec![0; 5], 2, 2, PageEncoding::Flate).is_err());
    }
}
