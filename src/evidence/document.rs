//! One-page evidence document.

use std::fmt::Write as _;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{ImageFormat, RgbImage, imageops};

use crate::error::RenderError;

/// Page size in points (A4 portrait).
pub const PAGE_WIDTH_PT: f64 = 595.0;
pub const PAGE_HEIGHT_PT: f64 = 842.0;
const MARGIN_PT: f64 = 40.0;

pub const DOCUMENT_TITLE: &str = "Traffic Challan / Overspeed Notice";

/// Content of one evidence document.
#[derive(Debug, Clone)]
pub struct EvidenceDocument<'a> {
    /// Human-readable issuance time
    pub timestamp: &'a str,
    pub plate_text: &'a str,
    pub speed_kmh: f64,
    /// Vehicle crop, embedded into the document
    pub image: &'a RgbImage,
}

/// Materializes an [`EvidenceDocument`] to a file.
pub trait DocumentRenderer: Send + Sync {
    /// File extension of rendered documents, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, document: &EvidenceDocument<'_>, out: &Path) -> Result<(), RenderError>;
}

/// Scale `width` x `height` to fit inside `max_width` x `max_height`,
/// preserving aspect ratio and never enlarging.
pub fn fit_within(width: u32, height: u32, max_width: f64, max_height: f64) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (max_width / f64::from(width))
        .min(max_height / f64::from(height))
        .min(1.0);
    (
        (f64::from(width) * scale) as u32,
        (f64::from(height) * scale) as u32,
    )
}

/// Printable area reserved for the evidence image.
pub fn image_area() -> (f64, f64) {
    (PAGE_WIDTH_PT - 2.0 * MARGIN_PT, PAGE_HEIGHT_PT / 2.0)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Scale `image` into the page's image area and encode it as a JPEG
/// `data:` URI.
fn embed_jpeg(image: &RgbImage, width: u32, height: u32) -> Result<String, RenderError> {
    let scaled;
    let image = if (width, height) == image.dimensions() {
        image
    } else {
        scaled = imageops::resize(image, width, height, imageops::FilterType::Triangle);
        &scaled
    };
    let mut jpeg = Vec::new();
    image.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    Ok(format!("data:image/jpeg;base64,{b64}"))
}

/// Renders a self-contained A4 page as SVG with the evidence image inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgPageRenderer;

impl SvgPageRenderer {
    pub fn to_svg(&self, document: &EvidenceDocument<'_>) -> Result<String, RenderError> {
        let (max_w, max_h) = image_area();
        let (img_w, img_h) = fit_within(document.image.width(), document.image.height(), max_w, max_h);
        if img_w == 0 || img_h == 0 {
            return Err(RenderError::EmptyImage);
        }

        let mut svg = String::new();
        let fmt_err = |e: std::fmt::Error| RenderError::Other(e.to_string());
        writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#).map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PAGE_WIDTH_PT}pt" height="{PAGE_HEIGHT_PT}pt" viewBox="0 0 {PAGE_WIDTH_PT} {PAGE_HEIGHT_PT}">"#
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"  <text x="{MARGIN_PT}" y="60" font-family="Helvetica" font-weight="bold" font-size="16">{}</text>"#,
            escape_xml(DOCUMENT_TITLE)
        )
        .map_err(fmt_err)?;
        let lines = [
            (100, format!("Timestamp: {}", document.timestamp)),
            (120, format!("Detected Plate: {}", document.plate_text)),
            (140, format!("Recorded Speed: {:.1} km/h", document.speed_kmh)),
        ];
        for (y, line) in lines {
            writeln!(
                svg,
                r#"  <text x="{MARGIN_PT}" y="{y}" font-family="Helvetica" font-size="12">{}</text>"#,
                escape_xml(&line)
            )
            .map_err(fmt_err)?;
        }
        let data_uri = embed_jpeg(document.image, img_w, img_h)?;
        writeln!(
            svg,
            r#"  <image x="{MARGIN_PT}" y="160" width="{img_w}" height="{img_h}" href="{data_uri}"/>"#
        )
        .map_err(fmt_err)?;
        writeln!(svg, "</svg>").map_err(fmt_err)?;
        Ok(svg)
    }
}

impl DocumentRenderer for SvgPageRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, document: &EvidenceDocument<'_>, out: &Path) -> Result<(), RenderError> {
        let svg = self.to_svg(document)?;
        fs::write(out, svg)?;
        Ok(())
    }
}
