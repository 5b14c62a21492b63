//! PDF rasterisation and word extraction through PDFium.
//!
//! Pages are rendered to `<pdf stem>_page<N>.png` (N from 1). Word boxes are
//! read from the page text layer and scaled into the pixel frame of the page
//! image rendered before, so the two steps must run in that order.

use crate::config::DatasetLayout;
use crate::dataset::common_structs::WordAnnotation;
use crate::dataset::data_loaders::list_files;
use crate::error::{InvoiceYoloError, Result};
use pdfium_render::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// PDF user space unit, 1/72 inch.
pub const POINTS_PER_INCH: f32 = 72.;

/// `PDFIUM_LIB_PATH` when set, otherwise the system library.
pub fn bind_pdfium() -> Result<Pdfium> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) => Pdfium::bind_to_library(&path)
            .map_err(|e| InvoiceYoloError::Pdf(format!("binding to {}: {}", path, e)))?,
        Err(_) => Pdfium::bind_to_system_library()
            .map_err(|e| InvoiceYoloError::Pdf(format!("binding to system pdfium: {}", e)))?,
    };
    Ok(Pdfium::new(bindings))
}

pub fn page_image_name(pdf_stem: &str, page_index: usize) -> String {
    format!("{}_page{}.png", pdf_stem, page_index + 1)
}

fn pdf_stem(pdf_path: &Path) -> String {
    pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn load_document<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>> {
    if !pdf_path.exists() {
        return Err(InvoiceYoloError::FileNotFound {
            path: pdf_path.to_owned(),
        });
    }
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| InvoiceYoloError::Pdf(format!("{}: {}", pdf_path.display(), e)))
}

/// Renders every page of `pdf_path` into `out_dir` at `dpi`.
pub fn render_pdf(pdfium: &Pdfium, pdf_path: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>> {
    let document = load_document(pdfium, pdf_path)?;
    let stem = pdf_stem(pdf_path);
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);
    fs::create_dir_all(out_dir).map_err(|e| InvoiceYoloError::io(out_dir, e))?;

    let mut written = vec![];
    for (page_index, page) in document.pages().iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| InvoiceYoloError::Pdf(format!("rendering page {}: {}", page_index + 1, e)))?;
        let image = bitmap.as_image().to_rgb8();
        let out = out_dir.join(page_image_name(&stem, page_index));
        image.save(&out).map_err(|e| InvoiceYoloError::image(&out, e))?;
        debug!("{} -> {}x{}", out.display(), image.width(), image.height());
        written.push(out);
    }
    Ok(written)
}

/// One glyph of the text layer, bounds in PDF points (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfGlyph {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

/// A word and the union of its glyph bounds, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfWord {
    pub text: String,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

/// Splits the glyph stream at whitespace.
pub fn group_words(glyphs: impl IntoIterator<Item = PdfGlyph>) -> Vec<PdfWord> {
    let mut words = vec![];
    let mut current: Option<PdfWord> = None;
    for glyph in glyphs {
        if glyph.ch.is_whitespace() || glyph.ch.is_control() {
            words.extend(current.take());
            continue;
        }
        match current.as_mut() {
            Some(word) => {
                word.text.push(glyph.ch);
                word.left = word.left.min(glyph.left);
                word.bottom = word.bottom.min(glyph.bottom);
                word.right = word.right.max(glyph.right);
                word.top = word.top.max(glyph.top);
            }
            None => {
                current = Some(PdfWord {
                    text: glyph.ch.to_string(),
                    left: glyph.left,
                    bottom: glyph.bottom,
                    right: glyph.right,
                    top: glyph.top,
                })
            }
        }
    }
    words.extend(current);
    words
}

/// Scales a word from a `page_width` x `page_height` point page onto a
/// `img_width` x `img_height` image, with the origin moved to the top-left.
pub fn word_to_annotation(
    word: &PdfWord,
    page: usize,
    (page_width, page_height): (f32, f32),
    (img_width, img_height): (u32, u32),
) -> WordAnnotation {
    let scale_x = img_width as f64 / page_width as f64;
    let scale_y = img_height as f64 / page_height as f64;
    let page_height = page_height as f64;
    WordAnnotation {
        text: word.text.clone(),
        bbox: vec![
            word.left as f64 * scale_x,
            (page_height - word.top as f64) * scale_y,
            word.right as f64 * scale_x,
            (page_height - word.bottom as f64) * scale_y,
        ],
        page,
    }
}

fn page_glyphs(page: &PdfPage) -> Result<Vec<PdfGlyph>> {
    let text = page
        .text()
        .map_err(|e| InvoiceYoloError::Pdf(format!("reading text layer: {}", e)))?;
    let mut glyphs = vec![];
    for ch in text.chars().iter() {
        let c = ch.unicode_char().unwrap_or(' ');
        match ch.loose_bounds() {
            Ok(bounds) => glyphs.push(PdfGlyph {
                ch: c,
                left: bounds.left().value,
                bottom: bounds.bottom().value,
                right: bounds.right().value,
                top: bounds.top().value,
            }),
            // no geometry, treat as a word break
            Err(_) => glyphs.push(PdfGlyph {
                ch: ' ',
                left: 0.,
                bottom: 0.,
                right: 0.,
                top: 0.,
            }),
        }
    }
    Ok(glyphs)
}

/// Word boxes per page, in the pixel frame of the page images in `image_dir`.
///
/// A page without an image is logged and left empty so that the outer index
/// still equals the page index.
pub fn extract_words(pdfium: &Pdfium, pdf_path: &Path, image_dir: &Path) -> Result<Vec<Vec<WordAnnotation>>> {
    let document = load_document(pdfium, pdf_path)?;
    let stem = pdf_stem(pdf_path);
    let mut pages = vec![];
    for (page_index, page) in document.pages().iter().enumerate() {
        let image_file = image_dir.join(page_image_name(&stem, page_index));
        let image_size = match image::image_dimensions(&image_file) {
            Ok(size) => size,
            Err(e) => {
                warn!("Image not usable: {} ({}), skipping page", image_file.display(), e);
                pages.push(vec![]);
                continue;
            }
        };
        let page_size = (page.width().value, page.height().value);
        let words: Vec<WordAnnotation> = group_words(page_glyphs(&page)?)
            .iter()
            .map(|word| word_to_annotation(word, page_index, page_size, image_size))
            .collect();
        debug!("{} page {}: {} words", stem, page_index + 1, words.len());
        pages.push(words);
    }
    Ok(pages)
}

/// Renders every `*.pdf` in `layout.pdf_dir` into `layout.image_dir`.
pub fn rasterize_dir(pdfium: &Pdfium, layout: &DatasetLayout, dpi: u32) -> Result<usize> {
    let pdfs = list_files(&layout.pdf_dir, &["pdf"])?;
    let mut pages = 0;
    for pdf in &pdfs {
        match render_pdf(pdfium, pdf, &layout.image_dir, dpi) {
            Ok(written) => {
                info!("{}: {} pages", pdf.display(), written.len());
                pages += written.len();
            }
            Err(e) => warn!("Skipping {}: {}", pdf.display(), e),
        }
    }
    info!(
        "Rendered {} pages from {} PDFs into {}",
        pages,
        pdfs.len(),
        layout.image_dir.display()
    );
    Ok(pages)
}

/// Writes `<pdf stem>.json` into `layout.annotation_dir` for every `*.pdf` in `layout.pdf_dir`.
pub fn extract_annotations_dir(pdfium: &Pdfium, layout: &DatasetLayout) -> Result<usize> {
    let pdfs = list_files(&layout.pdf_dir, &["pdf"])?;
    fs::create_dir_all(&layout.annotation_dir)
        .map_err(|e| InvoiceYoloError::io(&layout.annotation_dir, e))?;
    let mut written = 0;
    for pdf in &pdfs {
        let pages = match extract_words(pdfium, pdf, &layout.image_dir) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Skipping {}: {}", pdf.display(), e);
                continue;
            }
        };
        let out = layout.annotation_dir.join(format!("{}.json", pdf_stem(pdf)));
        let file = File::create(&out).map_err(|e| InvoiceYoloError::io(&out, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &pages)
            .map_err(|e| InvoiceYoloError::json(&out, e))?;
        info!("Saved: {}", out.display());
        written += 1;
    }
    Ok(written)
}
