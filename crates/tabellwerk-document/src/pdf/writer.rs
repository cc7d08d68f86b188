// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Searchable text PDF generation with `printpdf` 0.8.
//
// Used to turn recognised OCR text into a selectable, searchable document.
// printpdf builds pages from `Vec<Op>` operation lists; the document is
// serialised in one go with `PdfDocument::save()`.

use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument as PrintDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point,
    Pt, TextItem,
};
use tabellwerk_core::PaperSize;
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, info, instrument, warn};

const FONT: BuiltinFont = BuiltinFont::Helvetica;
const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const MARGIN_MM: f32 = 20.0;

/// Lays recognised text out as a plain Helvetica document.
pub struct TextPdfWriter {
    paper_size: PaperSize,
    title: String,
}

impl TextPdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: "Tabellwerk searchable PDF".into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Characters that fit on one line at the configured paper width.
    fn chars_per_line(&self) -> usize {
        let (w_mm, _) = self.paper_size.dimensions_mm();
        let usable_mm = w_mm as f32 - 2.0 * MARGIN_MM;
        // Helvetica averages about half an em per glyph; 1pt = 0.3528mm.
        let glyph_mm = 0.5 * FONT_SIZE_PT * 0.3528;
        ((usable_mm / glyph_mm) as usize).max(1)
    }

    /// Render `text` to PDF bytes, wrapping long lines and breaking pages.
    #[instrument(skip(self, text), fields(text_len = text.len(), paper = ?self.paper_size))]
    pub fn render(&self, text: &str) -> Vec<u8> {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        let (page_w, page_h) = (Mm(w_mm as f32), Mm(h_mm as f32));
        let page_h_pt = page_h.into_pt().0;
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let lines_per_page = (((page_h_pt - 2.0 * margin_pt) / LINE_HEIGHT_PT) as usize).max(1);

        let lines = wrap_text(text, self.chars_per_line());
        let mut pages: Vec<PdfPage> = lines
            .chunks(lines_per_page)
            .map(|chunk| {
                let ops = chunk
                    .iter()
                    .enumerate()
                    .flat_map(|(i, line)| {
                        let y = page_h_pt - margin_pt - i as f32 * LINE_HEIGHT_PT;
                        [
                            Op::StartTextSection,
                            Op::SetTextCursor {
                                pos: Point {
                                    x: Pt(margin_pt),
                                    y: Pt(y),
                                },
                            },
                            Op::SetFontSizeBuiltinFont {
                                size: Pt(FONT_SIZE_PT),
                                font: FONT,
                            },
                            Op::WriteTextBuiltinFont {
                                items: vec![TextItem::Text(line.clone())],
                                font: FONT,
                            },
                            Op::EndTextSection,
                        ]
                    })
                    .collect();
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let mut doc = PrintDocument::new(&self.title);
        doc.with_pages(pages);
        debug!(lines = lines.len(), pages = doc.pages.len(), "Text layout complete");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }
        bytes
    }

    /// Render `text` and write it to `path`.
    pub fn write(&self, text: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render(text))
            .map_err(|err| TabellwerkError::Write(format!("{}: {}", path.display(), err)))?;
        info!(path = %path.display(), "Searchable PDF written");
        Ok(())
    }
}

/// `<dir>/<stem>_searchable.pdf` for a source PDF.
pub fn searchable_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into());
    source.with_file_name(format!("{stem}_searchable.pdf"))
}

/// Word-wrap to at most `max_width` characters per line. Existing newlines are
/// kept; words longer than a line are broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_width {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_width);
                out.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let current_len = current.chars().count();
            if current.is_empty() {
                current = word;
            } else if current_len + 1 + word.chars().count() <= max_width {
                current.push(' ');
                current.push_str(&word);
            } else {
                out.push(std::mem::replace(&mut current, word));
            }
        }
        out.push(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_short_lines() {
        assert_eq!(wrap_text("a b\nc", 10), vec!["a b", "c"]);
    }

    #[test]
    fn wrap_breaks_at_width() {
        assert_eq!(wrap_text("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_preserves_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn title_can_name_the_source() {
        let writer = TextPdfWriter::new(PaperSize::A4).with_title("invoice (searchable)");
        assert_eq!(writer.title, "invoice (searchable)");
        assert!(writer.render("total 42").starts_with(b"%PDF"));
    }

    #[test]
    fn render_produces_loadable_pdf() {
        let text = (0..200).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let bytes = TextPdfWriter::new(PaperSize::A4).render(&text);
        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 2);
    }

    #[test]
    fn searchable_path_sits_next_to_source() {
        assert_eq!(
            searchable_output_path(Path::new("/data/report.pdf")),
            PathBuf::from("/data/report_searchable.pdf")
        );
    }
}
