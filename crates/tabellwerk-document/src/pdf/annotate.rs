// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Writes viewer annotations into a PDF as standard annotation dictionaries.

use lopdf::{Dictionary, Object, ObjectId, dictionary};
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{Annotation, AnnotationKind, Point, Rect};
use tracing::{debug, info, instrument, warn};

use super::document::{PdfDocument, media_box_height};

/// Stroke colours, RGB 0..1.
const HIGHLIGHT_RGB: [f32; 3] = [1.0, 1.0, 0.0];
const UNDERLINE_RGB: [f32; 3] = [0.0, 0.0, 1.0];
const INK_RGB: [f32; 3] = [1.0, 0.0, 0.0];

/// Merge `annotations` into `doc`. Returns how many were written.
///
/// Image annotations and annotations on pages the document no longer has are
/// skipped with a log line.
#[instrument(skip_all, fields(count = annotations.len()))]
pub fn apply_annotations(doc: &mut PdfDocument, annotations: &[Annotation]) -> Result<usize> {
    let mut written = 0;
    for annotation in annotations {
        let Ok(page_id) = doc.page_id(annotation.page) else {
            warn!(page = annotation.page, "Annotation refers to a missing page, skipped");
            continue;
        };
        let height = media_box_height(doc.inner(), page_id);
        let Some(dict) = annotation_dictionary(annotation, height) else {
            debug!(kind = ?annotation.kind, "Annotation kind not written to PDF");
            continue;
        };

        let document = doc.inner_mut();
        let annot_id = document.add_object(dict);
        attach_to_page(document, page_id, annot_id)?;
        written += 1;
    }
    info!(written, "Annotations merged into PDF");
    Ok(written)
}

/// Append `annot_id` to the page's `/Annots`, which may be inline or indirect.
fn attach_to_page(document: &mut lopdf::Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    let indirect = document
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| annots.as_reference().ok());

    if let Some(array_id) = indirect {
        if let Ok(Object::Array(items)) = document.get_object_mut(array_id) {
            items.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page = document
        .get_dictionary_mut(page_id)
        .map_err(|err| TabellwerkError::PdfError(format!("page dictionary: {}", err)))?;
    match page.get_mut(b"Annots") {
        Ok(Object::Array(items)) => items.push(Object::Reference(annot_id)),
        _ => page.set("Annots", vec![Object::Reference(annot_id)]),
    }
    Ok(())
}

/// Convert a top-left-origin rect into a PDF `/Rect` array.
fn pdf_rect(rect: Rect, page_height: f32) -> Vec<Object> {
    vec![
        Object::Real(rect.x),
        Object::Real(page_height - rect.bottom()),
        Object::Real(rect.right()),
        Object::Real(page_height - rect.y),
    ]
}

fn flip(point: Point, page_height: f32) -> [Object; 2] {
    [Object::Real(point.x), Object::Real(page_height - point.y)]
}

fn colour(rgb: [f32; 3]) -> Vec<Object> {
    rgb.iter().copied().map(Object::Real).collect()
}

fn pdf_string(text: &str) -> Object {
    Object::string_literal(text)
}

/// Build the annotation dictionary for one mark, or `None` when the kind has
/// no PDF counterpart.
fn annotation_dictionary(annotation: &Annotation, page_height: f32) -> Option<Dictionary> {
    let bounds = annotation.bounds;
    match annotation.kind {
        AnnotationKind::Highlight | AnnotationKind::Underline => {
            let (subtype, rgb) = if annotation.kind == AnnotationKind::Highlight {
                ("Highlight", HIGHLIGHT_RGB)
            } else {
                ("Underline", UNDERLINE_RGB)
            };
            let top = page_height - bounds.y;
            let bottom = page_height - bounds.bottom();
            // QuadPoints order: upper-left, upper-right, lower-left, lower-right.
            let quad: Vec<Object> = [
                bounds.x,
                top,
                bounds.right(),
                top,
                bounds.x,
                bottom,
                bounds.right(),
                bottom,
            ]
            .into_iter()
            .map(Object::Real)
            .collect();
            Some(dictionary! {
                "Type" => "Annot",
                "Subtype" => subtype,
                "Rect" => pdf_rect(bounds, page_height),
                "QuadPoints" => quad,
                "C" => colour(rgb),
            })
        }
        AnnotationKind::Text => {
            let text = annotation.text_content()?;
            let rect = Rect::new(bounds.x, bounds.y, bounds.width.max(200.0), bounds.height.max(20.0));
            Some(dictionary! {
                "Type" => "Annot",
                "Subtype" => "FreeText",
                "Rect" => pdf_rect(rect, page_height),
                "Contents" => pdf_string(text),
                "DA" => pdf_string("/Helv 12 Tf 0 0 0 rg"),
            })
        }
        AnnotationKind::Note => {
            let text = annotation.text_content()?;
            let rect = Rect::new(bounds.x, bounds.y, 20.0, 20.0);
            Some(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Text",
                "Rect" => pdf_rect(rect, page_height),
                "Contents" => pdf_string(text),
                "Name" => "Note",
            })
        }
        AnnotationKind::Draw => {
            let points = annotation.stroke()?;
            let rect = Rect::bounding(points)?;
            let path: Vec<Object> = points.iter().flat_map(|p| flip(*p, page_height)).collect();
            Some(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Ink",
                "Rect" => pdf_rect(rect, page_height),
                "InkList" => vec![Object::Array(path)],
                "C" => colour(INK_RGB),
            })
        }
        AnnotationKind::Image => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabellwerk_core::AnnotationPayload;

    fn subtypes(doc: &PdfDocument, page: u32) -> Vec<String> {
        let inner = doc.inner();
        let page_id = doc.page_id(page).unwrap();
        let annots = match inner.get_dictionary(page_id).unwrap().get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        annots
            .iter()
            .map(|r| {
                let dict = inner.get_dictionary(r.as_reference().unwrap()).unwrap();
                String::from_utf8(dict.get(b"Subtype").unwrap().as_name().unwrap().to_vec()).unwrap()
            })
            .collect()
    }

    #[test]
    fn writes_supported_kinds_and_skips_images() {
        let mut doc = PdfDocument::blank(2, 612.0, 792.0);
        let stroke = vec![Point::new(10.0, 10.0), Point::new(40.0, 30.0)];
        let annotations = vec![
            Annotation::highlight(1, Point::new(50.0, 50.0)),
            Annotation::text(1, Point::new(10.0, 10.0), "hello"),
            Annotation::new(
                AnnotationKind::Draw,
                2,
                Rect::bounding(&stroke).unwrap(),
                AnnotationPayload::Stroke(stroke),
            ),
            Annotation::new(
                AnnotationKind::Image,
                2,
                Rect::at(Point::new(0.0, 0.0)),
                AnnotationPayload::ImagePath("logo.png".into()),
            ),
        ];

        assert_eq!(apply_annotations(&mut doc, &annotations).unwrap(), 3);
        assert_eq!(subtypes(&doc, 1), ["Highlight", "FreeText"]);
        assert_eq!(subtypes(&doc, 2), ["Ink"]);
    }

    #[test]
    fn rect_is_flipped_to_bottom_left_origin() {
        let rect = pdf_rect(Rect::new(10.0, 20.0, 100.0, 20.0), 800.0);
        let values: Vec<f32> = rect.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(values, [10.0, 760.0, 110.0, 780.0]);
    }

    #[test]
    fn annotations_on_missing_pages_are_skipped() {
        let mut doc = PdfDocument::blank(1, 612.0, 792.0);
        let annotations = vec![Annotation::highlight(3, Point::new(0.0, 0.0))];
        assert_eq!(apply_annotations(&mut doc, &annotations).unwrap(), 0);
    }

    #[test]
    fn annotated_pdf_reloads() {
        let mut doc = PdfDocument::blank(1, 612.0, 792.0);
        apply_annotations(&mut doc, &[Annotation::highlight(1, Point::new(5.0, 5.0))]).unwrap();
        let reloaded = PdfDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(subtypes(&reloaded, 1), ["Highlight"]);
    }
}
