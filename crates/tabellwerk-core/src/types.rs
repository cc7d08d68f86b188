// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Tabellwerk.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry ----------------------------------------------------------------

/// A point in page space: PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized rectangle anchored at a point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Smallest rectangle containing every point. `None` for an empty slice.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

// -- Annotations -------------------------------------------------------------

/// Annotation tools offered in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Text,
    Highlight,
    Underline,
    Draw,
    Image,
    /// Sticky note.
    Note,
}

impl AnnotationKind {
    /// Tools that accumulate points while the pointer is dragged.
    pub fn is_freehand(&self) -> bool {
        matches!(self, Self::Draw)
    }

    /// Tools that need a string from the user before anything is placed.
    pub fn needs_text(&self) -> bool {
        matches!(self, Self::Text | Self::Note)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Draw => "Draw",
            Self::Image => "Image",
            Self::Note => "Sticky Note",
        }
    }
}

/// Kind-specific annotation content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationPayload {
    None,
    Text(String),
    ImagePath(PathBuf),
    Stroke(Vec<Point>),
}

/// A user-drawn mark on a page. Immutable once created; only undo removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    /// 1-based page number.
    pub page: u32,
    pub bounds: Rect,
    pub payload: AnnotationPayload,
}

impl Annotation {
    pub fn new(kind: AnnotationKind, page: u32, bounds: Rect, payload: AnnotationPayload) -> Self {
        Self {
            id: AnnotationId::new(),
            kind,
            page,
            bounds,
            payload,
        }
    }

    /// Fixed-size 100x20 mark, matching the viewer's click-to-highlight tool.
    pub fn highlight(page: u32, at: Point) -> Self {
        Self::new(
            AnnotationKind::Highlight,
            page,
            Rect::new(at.x, at.y, 100.0, 20.0),
            AnnotationPayload::None,
        )
    }

    pub fn text(page: u32, at: Point, text: impl Into<String>) -> Self {
        Self::new(
            AnnotationKind::Text,
            page,
            Rect::at(at),
            AnnotationPayload::Text(text.into()),
        )
    }

    /// The string payload for text and note annotations.
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            AnnotationPayload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The point list for freehand annotations.
    pub fn stroke(&self) -> Option<&[Point]> {
        match &self.payload {
            AnnotationPayload::Stroke(points) => Some(points),
            _ => None,
        }
    }
}

// -- Paper -------------------------------------------------------------------

/// Standard paper sizes for generated PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
        }
    }
}

// -- Extraction --------------------------------------------------------------

/// Engine choice as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Engine {
    #[default]
    #[serde(alias = "auto")]
    Auto,
    #[serde(alias = "tabula")]
    Tabula,
    #[serde(alias = "camelot")]
    Camelot,
    #[serde(rename = "OCR", alias = "ocr", alias = "Ocr")]
    Ocr,
}

impl Engine {
    /// Concrete backend this engine runs on. `Auto` is a fixed alias for
    /// Tabula; there is no content-based selection.
    pub fn backend(&self) -> Backend {
        match self {
            Self::Auto | Self::Tabula => Backend::Tabula,
            Self::Camelot => Backend::Camelot,
            Self::Ocr => Backend::Ocr,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Tabula => "Tabula",
            Self::Camelot => "Camelot",
            Self::Ocr => "OCR",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "tabula" => Some(Self::Tabula),
            "camelot" => Some(Self::Camelot),
            "ocr" => Some(Self::Ocr),
            _ => None,
        }
    }

    pub const ALL: [Engine; 4] = [Self::Auto, Self::Tabula, Self::Camelot, Self::Ocr];
}

/// Extraction backends actually wired to external tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Layout-heuristic detector for bordered and borderless tables.
    Tabula,
    /// Ruling-line based detector.
    Camelot,
    Ocr,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Tabula => "tabula",
            Self::Camelot => "camelot",
            Self::Ocr => "ocr",
        })
    }
}

/// Which pages a conversion covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    All,
    Current(u32),
    /// User-entered range such as `1,3-5`.
    Range(String),
}

/// Detection switches passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectOptions {
    pub detect_bordered: bool,
    pub detect_borderless: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            detect_bordered: true,
            detect_borderless: true,
        }
    }
}

/// Output file format for extracted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "xlsx")]
    Spreadsheet,
    #[serde(rename = "csv")]
    DelimitedText,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "xlsx",
            Self::DelimitedText => "csv",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Spreadsheet),
            "csv" => Some(Self::DelimitedText),
            _ => None,
        }
    }
}

/// One extracted table: ordered rows of cell strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Source page, when the backend reports it.
    pub page: Option<u32>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, page: Option<u32>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            page,
            rows,
        }
    }

    /// Column count: the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// First row, treated as column names when tables are concatenated.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Every row after the header.
    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tables produced by a single conversion. Empty is a valid outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub backend: Backend,
    pub tables: Vec<Table>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionResult {
    pub fn new(backend: Backend, tables: Vec<Table>) -> Self {
        Self {
            backend,
            tables,
            extracted_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}
