// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation store: the marks drawn on the open document, the active tool,
// and snapshot-based undo.

use std::collections::VecDeque;
use std::path::PathBuf;

use tabellwerk_core::{Annotation, AnnotationKind, AnnotationPayload, Point, Rect};
use tracing::{debug, trace};

/// Undo depth used when none is configured.
pub const DEFAULT_UNDO_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTool {
    pub kind: AnnotationKind,
    pub page: u32,
}

/// Annotations for one document.
///
/// A tool interaction runs `begin_tool` → `place*` / `drag` → `complete`.
/// `complete` pushes the list as it stood at `begin_tool` onto the undo
/// stack when the interaction changed anything, so `undo` restores the
/// pre-action state wholesale. Invalid tool or page combinations are ignored
/// rather than reported.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    undo_stack: VecDeque<Vec<Annotation>>,
    undo_depth: usize,
    active: Option<ActiveTool>,
    baseline: Option<Vec<Annotation>>,
    stroke: Vec<Point>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl AnnotationStore {
    pub fn new(undo_depth: usize) -> Self {
        Self {
            annotations: Vec::new(),
            undo_stack: VecDeque::new(),
            undo_depth: undo_depth.max(1),
            active: None,
            baseline: None,
            stroke: Vec::new(),
        }
    }

    // -- Queries --------------------------------------------------------------

    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations on `page`, in insertion order.
    pub fn for_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page == page)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn active_tool(&self) -> Option<ActiveTool> {
        self.active
    }

    /// Points collected so far by the draw tool.
    pub fn stroke_in_progress(&self) -> &[Point] {
        &self.stroke
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    // -- Mutation -------------------------------------------------------------

    /// Append an annotation. Page 0 does not exist and is ignored.
    ///
    /// Outside a tool interaction the addition is its own undoable action.
    pub fn add(&mut self, annotation: Annotation) {
        if annotation.page == 0 {
            debug!(kind = ?annotation.kind, "Ignoring annotation on page 0");
            return;
        }
        if self.baseline.is_none() {
            self.push_undo(self.annotations.clone());
        }
        self.annotations.push(annotation);
    }

    /// Make `kind` the active tool on `page`. Nothing is created yet.
    pub fn begin_tool(&mut self, kind: AnnotationKind, page: u32) {
        if page == 0 {
            return;
        }
        if self.active.is_some() {
            self.complete();
        }
        self.active = Some(ActiveTool { kind, page });
        self.baseline = Some(self.annotations.clone());
        self.stroke.clear();
        trace!(?kind, page, "Tool started");
    }

    /// Click with the active tool. Highlight and underline create a fixed
    /// 100x20 mark at the point; other tools need more input and ignore this.
    pub fn place(&mut self, at: Point) {
        let Some(tool) = self.active else { return };
        match tool.kind {
            AnnotationKind::Highlight => self.add(Annotation::highlight(tool.page, at)),
            AnnotationKind::Underline => self.add(Annotation::new(
                AnnotationKind::Underline,
                tool.page,
                Rect::new(at.x, at.y, 100.0, 20.0),
                AnnotationPayload::None,
            )),
            _ => {}
        }
    }

    /// Place a text or sticky-note annotation. Blank text is ignored.
    pub fn place_text(&mut self, at: Point, text: &str) {
        let Some(tool) = self.active else { return };
        if !tool.kind.needs_text() || text.trim().is_empty() {
            return;
        }
        self.add(Annotation::new(
            tool.kind,
            tool.page,
            Rect::at(at),
            AnnotationPayload::Text(text.to_string()),
        ));
    }

    /// Place an image annotation with the image tool active.
    pub fn place_image(&mut self, at: Point, path: impl Into<PathBuf>) {
        let Some(tool) = self.active else { return };
        if tool.kind != AnnotationKind::Image {
            return;
        }
        self.add(Annotation::new(
            AnnotationKind::Image,
            tool.page,
            Rect::at(at),
            AnnotationPayload::ImagePath(path.into()),
        ));
    }

    /// Extend the freehand stroke. Ignored unless the draw tool is active.
    pub fn drag(&mut self, to: Point) {
        if self.active.is_some_and(|tool| tool.kind.is_freehand()) {
            self.stroke.push(to);
        }
    }

    /// Finish the interaction: commit any stroke, record the undo snapshot if
    /// the list changed, and clear the active tool.
    pub fn complete(&mut self) {
        if let Some(tool) = self.active.take() {
            let stroke = std::mem::take(&mut self.stroke);
            if tool.kind.is_freehand() {
                if let Some(bounds) = Rect::bounding(&stroke) {
                    self.annotations.push(Annotation::new(
                        tool.kind,
                        tool.page,
                        bounds,
                        AnnotationPayload::Stroke(stroke),
                    ));
                }
            }
        }

        if let Some(before) = self.baseline.take() {
            if before != self.annotations {
                self.push_undo(before);
            }
        }
    }

    /// Restore the most recent snapshot. No-op when there is nothing to undo.
    pub fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop_back() {
            self.annotations = previous;
            self.active = None;
            self.baseline = None;
            self.stroke.clear();
            debug!(remaining = self.undo_stack.len(), "Undo");
        }
    }

    /// Drop everything, e.g. when another document is opened.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.undo_stack.clear();
        self.active = None;
        self.baseline = None;
        self.stroke.clear();
    }

    fn push_undo(&mut self, snapshot: Vec<Annotation>) {
        if self.undo_stack.len() == self.undo_depth {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn highlight_complete_undo_restores_empty_list() {
        let mut store = AnnotationStore::default();
        store.begin_tool(AnnotationKind::Highlight, 2);
        store.place(p(10.0, 10.0));
        store.complete();
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].bounds, Rect::new(10.0, 10.0, 100.0, 20.0));

        store.undo();
        assert!(store.is_empty());
    }

    #[test]
    fn undo_restores_state_before_the_action() {
        let mut store = AnnotationStore::default();
        store.begin_tool(AnnotationKind::Highlight, 1);
        store.place(p(0.0, 0.0));
        store.complete();
        let after_first = store.all().to_vec();

        store.begin_tool(AnnotationKind::Underline, 1);
        store.place(p(5.0, 5.0));
        store.complete();
        assert_eq!(store.len(), 2);

        store.undo();
        assert_eq!(store.all(), after_first.as_slice());
    }

    #[test]
    fn undo_on_empty_stack_is_a_no_op() {
        let mut store = AnnotationStore::default();
        store.undo();
        assert!(store.is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn begin_tool_creates_nothing() {
        let mut store = AnnotationStore::default();
        store.begin_tool(AnnotationKind::Draw, 1);
        store.complete();
        assert!(store.is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn drag_collects_stroke_for_draw_tool_only() {
        let mut store = AnnotationStore::default();
        store.begin_tool(AnnotationKind::Highlight, 1);
        store.drag(p(1.0, 1.0));
        assert!(store.stroke_in_progress().is_empty());
        store.complete();

        store.begin_tool(AnnotationKind::Draw, 1);
        store.drag(p(1.0, 2.0));
        store.drag(p(5.0, 8.0));
        store.complete();

        let drawn = store.all().last().unwrap();
        assert_eq!(drawn.kind, AnnotationKind::Draw);
        assert_eq!(drawn.stroke().unwrap().len(), 2);
        assert_eq!(drawn.bounds, Rect::new(1.0, 2.0, 4.0, 6.0));
        assert!(store.active_tool().is_none());
    }

    #[test]
    fn text_tools_need_text() {
        let mut store = AnnotationStore::default();
        store.begin_tool(AnnotationKind::Note, 1);
        store.place(p(0.0, 0.0));
        store.place_text(p(0.0, 0.0), "   ");
        assert!(store.is_empty());
        store.place_text(p(0.0, 0.0), "check totals");
        store.complete();
        assert_eq!(store.all()[0].text_content(), Some("check totals"));
    }

    #[test]
    fn page_zero_is_ignored() {
        let mut store = AnnotationStore::default();
        store.add(Annotation::highlight(0, p(0.0, 0.0)));
        store.begin_tool(AnnotationKind::Highlight, 0);
        store.place(p(0.0, 0.0));
        assert!(store.is_empty());
        assert!(store.active_tool().is_none());
    }

    #[test]
    fn undo_depth_drops_oldest() {
        let mut store = AnnotationStore::new(2);
        for i in 0..3 {
            store.add(Annotation::highlight(1, p(i as f32, 0.0)));
        }
        store.undo();
        store.undo();
        store.undo();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn for_page_filters_in_order() {
        let mut store = AnnotationStore::default();
        store.add(Annotation::highlight(1, p(1.0, 0.0)));
        store.add(Annotation::highlight(2, p(2.0, 0.0)));
        store.add(Annotation::highlight(1, p(3.0, 0.0)));
        let xs: Vec<f32> = store.for_page(1).map(|a| a.bounds.x).collect();
        assert_eq!(xs, [1.0, 3.0]);
    }
}
