// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state: reactive signals for the Dioxus UI.

use image::DynamicImage;
use tabellwerk_core::error::TabellwerkError;
use tabellwerk_core::human_errors::{Severity, humanize_error};
use tabellwerk_document::{AnnotationStore, DocumentSession};

use crate::services::preview::Overlay;

/// A message shown in the status strip at the bottom of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub title: String,
    pub detail: Option<String>,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            severity: Severity::Notice,
        }
    }

    /// Plain-language rendering of an error, logged at the boundary.
    pub fn from_error(err: &TabellwerkError) -> Self {
        tracing::warn!(error = %err, "action failed");
        let human = humanize_error(err);
        Self {
            title: human.message,
            detail: Some(human.suggestion),
            severity: human.severity,
        }
    }

    pub fn colour(&self) -> &'static str {
        match self.severity {
            Severity::Notice => "#333",
            Severity::ActionRequired => "#b36b00",
            Severity::Permanent => "#c62828",
        }
    }
}

/// Preview area assumed until the viewer reports its real size.
pub const DEFAULT_VIEWPORT: (u32, u32) = (800, 1000);

/// Shared state accessible to all pages via `use_context`.
pub struct AppState {
    /// The open document, if any.
    pub session: Option<DocumentSession>,
    /// Annotations on the open document.
    pub annotations: AnnotationStore,
    /// Overlay bitmap shown instead of the rendered page until navigation.
    pub overlay: Option<Overlay>,
    /// Rendered page as a `data:` URL.
    pub preview: Option<String>,
    /// Preview pixels per PDF point, after fitting to the viewport.
    pub preview_scale: f32,
    /// Size of the preview area in CSS pixels.
    pub viewport: (u32, u32),
    /// Text typed for the Text and Sticky Note tools.
    pub annotation_text: String,
    pub status: Option<StatusMessage>,
    pub converting: bool,
}

impl AppState {
    pub fn new(undo_depth: usize) -> Self {
        Self {
            session: None,
            annotations: AnnotationStore::new(undo_depth),
            overlay: None,
            preview: None,
            preview_scale: 1.0,
            viewport: DEFAULT_VIEWPORT,
            annotation_text: String::new(),
            status: None,
            converting: false,
        }
    }

    /// Replace the open document. Annotations and overlays belong to the old
    /// one and are dropped.
    pub fn open(&mut self, session: DocumentSession, undo_depth: usize) {
        self.session = Some(session);
        self.annotations = AnnotationStore::new(undo_depth);
        self.overlay = None;
        self.preview = None;
    }

    pub fn current_page(&self) -> Option<u32> {
        self.session.as_ref().map(DocumentSession::current_page)
    }

    /// Record a new preview area size. Returns whether it changed.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        let changed = self.viewport != (width, height);
        self.viewport = (width, height);
        changed
    }

    pub fn report(&mut self, err: &TabellwerkError) {
        self.status = Some(StatusMessage::from_error(err));
    }

    pub fn notify(&mut self, title: impl Into<String>) {
        self.status = Some(StatusMessage::info(title));
    }
}

/// Keep only the bitmap of an overlay when handing it to the renderer.
pub fn overlay_bitmap(state: &AppState) -> Option<&DynamicImage> {
    state.overlay.as_ref().map(|o| &o.bitmap)
}
