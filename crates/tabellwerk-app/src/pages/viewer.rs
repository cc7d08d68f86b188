// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer page: open a PDF, page through it, edit pages, annotate, and save.

use std::path::PathBuf;

use dioxus::prelude::*;

use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{Annotation, AnnotationKind, AnnotationPayload, Point};
use tabellwerk_document::{AnnotationStore, DocumentSession, ImageProcessor};

use crate::services::app_services::AppServices;
use crate::services::preview::{self, OverlayKind};
use crate::state::AppState;

const TOOLS: [AnnotationKind; 6] = [
    AnnotationKind::Highlight,
    AnnotationKind::Underline,
    AnnotationKind::Text,
    AnnotationKind::Note,
    AnnotationKind::Draw,
    AnnotationKind::Image,
];

/// Re-render the preview, reporting failures in the status strip.
fn rerender(mut state: Signal<AppState>, svc: &AppServices) {
    let renderer = svc.renderer();
    let mut st = state.write();
    if let Err(e) = preview::refresh(&mut st, &renderer) {
        st.report(&e);
    }
}

/// Run a page edit against the open session. Any overlay is stale afterwards.
fn edit_session(
    mut state: Signal<AppState>,
    svc: &AppServices,
    action: impl FnOnce(&mut DocumentSession) -> Result<String>,
) {
    let outcome = {
        let mut st = state.write();
        let Some(session) = st.session.as_mut() else {
            return;
        };
        action(session)
    };
    match outcome {
        Ok(message) => {
            {
                let mut st = state.write();
                st.overlay = None;
                st.notify(message);
            }
            rerender(state, svc);
        }
        Err(e) => state.write().report(&e),
    }
}

/// One click of a placement tool, as its own undoable action.
pub(crate) fn click_tool(
    store: &mut AnnotationStore,
    kind: AnnotationKind,
    page: u32,
    at: Point,
    text: &str,
    image: Option<PathBuf>,
) {
    store.begin_tool(kind, page);
    match kind {
        AnnotationKind::Highlight | AnnotationKind::Underline => store.place(at),
        AnnotationKind::Text | AnnotationKind::Note => store.place_text(at, text),
        AnnotationKind::Image => {
            if let Some(path) = image {
                store.place_image(at, path);
            }
        }
        AnnotationKind::Draw => {}
    }
    store.complete();
}

/// Make sure a picked image decodes before it is placed on the page.
fn checked_image(path: PathBuf) -> Result<PathBuf> {
    let image = ImageProcessor::open(&path)?;
    tracing::debug!(width = image.width(), height = image.height(), "image annotation source");
    Ok(path)
}

fn parse_page(input: &str) -> Result<u32> {
    let input = input.trim();
    input
        .parse::<u32>()
        .map_err(|_| TabellwerkError::NotAPageNumber(input.to_string()))
}

#[component]
pub fn Viewer() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut tool = use_signal(|| Option::<AnnotationKind>::None);
    let drawing = use_signal(|| false);
    let mut page_input = use_signal(String::new);

    let (title, page, page_count, zoom) = {
        let st = state.read();
        match st.session.as_ref() {
            Some(s) => (
                s.path()
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                s.current_page(),
                s.page_count(),
                s.zoom(),
            ),
            None => (String::new(), 0, 0, 1.0),
        }
    };
    let zoom_pct = (zoom * 100.0).round() as u32;
    let can_undo = state.read().annotations.can_undo();
    let overlay_label = state.read().overlay.as_ref().map(|o| o.kind.label());
    let active_tool = *tool.read();
    let annotation_text = state.read().annotation_text.clone();

    rsx! {
        div {
            h1 { "Viewer" }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 16px; margin: 8px 0;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        #[cfg(not(any(target_os = "ios", target_os = "android")))]
                        {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("PDF", &["pdf"])
                                .pick_file()
                            {
                                match DocumentSession::open(&path) {
                                    Ok(session) => {
                                        let pages = session.page_count();
                                        let undo_depth = svc.config().undo_depth;
                                        {
                                            let mut st = state.write();
                                            st.open(session, undo_depth);
                                            st.notify(format!("Opened {} ({pages} pages)", path.display()));
                                        }
                                        tool.set(None);
                                        page_input.set("1".into());
                                        tracing::info!(path = %path.display(), pages, "PDF opened in viewer");
                                        rerender(state, &svc);
                                    }
                                    Err(e) => state.write().report(&e),
                                }
                            }
                        }
                        #[cfg(any(target_os = "ios", target_os = "android"))]
                        {
                            state.write().notify("File picker not available on this platform");
                        }
                    }
                },
                "Open PDF"
            }

            if page_count > 0 {
                p { style: "color: #666;", "{title}" }

                // Navigation and zoom
                div { style: "display: flex; gap: 8px; flex-wrap: wrap; align-items: center; margin: 8px 0;",
                    ToolButton {
                        label: "Prev",
                        disabled: page <= 1,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| {
                                s.prev();
                                Ok(format!("Page {}", s.current_page()))
                            })
                        },
                    }
                    input {
                        style: "width: 48px; padding: 6px;",
                        r#type: "text",
                        placeholder: "{page}",
                        value: "{page_input}",
                        oninput: move |evt| page_input.set(evt.value()),
                    }
                    span { "of {page_count}" }
                    ToolButton {
                        label: "Go",
                        disabled: false,
                        onclick: {
                            let svc = svc.clone();
                            move |_| {
                                let input = page_input.read().clone();
                                edit_session(state, &svc, |s| {
                                    let target = parse_page(&input)?;
                                    s.goto(target)?;
                                    Ok(format!("Page {target}"))
                                });
                            }
                        },
                    }
                    ToolButton {
                        label: "Next",
                        disabled: page >= page_count,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| {
                                s.next();
                                Ok(format!("Page {}", s.current_page()))
                            })
                        },
                    }
                    ToolButton {
                        label: "Zoom -",
                        disabled: false,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| Ok(format!("Zoom {:.0}%", s.zoom_out() * 100.0)))
                        },
                    }
                    span { "{zoom_pct}%" }
                    ToolButton {
                        label: "Zoom +",
                        disabled: false,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| Ok(format!("Zoom {:.0}%", s.zoom_in() * 100.0)))
                        },
                    }
                }

                // Page edits
                div { style: "display: flex; gap: 8px; flex-wrap: wrap; margin: 8px 0;",
                    ToolButton {
                        label: "Rotate left",
                        disabled: false,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| {
                                let rotation = s.rotate_page(s.current_page(), -90)?;
                                Ok(format!("Page rotated to {rotation}\u{00B0}"))
                            })
                        },
                    }
                    ToolButton {
                        label: "Rotate right",
                        disabled: false,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| {
                                let rotation = s.rotate_page(s.current_page(), 90)?;
                                Ok(format!("Page rotated to {rotation}\u{00B0}"))
                            })
                        },
                    }
                    ToolButton {
                        label: "Delete page",
                        disabled: page_count < 2,
                        onclick: {
                            let svc = svc.clone();
                            move |_| edit_session(state, &svc, |s| {
                                let deleted = s.current_page();
                                s.delete_page(deleted)?;
                                Ok(format!("Page {deleted} deleted, {} left", s.page_count()))
                            })
                        },
                    }
                }

                // Annotation tools
                div { style: "display: flex; gap: 8px; flex-wrap: wrap; align-items: center; margin: 8px 0;",
                    for kind in TOOLS {
                        {
                            let selected = active_tool == Some(kind);
                            let label = kind.label();
                            let border = if selected { "2px solid #007aff" } else { "1px solid #ccc" };
                            rsx! {
                                button {
                                    style: "padding: 8px 12px; border-radius: 8px; border: {border}; background: white; font-size: 14px;",
                                    onclick: move |_| {
                                        let next = if *tool.read() == Some(kind) { None } else { Some(kind) };
                                        tool.set(next);
                                    },
                                    "{label}"
                                }
                            }
                        }
                    }
                    if active_tool.is_some_and(|k| k.needs_text()) {
                        input {
                            style: "flex: 1; min-width: 160px; padding: 6px;",
                            r#type: "text",
                            placeholder: "Annotation text",
                            value: "{annotation_text}",
                            oninput: move |evt| state.write().annotation_text = evt.value(),
                        }
                    }
                    ToolButton {
                        label: "Undo",
                        disabled: !can_undo,
                        onclick: move |_| {
                            state.write().annotations.undo();
                        },
                    }
                }

                // Overlays
                div { style: "display: flex; gap: 8px; flex-wrap: wrap; margin: 8px 0;",
                    for kind in [OverlayKind::TableLines, OverlayKind::OcrPreprocess] {
                        ToolButton {
                            label: kind.label(),
                            disabled: false,
                            onclick: {
                                let svc = svc.clone();
                                move |_| {
                                    let built = {
                                        let st = state.read();
                                        match st.session.as_ref() {
                                            Some(session) => preview::build_overlay(&svc.renderer(), session, kind),
                                            None => return,
                                        }
                                    };
                                    match built {
                                        Ok(overlay) => {
                                            state.write().overlay = Some(overlay);
                                            rerender(state, &svc);
                                        }
                                        Err(e) => state.write().report(&e),
                                    }
                                }
                            },
                        }
                    }
                    if let Some(label) = overlay_label {
                        ToolButton {
                            label: "Clear overlay",
                            disabled: false,
                            onclick: {
                                let svc = svc.clone();
                                move |_| {
                                    state.write().overlay = None;
                                    rerender(state, &svc);
                                }
                            },
                        }
                        span { style: "color: #666; font-size: 13px;", "Showing: {label}" }
                    }
                }

                // Save / export
                div { style: "display: flex; gap: 8px; flex-wrap: wrap; margin: 8px 0;",
                    button {
                        style: "flex: 1; padding: 10px; border-radius: 8px; border: none; background: #34c759; color: white; font-size: 15px;",
                        onclick: move |_| {
                            #[cfg(not(any(target_os = "ios", target_os = "android")))]
                            {
                                let Some(dest) = rfd::FileDialog::new()
                                    .add_filter("PDF", &["pdf"])
                                    .set_file_name("annotated.pdf")
                                    .save_file()
                                else {
                                    return;
                                };
                                let result = {
                                    let st = state.read();
                                    match st.session.as_ref() {
                                        Some(session) => session.save_with_annotations(st.annotations.all(), &dest),
                                        None => return,
                                    }
                                };
                                match result {
                                    Ok(written) => {
                                        tracing::info!(path = %dest.display(), written, "annotated PDF saved");
                                        state.write().notify(format!("Saved {} with {written} annotations", dest.display()));
                                    }
                                    Err(e) => state.write().report(&e),
                                }
                            }
                        },
                        "Save PDF"
                    }
                    button {
                        style: "flex: 1; padding: 10px; border-radius: 8px; border: 1px solid #34c759; color: #34c759; background: white; font-size: 15px;",
                        onclick: {
                            let svc = svc.clone();
                            move |_| {
                                #[cfg(not(any(target_os = "ios", target_os = "android")))]
                                {
                                    let Some(dest) = rfd::FileDialog::new()
                                        .add_filter("PNG", &["png"])
                                        .add_filter("JPEG", &["jpg", "jpeg"])
                                        .set_file_name(format!("page_{page}.png"))
                                        .save_file()
                                    else {
                                        return;
                                    };
                                    let renderer = svc.renderer();
                                    let result = {
                                        let st = state.read();
                                        match st.session.as_ref() {
                                            Some(session) => session.export_page_image(
                                                renderer.rasterizer(),
                                                session.current_page(),
                                                renderer.dpi_for(session.zoom()),
                                                &dest,
                                            ),
                                            None => return,
                                        }
                                    };
                                    match result {
                                        Ok(()) => state.write().notify(format!("Page exported to {}", dest.display())),
                                        Err(e) => state.write().report(&e),
                                    }
                                }
                            }
                        },
                        "Export page image"
                    }
                }

                PagePreview { tool: tool, drawing: drawing }
            }
        }
    }
}

/// The rendered page with the annotations of the current page drawn on top.
#[component]
fn PagePreview(tool: Signal<Option<AnnotationKind>>, drawing: Signal<bool>) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();

    let (src, scale, page, marks, stroke) = {
        let st = state.read();
        let page = st.current_page().unwrap_or(0);
        (
            st.preview.clone(),
            st.preview_scale,
            page,
            st.annotations.for_page(page).cloned().collect::<Vec<Annotation>>(),
            st.annotations.stroke_in_progress().to_vec(),
        )
    };
    let on_resize = move |evt: Event<ResizeData>| {
        let Ok(size) = evt.get_content_box_size() else { return };
        let (width, height) = (size.width.round() as u32, size.height.round() as u32);
        if state.write().set_viewport(width, height) {
            rerender(state, &svc);
        }
    };

    rsx! {
        div {
            style: "width: 100%; height: 70vh; display: flex; justify-content: center; align-items: center; overflow: hidden;",
            onresize: on_resize,
            if let Some(src) = src {
                PageCanvas { src, scale, page, marks, stroke, tool, drawing }
            } else {
                p { style: "color: #999;", "Rendering\u{2026}" }
            }
        }
    }
}

/// The fitted page bitmap with annotation marks drawn over it in page points.
#[component]
fn PageCanvas(
    src: String,
    scale: f32,
    page: u32,
    marks: Vec<Annotation>,
    stroke: Vec<Point>,
    tool: Signal<Option<AnnotationKind>>,
    drawing: Signal<bool>,
) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let mut drawing = drawing;

    let point_of = move |evt: &MouseEvent| {
        let coords = evt.element_coordinates();
        preview::to_page_point(&state.read(), coords.x, coords.y)
    };

    rsx! {
        div {
            style: "position: relative; display: inline-block; border: 1px solid #ccc; cursor: crosshair;",
            onmousedown: move |evt| {
                let Some(kind) = *tool.read() else { return };
                let at = match point_of(&evt) {
                    Ok(p) => p,
                    Err(e) => {
                        state.write().report(&e);
                        return;
                    }
                };
                if kind.is_freehand() {
                    let mut st = state.write();
                    st.annotations.begin_tool(kind, page);
                    st.annotations.drag(at);
                    drawing.set(true);
                    return;
                }
                let image = if kind == AnnotationKind::Image {
                    let Some(path) = pick_image() else { return };
                    match checked_image(path) {
                        Ok(path) => Some(path),
                        Err(e) => {
                            state.write().report(&e);
                            return;
                        }
                    }
                } else {
                    None
                };
                let mut st = state.write();
                let text = st.annotation_text.clone();
                click_tool(&mut st.annotations, kind, page, at, &text, image);
            },
            onmousemove: move |evt| {
                if *drawing.read() {
                    if let Ok(at) = point_of(&evt) {
                        state.write().annotations.drag(at);
                    }
                }
            },
            onmouseup: move |_| {
                if *drawing.read() {
                    state.write().annotations.complete();
                    drawing.set(false);
                }
            },
            onmouseleave: move |_| {
                if *drawing.read() {
                    state.write().annotations.complete();
                    drawing.set(false);
                }
            },

            img { src: "{src}", draggable: "false", style: "display: block;" }

            svg {
                style: "position: absolute; left: 0; top: 0; width: 100%; height: 100%; pointer-events: none;",
                g { transform: "scale({scale})",
                    for mark in marks {
                        AnnotationMark { annotation: mark }
                    }
                    if stroke.len() > 1 {
                        polyline {
                            points: polyline_points(&stroke),
                            fill: "none",
                            stroke: "#d32f2f",
                            stroke_width: "2",
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn AnnotationMark(annotation: Annotation) -> Element {
    let b = annotation.bounds;
    let (right, bottom) = (b.right(), b.bottom());
    let (label_x, label_y) = (b.x + 4.0, b.y + 14.0);
    match (&annotation.kind, &annotation.payload) {
        (AnnotationKind::Highlight, _) => rsx! {
            rect { x: "{b.x}", y: "{b.y}", width: "{b.width}", height: "{b.height}", fill: "#ffeb3b", fill_opacity: "0.4" }
        },
        (AnnotationKind::Underline, _) => rsx! {
            line { x1: "{b.x}", y1: "{bottom}", x2: "{right}", y2: "{bottom}", stroke: "#1565c0", stroke_width: "2" }
        },
        (AnnotationKind::Text, AnnotationPayload::Text(text)) => rsx! {
            text { x: "{b.x}", y: "{b.y}", font_size: "12", fill: "#000", "{text}" }
        },
        (AnnotationKind::Note, AnnotationPayload::Text(text)) => rsx! {
            rect { x: "{b.x}", y: "{b.y}", width: "16", height: "16", fill: "#fff176", stroke: "#f9a825" }
            text { x: "{label_x + 16.0}", y: "{label_y - 2.0}", font_size: "10", fill: "#5d4037", "{text}" }
        },
        (AnnotationKind::Draw, AnnotationPayload::Stroke(points)) => rsx! {
            polyline { points: polyline_points(points), fill: "none", stroke: "#d32f2f", stroke_width: "2" }
        },
        (AnnotationKind::Image, AnnotationPayload::ImagePath(path)) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            rsx! {
                rect { x: "{b.x}", y: "{b.y}", width: "80", height: "60", fill: "none", stroke: "#666", stroke_dasharray: "4 2" }
                text { x: "{label_x}", y: "{label_y}", font_size: "10", fill: "#666", "{name}" }
            }
        }
        _ => rsx! {},
    }
}

fn polyline_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn pick_image() -> Option<PathBuf> {
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg"])
            .pick_file()
    }
    #[cfg(any(target_os = "ios", target_os = "android"))]
    {
        None
    }
}

#[component]
fn ToolButton(label: &'static str, disabled: bool, onclick: EventHandler<MouseEvent>) -> Element {
    let opacity = if disabled { "0.5" } else { "1" };
    rsx! {
        button {
            style: "padding: 8px 12px; border-radius: 8px; border: 1px solid #ccc; background: white; font-size: 14px; opacity: {opacity};",
            disabled: disabled,
            onclick: move |evt| onclick.call(evt),
            "{label}"
        }
    }
}
