// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page: tool locations, viewer preferences, and activation.

use std::path::PathBuf;

use dioxus::prelude::*;

use tabellwerk_core::PaperSize;
use tabellwerk_core::activation::ActivationStatus;

use crate::services::app_services::AppServices;
use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut config = use_signal(|| svc.config());
    let mut key = use_signal(String::new);
    let mut activation = use_signal(|| svc.activation(chrono::Local::now().date_naive()));

    let current = config.read().clone();
    let tabula_jar = current
        .tools
        .tabula_jar
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let model_dir = current
        .ocr_model_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let activation_text = match *activation.read() {
        ActivationStatus::Missing => "Not activated".to_string(),
        ActivationStatus::Active { days_left } => format!("Active, {days_left} days left"),
        ActivationStatus::Expired => "Expired".to_string(),
    };

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "External tools" }
                PathRow {
                    label: "Java",
                    value: current.tools.java.display().to_string(),
                    on_change: move |v: String| config.write().tools.java = PathBuf::from(v),
                }
                PathRow {
                    label: "Tabula JAR",
                    value: tabula_jar,
                    on_change: move |v: String| config.write().tools.tabula_jar = optional_path(&v),
                }
                PathRow {
                    label: "Camelot",
                    value: current.tools.camelot.display().to_string(),
                    on_change: move |v: String| config.write().tools.camelot = PathBuf::from(v),
                }
                PathRow {
                    label: "pdftoppm",
                    value: current.tools.pdftoppm.display().to_string(),
                    on_change: move |v: String| config.write().tools.pdftoppm = PathBuf::from(v),
                }
                PathRow {
                    label: "OCR models",
                    value: model_dir,
                    on_change: move |v: String| config.write().ocr_model_dir = optional_path(&v),
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Viewer" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Preview resolution (DPI)" }
                    input {
                        r#type: "number",
                        style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{current.preview_dpi}",
                        onchange: move |evt| {
                            if let Ok(dpi) = evt.value().parse::<u32>()
                                && (18..=600).contains(&dpi)
                            {
                                config.write().preview_dpi = dpi;
                            }
                        },
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Undo steps" }
                    input {
                        r#type: "number",
                        style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{current.undo_depth}",
                        onchange: move |evt| {
                            if let Ok(depth) = evt.value().parse::<usize>()
                                && depth > 0
                            {
                                config.write().undo_depth = depth;
                            }
                        },
                    }
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Searchable PDF paper size" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: paper_size_label(&current.paper_size),
                        onchange: move |evt| {
                            if let Some(ps) = paper_size_from_label(&evt.value()) {
                                config.write().paper_size = ps;
                            }
                        },
                        option { value: "A4", "A4" }
                        option { value: "A3", "A3" }
                        option { value: "A5", "A5" }
                        option { value: "Letter", "Letter" }
                        option { value: "Legal", "Legal" }
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let config = config.read().clone();
                        match svc.save_config(&config) {
                            Ok(()) => {
                                tracing::info!("settings saved");
                                state.write().notify("Settings saved. New undo depth applies to the next document.");
                            }
                            Err(e) => state.write().report(&e),
                        }
                    }
                },
                "Save Settings"
            }

            section { style: "margin: 24px 0;",
                h3 { "Activation" }
                p { style: "color: #666; font-size: 14px;", "{activation_text}" }
                div { style: "display: flex; gap: 8px;",
                    input {
                        style: "flex: 1; padding: 8px; border: 1px solid #ccc; border-radius: 4px;",
                        r#type: "text",
                        placeholder: "Activation key",
                        value: "{key}",
                        oninput: move |evt| key.set(evt.value()),
                    }
                    button {
                        style: "padding: 8px 16px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white;",
                        onclick: {
                            let svc = svc.clone();
                            move |_| {
                                let today = chrono::Local::now().date_naive();
                                let entered = key.read().clone();
                                match svc.activate(&entered, today) {
                                    Ok(status) => {
                                        activation.set(status);
                                        key.set(String::new());
                                        state.write().notify("Tabellwerk activated.");
                                    }
                                    Err(e) => state.write().report(&e),
                                }
                            }
                        },
                        "Activate"
                    }
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "Tabellwerk v{VERSION}"
                    br {}
                    "PDF table extraction and annotation"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

#[component]
fn PathRow(label: &'static str, value: String, on_change: EventHandler<String>) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            input {
                r#type: "text",
                style: "width: 60%; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                value: "{value}",
                onchange: move |evt| on_change.call(evt.value()),
            }
        }
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn paper_size_label(ps: &PaperSize) -> &'static str {
    match ps {
        PaperSize::A4 => "A4",
        PaperSize::A3 => "A3",
        PaperSize::A5 => "A5",
        PaperSize::Letter => "Letter",
        PaperSize::Legal => "Legal",
    }
}

fn paper_size_from_label(label: &str) -> Option<PaperSize> {
    match label {
        "A4" => Some(PaperSize::A4),
        "A3" => Some(PaperSize::A3),
        "A5" => Some(PaperSize::A5),
        "Letter" => Some(PaperSize::Letter),
        "Legal" => Some(PaperSize::Legal),
        _ => None,
    }
}
