// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Convert page: extract tables from the open PDF into XLSX or CSV.

use std::path::PathBuf;

use dioxus::prelude::*;

use tabellwerk_core::{ConverterSettings, Engine, OutputFormat, PageSelection};
use tabellwerk_extract::{ConversionOutcome, ConversionRequest, default_output_path};

use crate::services::app_services::AppServices;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageMode {
    All,
    Current,
    Range,
}

impl PageMode {
    fn from_value(value: &str) -> Self {
        match value {
            "current" => Self::Current,
            "range" => Self::Range,
            _ => Self::All,
        }
    }
}

/// Snapshot of everything a conversion needs, taken when the button is
/// pressed.
fn build_request(
    pdf: PathBuf,
    current_page: u32,
    mode: PageMode,
    range: &str,
    settings: ConverterSettings,
    destination: Option<PathBuf>,
) -> ConversionRequest {
    let selection = match mode {
        PageMode::All => PageSelection::All,
        PageMode::Current => PageSelection::Current(current_page),
        PageMode::Range => PageSelection::Range(range.trim().to_string()),
    };
    ConversionRequest {
        pdf,
        selection,
        engine: settings.engine,
        options: settings.detect_options(),
        format: settings.format,
        destination,
    }
}

#[component]
pub fn Convert() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut settings = use_signal(|| svc.settings());
    let mut mode = use_signal(|| PageMode::All);
    let mut range = use_signal(String::new);

    let (pdf, current_page) = {
        let st = state.read();
        match st.session.as_ref() {
            Some(s) => (Some(s.path().to_path_buf()), s.current_page()),
            None => (None, 0),
        }
    };
    let busy = state.read().converting;
    let current = *settings.read();

    rsx! {
        div {
            h1 { "Convert" }

            if let Some(ref path) = pdf {
                p { style: "color: #666;", "Source: {path.display()}" }
            } else {
                p { style: "color: #666;", "Open a PDF in the Viewer first." }
            }

            section { style: "margin: 16px 0;",
                h3 { "Engine" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Extraction engine" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: current.engine.label(),
                        onchange: move |evt| {
                            if let Some(engine) = Engine::from_label(&evt.value()) {
                                settings.write().engine = engine;
                            }
                        },
                        for engine in Engine::ALL {
                            option { value: engine.label(), "{engine.label()}" }
                        }
                    }
                }
                SettingRow {
                    label: "Detect bordered tables",
                    checked: current.lattice,
                    on_toggle: move |v: bool| { settings.write().lattice = v; },
                }
                SettingRow {
                    label: "Detect borderless tables",
                    checked: current.stream,
                    on_toggle: move |v: bool| { settings.write().stream = v; },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Pages" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Convert" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        onchange: move |evt| mode.set(PageMode::from_value(&evt.value())),
                        option { value: "all", "All pages" }
                        option { value: "current", "Current page ({current_page})" }
                        option { value: "range", "Page range" }
                    }
                }
                if *mode.read() == PageMode::Range {
                    input {
                        style: "width: 100%; padding: 8px; margin-top: 8px; border: 1px solid #ccc; border-radius: 4px;",
                        r#type: "text",
                        placeholder: "e.g. 1,3-5",
                        value: "{range}",
                        oninput: move |evt| range.set(evt.value()),
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Output" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Format" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: current.format.extension(),
                        onchange: move |evt| {
                            if let Some(format) = OutputFormat::from_extension(&evt.value()) {
                                settings.write().format = format;
                            }
                        },
                        option { value: "xlsx", "Excel (.xlsx)" }
                        option { value: "csv", "CSV (.csv)" }
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                disabled: busy || pdf.is_none(),
                onclick: {
                    let svc = svc.clone();
                    let pdf = pdf.clone();
                    move |_| {
                        let Some(pdf) = pdf.clone() else { return };
                        let chosen = *settings.read();
                        if let Err(e) = svc.save_settings(chosen) {
                            state.write().report(&e);
                        }

                        let destination = pick_destination(&pdf, chosen.format);
                        if destination.is_none() && cfg!(not(any(target_os = "ios", target_os = "android"))) {
                            return;
                        }
                        let request = build_request(
                            pdf,
                            current_page,
                            *mode.read(),
                            &range.read(),
                            chosen,
                            destination,
                        );

                        let svc = svc.clone();
                        state.write().converting = true;
                        state.write().notify("Converting\u{2026}");
                        spawn(async move {
                            let result = svc.convert(request).await;
                            let mut st = state.write();
                            st.converting = false;
                            match result {
                                Ok(ConversionOutcome::Saved { path, tables }) => {
                                    tracing::info!(path = %path.display(), tables, "conversion finished");
                                    st.notify(format!("Saved {tables} table(s) to {}", path.display()));
                                }
                                Ok(ConversionOutcome::NoTables) => {
                                    st.notify("No tables found in the selected pages.");
                                }
                                Err(e) => st.report(&e),
                            }
                        });
                    }
                },
                if busy { "Converting\u{2026}" } else { "Convert" }
            }
        }
    }
}

/// Ask where to save, suggesting `<stem>_converted.<ext>` beside the PDF.
fn pick_destination(pdf: &std::path::Path, format: OutputFormat) -> Option<PathBuf> {
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        let suggested = default_output_path(pdf, format);
        let mut dialog = rfd::FileDialog::new().add_filter(format.extension(), &[format.extension()]);
        if let Some(dir) = suggested.parent() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = suggested.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        dialog.save_file()
    }
    #[cfg(any(target_os = "ios", target_os = "android"))]
    {
        let _ = (pdf, format);
        None
    }
}

#[component]
fn SettingRow(label: &'static str, checked: bool, on_toggle: EventHandler<bool>) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked: checked,
                onchange: move |evt| {
                    on_toggle.call(evt.checked());
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabellwerk_core::DetectOptions;

    #[test]
    fn request_carries_settings_snapshot() {
        let settings = ConverterSettings {
            engine: Engine::Camelot,
            lattice: true,
            stream: false,
            format: OutputFormat::DelimitedText,
        };
        let request = build_request("in.pdf".into(), 3, PageMode::Current, "", settings, None);
        assert_eq!(request.selection, PageSelection::Current(3));
        assert_eq!(request.engine, Engine::Camelot);
        assert_eq!(
            request.options,
            DetectOptions {
                detect_bordered: true,
                detect_borderless: false
            }
        );
        assert_eq!(request.destination(), PathBuf::from("in_converted.csv"));
    }

    #[test]
    fn range_text_is_trimmed() {
        let request = build_request(
            "in.pdf".into(),
            1,
            PageMode::Range,
            " 1,3-5 ",
            ConverterSettings::default(),
            None,
        );
        assert_eq!(request.selection, PageSelection::Range("1,3-5".into()));
    }

    #[test]
    fn unknown_mode_means_all_pages() {
        assert_eq!(PageMode::from_value("bogus"), PageMode::All);
    }
}
