// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tools page: merge, split, and OCR to a searchable PDF.

use dioxus::prelude::*;

use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Tools() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut ocr_running = use_signal(|| false);

    let open = {
        let st = state.read();
        st.session
            .as_ref()
            .map(|s| (s.path().to_path_buf(), s.current_page()))
    };

    rsx! {
        div {
            h1 { "Tools" }

            section { style: "margin: 16px 0;",
                h3 { "Merge PDFs" }
                p { style: "color: #666; font-size: 14px;", "Combine several PDFs into one, in the order chosen." }
                button {
                    style: "width: 100%; padding: 12px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 16px;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            #[cfg(not(any(target_os = "ios", target_os = "android")))]
                            {
                                let Some(inputs) = rfd::FileDialog::new()
                                    .add_filter("PDF", &["pdf"])
                                    .pick_files()
                                else {
                                    return;
                                };
                                let Some(output) = rfd::FileDialog::new()
                                    .add_filter("PDF", &["pdf"])
                                    .set_file_name("merged.pdf")
                                    .save_file()
                                else {
                                    return;
                                };
                                match svc.merge_pdfs(&inputs, &output) {
                                    Ok(()) => state
                                        .write()
                                        .notify(format!("Merged {} files into {}", inputs.len(), output.display())),
                                    Err(e) => state.write().report(&e),
                                }
                            }
                        }
                    },
                    "Merge\u{2026}"
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Split PDF" }
                p { style: "color: #666; font-size: 14px;", "Write every page to its own file." }
                button {
                    style: "width: 100%; padding: 12px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 16px;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            #[cfg(not(any(target_os = "ios", target_os = "android")))]
                            {
                                let Some(pdf) = rfd::FileDialog::new()
                                    .add_filter("PDF", &["pdf"])
                                    .pick_file()
                                else {
                                    return;
                                };
                                let Some(dir) = rfd::FileDialog::new().pick_folder() else {
                                    return;
                                };
                                match svc.split_pdf(&pdf, &dir) {
                                    Ok(files) => state
                                        .write()
                                        .notify(format!("Wrote {} pages to {}", files.len(), dir.display())),
                                    Err(e) => state.write().report(&e),
                                }
                            }
                        }
                    },
                    "Split\u{2026}"
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Searchable PDF" }
                p { style: "color: #666; font-size: 14px;",
                    "Recognise the text on the current page and save it next to the document."
                }
                button {
                    style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #34c759; color: white; font-size: 16px;",
                    disabled: open.is_none() || *ocr_running.read(),
                    onclick: {
                        let svc = svc.clone();
                        let open = open.clone();
                        move |_| {
                            let Some((pdf, page)) = open.clone() else { return };
                            let svc = svc.clone();
                            ocr_running.set(true);
                            spawn(async move {
                                let result = svc.searchable_pdf(pdf, page).await;
                                ocr_running.set(false);
                                match result {
                                    Ok(path) => state.write().notify(format!("Searchable PDF saved to {}", path.display())),
                                    Err(e) => state.write().report(&e),
                                }
                            });
                        }
                    },
                    if *ocr_running.read() { "Recognising\u{2026}" } else { "Create searchable PDF" }
                }
            }
        }
    }
}
