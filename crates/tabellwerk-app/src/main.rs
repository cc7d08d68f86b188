// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tabellwerk: PDF Table Extractor
//
// Entry point. Initialises logging, backend services, app state, and launches
// the Dioxus UI.

mod pages;
mod services;
mod state;

use dioxus::prelude::*;

use tabellwerk_core::activation::ActivationStatus;

use pages::convert::Convert;
use pages::settings::Settings;
use pages::tools::Tools;
use pages::viewer::Viewer;

use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Tabellwerk starting");

    dioxus::launch(app);
}

/// Top-level route enum.
#[derive(Debug, Clone, Routable, PartialEq)]
enum Route {
    #[layout(TabLayout)]
    #[route("/")]
    Viewer {},
    #[route("/convert")]
    Convert {},
    #[route("/tools")]
    Tools {},
    #[route("/settings")]
    Settings {},
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(AppServices::init);

    use_context_provider(|| svc.clone());
    use_context_provider(|| Signal::new(state::AppState::new(svc.config().undo_depth)));

    rsx! {
        Router::<Route> {}
    }
}

/// Persistent top tab layout wrapping all pages.
#[component]
fn TabLayout() -> Element {
    let svc = use_context::<AppServices>();
    let state = use_context::<Signal<state::AppState>>();
    let banner = match svc.activation(chrono::Local::now().date_naive()) {
        ActivationStatus::Missing => Some("Tabellwerk is not activated. Enter your key in Settings."),
        ActivationStatus::Expired => Some("Your activation has expired. Enter a new key in Settings."),
        ActivationStatus::Active { .. } => None,
    };
    let status = state.read().status.clone();

    rsx! {
        div { class: "app-container",
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",

            nav { class: "tab-bar",
                style: "display: flex; justify-content: space-around; padding: 8px 0; border-bottom: 1px solid #e0e0e0; background: #fafafa;",
                TabButton { to: Route::Viewer {}, label: "Viewer" }
                TabButton { to: Route::Convert {}, label: "Convert" }
                TabButton { to: Route::Tools {}, label: "Tools" }
                TabButton { to: Route::Settings {}, label: "Settings" }
            }

            if let Some(text) = banner {
                ActivationBanner { text: text }
            }

            div { class: "page-content",
                style: "flex: 1; overflow-y: auto; padding: 16px;",
                Outlet::<Route> {}
            }

            if let Some(status) = status {
                footer { class: "status-strip",
                    style: "padding: 8px 16px; border-top: 1px solid #e0e0e0; background: #fafafa; font-size: 14px; color: {status.colour()};",
                    strong { "{status.title}" }
                    if let Some(detail) = status.detail {
                        span { style: "margin-left: 8px; color: #666;", "{detail}" }
                    }
                }
            }
        }
    }
}

#[component]
fn ActivationBanner(text: &'static str) -> Element {
    rsx! {
        div { style: "padding: 8px 16px; background: #fff8e1; color: #8d6e00; font-size: 14px; border-bottom: 1px solid #ffe082;",
            "{text} "
            Link { to: Route::Settings {}, "Open Settings" }
        }
    }
}

#[component]
fn TabButton(to: Route, label: &'static str) -> Element {
    rsx! {
        Link { to: to,
            style: "text-decoration: none; color: #333; font-size: 14px; padding: 4px 12px;",
            "{label}"
        }
    }
}
