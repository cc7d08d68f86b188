// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages shown at the action boundary.
//
// Every technical error is mapped to a plain-language message with a clear
// suggestion. Severity drives the dialog style in the UI.

use crate::error::TabellwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational: the action finished but the outcome needs explaining.
    Notice,
    /// User must do something (pick another file, change the page range).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged file, missing tool, etc.
    Permanent,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as the dialog title).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
        }
    }
}

/// Convert a `TabellwerkError` into a `HumanError` for display.
pub fn humanize_error(err: &TabellwerkError) -> HumanError {
    match err {
        // -- Document session --
        TabellwerkError::NotFound(path) => HumanError::new(
            "The file couldn't be found.",
            format!(
                "It may have been moved or deleted. Try choosing the file again. ({})",
                path.display()
            ),
            Severity::ActionRequired,
        ),

        TabellwerkError::Unreadable(_) | TabellwerkError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged, encrypted, or not a PDF. Try opening it in another viewer first.",
            Severity::Permanent,
        ),

        TabellwerkError::OutOfRange { page_count, .. } => HumanError::new(
            "Invalid page number!",
            format!("Enter a page between 1 and {page_count}."),
            Severity::ActionRequired,
        ),

        TabellwerkError::NotAPageNumber(input) => HumanError::new(
            "That isn't a page number.",
            format!("Type a whole number instead of {input:?}."),
            Severity::ActionRequired,
        ),

        TabellwerkError::LastPage => HumanError::new(
            "This is the only page.",
            "A document needs at least one page, so the last page can't be deleted.",
            Severity::ActionRequired,
        ),

        TabellwerkError::ImageError(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as PNG or JPEG first.",
            Severity::Permanent,
        ),

        TabellwerkError::Render(detail) => HumanError::new(
            "The page couldn't be displayed.",
            format!("Check that poppler's pdftoppm is installed and on your PATH. ({detail})"),
            Severity::Permanent,
        ),

        TabellwerkError::OcrError(_) => HumanError::new(
            "Text recognition didn't work on this page.",
            "Make sure the OCR models are downloaded, or try a higher preview resolution.",
            Severity::Permanent,
        ),

        // -- Extraction --
        TabellwerkError::InvalidPageSelection { reason, .. } => HumanError::new(
            "The page range isn't valid.",
            format!("Use page numbers and ranges such as 1,3-5. ({reason})"),
            Severity::ActionRequired,
        ),

        TabellwerkError::Extraction(detail) => HumanError::new(
            "Conversion failed.",
            format!("The extraction engine reported an error. Try a different engine. ({detail})"),
            Severity::Permanent,
        ),

        TabellwerkError::ToolUnavailable { tool, .. } => HumanError::new(
            format!("{tool} isn't available."),
            "Install it, or set its location in Settings, then try again.",
            Severity::ActionRequired,
        ),

        TabellwerkError::ConversionBusy => HumanError::new(
            "A conversion is already running.",
            "Wait for it to finish before starting another one.",
            Severity::Notice,
        ),

        // -- Export --
        TabellwerkError::NothingToExport => HumanError::new(
            "No tables found in the selected pages.",
            "Try another page range or a different extraction engine.",
            Severity::Notice,
        ),

        TabellwerkError::SchemaMismatch { table, .. } => HumanError::new(
            "These tables can't share one CSV file.",
            format!("{table} has a different number of columns. Export to Excel instead to keep each table on its own sheet."),
            Severity::ActionRequired,
        ),

        TabellwerkError::Write(_) => HumanError::new(
            "The output file couldn't be written.",
            "Check that the folder is writable and the file isn't open in another program.",
            Severity::ActionRequired,
        ),

        TabellwerkError::EmptyActivationKey => HumanError::new(
            "Please enter your activation key.",
            "The key is printed on your purchase receipt.",
            Severity::ActionRequired,
        ),

        // -- Storage --
        TabellwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "The app doesn't have permission to use that file.",
                "Check the file permissions, or choose a different location.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your disk may be full.",
                Severity::Permanent,
            ),
        },

        TabellwerkError::Serialization(_) => HumanError::new(
            "A settings file couldn't be read.",
            "Defaults were used instead. Saving your settings again will repair the file.",
            Severity::Notice,
        ),

        TabellwerkError::FeatureUnavailable(feature) => HumanError::new(
            "This feature isn't included in this build.",
            format!("Rebuild with the `{feature}` feature enabled."),
            Severity::Permanent,
        ),
    }
}
