// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turns recognised words into table cells by looking at horizontal gaps.

/// A recognised word and its horizontal extent in image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: f32,
    pub right: f32,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, left: f32, right: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
        }
    }

    fn char_width(&self) -> Option<f32> {
        let chars = self.text.chars().count();
        (chars > 0 && self.right > self.left).then(|| (self.right - self.left) / chars as f32)
    }
}

/// A gap wider than this many average character widths starts a new cell.
pub const CELL_GAP_CHARS: f32 = 1.5;

/// Split one line of words (in reading order) into cells.
///
/// Words closer than [`CELL_GAP_CHARS`] character widths are joined with a
/// space; wider gaps separate columns.
pub fn words_to_cells(words: &[OcrWord]) -> Vec<String> {
    let widths: Vec<f32> = words.iter().filter_map(OcrWord::char_width).collect();
    let avg_char = if widths.is_empty() {
        0.0
    } else {
        widths.iter().sum::<f32>() / widths.len() as f32
    };
    let max_gap = avg_char * CELL_GAP_CHARS;

    let mut cells: Vec<String> = Vec::new();
    let mut previous_right: Option<f32> = None;
    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }
        match (previous_right, cells.last_mut()) {
            (Some(right), Some(cell)) if word.left - right <= max_gap => {
                cell.push(' ');
                cell.push_str(text);
            }
            _ => cells.push(text.to_string()),
        }
        previous_right = Some(word.right);
    }
    cells
}
