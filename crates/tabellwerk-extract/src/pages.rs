// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selection parsing and validation.

use tabellwerk_core::PageSelection;
use tabellwerk_core::error::{Result, TabellwerkError};

fn invalid(selection: &str, reason: impl Into<String>) -> TabellwerkError {
    TabellwerkError::InvalidPageSelection {
        selection: selection.to_string(),
        reason: reason.into(),
    }
}

fn parse_page(selection: &str, raw: &str) -> Result<u32> {
    let page: u32 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(selection, format!("{:?} is not a page number", raw.trim())))?;
    if page == 0 {
        return Err(invalid(selection, "pages are numbered from 1"));
    }
    Ok(page)
}

/// Parse a range string such as `1,3-5` into ascending, de-duplicated pages
/// of a document with `page_count` pages.
///
/// Items are separated by commas; each is `N` or `N-M` with `N <= M`.
/// Whitespace around items and numbers is ignored. Every item is checked
/// against `page_count` before it is expanded.
pub fn parse_range(selection: &str, page_count: u32) -> Result<Vec<u32>> {
    if selection.trim().is_empty() {
        return Err(invalid(selection, "no pages given"));
    }

    let mut pages = Vec::new();
    for item in selection.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(invalid(selection, "empty item between commas"));
        }
        match item.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_page(selection, start)?, parse_page(selection, end)?);
                if start > end {
                    return Err(invalid(selection, format!("range {start}-{end} runs backwards")));
                }
                check_bound(selection, end, page_count)?;
                pages.extend(start..=end);
            }
            None => {
                let page = parse_page(selection, item)?;
                check_bound(selection, page, page_count)?;
                pages.push(page);
            }
        }
    }
    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

fn check_bound(selection: &str, page: u32, page_count: u32) -> Result<()> {
    if page > page_count {
        return Err(invalid(selection, format!("page {page} is outside 1-{page_count}")));
    }
    Ok(())
}

/// Resolve a selection to concrete 1-based pages of a document with
/// `page_count` pages. Every page must exist.
pub fn resolve(selection: &PageSelection, page_count: u32) -> Result<Vec<u32>> {
    match selection {
        PageSelection::All => Ok((1..=page_count).collect()),
        PageSelection::Current(page) => {
            let label = page.to_string();
            if *page == 0 {
                return Err(invalid(&label, "pages are numbered from 1"));
            }
            check_bound(&label, *page, page_count)?;
            Ok(vec![*page])
        }
        PageSelection::Range(spec) => parse_range(spec, page_count),
    }
}

/// Compact command-line form of a page list, e.g. `[1, 3, 4, 5]` → `1,3-5`.
pub fn to_page_arg(pages: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{start}-{end}")
        });
    }
    parts.join(",")
}
