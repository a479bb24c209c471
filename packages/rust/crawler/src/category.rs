//! Category-code extraction from arXiv subject text.
//!
//! Listing pages describe a paper's primary subject in loosely structured
//! text like `"Computation and Language (cs.CL)"` or a bare `"cs.CL"`.
//! This module pulls a canonical category code out of such fragments.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Shape of a category code: letters/digits/hyphens, optionally
/// dot-separated (e.g. `cs.CL`, `quant-ph`, `math.AG`).
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9-]+(?:\.[a-z0-9-]+)*$").expect("valid regex")
});

/// Trailing parenthesized group at the end of a fragment.
static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)$").expect("valid regex"));

static PRIMARY_SUBJECT_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.list-subjects span.primary-subject").expect("valid selector")
});

static SUBJECTS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.list-subjects").expect("valid selector"));

/// Extract a canonical category code from a raw subject fragment.
///
/// Rules, first match wins:
/// 1. A trailing parenthesized group whose contents either contain a `.`
///    or fully match the code shape is the code.
/// 2. Otherwise the text before the first `(` (or the whole fragment) is
///    taken, trimmed, and accepted if it matches the code shape. Text
///    containing a space but neither `.` nor `-` is prose, not a code.
///
/// Returns `None` when no code can be extracted; the caller decides how
/// to log and skip. Pure function of its input.
pub fn extract_category_code(fragment: &str) -> Option<String> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return None;
    }

    if let Some(caps) = TRAILING_PAREN_RE.captures(fragment) {
        let inner = caps[1].trim();
        if !inner.is_empty() && (inner.contains('.') || CODE_RE.is_match(inner)) {
            return Some(inner.to_string());
        }
    }

    let head = fragment.split('(').next().unwrap_or(fragment).trim();
    if head.is_empty() {
        return None;
    }
    if head.contains(' ') && !head.contains('.') && !head.contains('-') {
        return None;
    }
    if CODE_RE.is_match(head) {
        return Some(head.to_string());
    }

    None
}

/// Pull the primary-subject fragment out of an entry's `<dd>` block.
///
/// Prefers the dedicated `span.primary-subject` element. Falls back to the
/// full subjects text with the leading `Subjects:` label stripped, taking
/// the part before the first `;` (the first-listed subject is primary).
pub fn primary_subject_fragment(dd: &ElementRef<'_>) -> Option<String> {
    if let Some(span) = dd.select(&PRIMARY_SUBJECT_SEL).next() {
        let text = collect_text(&span);
        if !text.is_empty() {
            return Some(text);
        }
    }

    let subjects = dd.select(&SUBJECTS_SEL).next()?;
    let text = collect_text(&subjects);
    let content = text.strip_prefix("Subjects:").unwrap_or(&text).trim();
    if content.is_empty() {
        return None;
    }

    let first = content.split(';').next().unwrap_or(content).trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Extract every category code from a `;`-separated subjects line,
/// in listing order. Fragments without a recognizable code are dropped.
pub fn codes_in_subject_text(text: &str) -> Vec<String> {
    let content = text.trim();
    let content = content.strip_prefix("Subjects:").unwrap_or(content);

    content
        .split(';')
        .filter_map(|fragment| extract_category_code(fragment))
        .collect()
}

/// Concatenated, trimmed text content of an element.
fn collect_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
