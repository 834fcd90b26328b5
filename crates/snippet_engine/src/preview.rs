use scraper::{Html, Selector};
use snippet_core::{collapse_whitespace, prefix_chars};

use crate::extract::visible_text;

pub const MAX_PREVIEW_CHARS: usize = 100;

/// Leading visible text of a document, whitespace-collapsed and capped at
/// [`MAX_PREVIEW_CHARS`]. `None` when the page has no visible text.
pub fn document_preview(doc: &Html) -> Option<String> {
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());
    let text = collapse_whitespace(&visible_text(body));
    if text.is_empty() {
        return None;
    }
    Some(prefix_chars(&text, MAX_PREVIEW_CHARS).to_string())
}
