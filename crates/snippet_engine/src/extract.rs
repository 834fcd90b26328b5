use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use snippet_core::FetchFailure;

// Subtrees whose text never renders.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const HTML_MARKER: &str = ":html";
const TEXT_MARKER: &str = ":text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Type-aware default: source for images, text for everything else.
    Auto,
    /// `:html` suffix: container elements yield their inner markup.
    Html,
    /// `:text` suffix: container elements yield visible text only.
    Text,
}

/// A selector as typed by the user, split into CSS and an output marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    pub css: String,
    pub mode: OutputMode,
}

impl SelectorSpec {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (css, mode) = if let Some(css) = raw.strip_suffix(HTML_MARKER) {
            (css, OutputMode::Html)
        } else if let Some(css) = raw.strip_suffix(TEXT_MARKER) {
            (css, OutputMode::Text)
        } else {
            (raw, OutputMode::Auto)
        };
        Self {
            css: css.trim_end().to_string(),
            mode,
        }
    }

    pub fn compile(&self) -> Result<Selector, FetchFailure> {
        Selector::parse(&self.css).map_err(|err| {
            FetchFailure::configuration(format!("Invalid selector: {} ({err})", self.css))
        })
    }
}

/// Turns one matched element into the value shown to the user.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, element: ElementRef<'_>, selector: &SelectorSpec) -> String;
}

/// Rules, first match wins:
/// - `<img>` yields its `src`
/// - `<a>` yields `text (href)`
/// - an element with child elements and an `:html` selector yields its inner markup
/// - anything else yields its visible text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeAwareExtractor;

impl ContentExtractor for TypeAwareExtractor {
    fn extract(&self, element: ElementRef<'_>, selector: &SelectorSpec) -> String {
        let tag = element.value().name();
        if tag.eq_ignore_ascii_case("img") {
            return attr(element, "src").trim().to_string();
        }
        if tag.eq_ignore_ascii_case("a") {
            let text = visible_text(element);
            return format!("{} ({})", text.trim(), attr(element, "href").trim())
                .trim()
                .to_string();
        }
        if selector.mode == OutputMode::Html && has_child_elements(element) {
            return element.inner_html().trim().to_string();
        }
        visible_text(element).trim().to_string()
    }
}

/// Text of the element's subtree, skipping script-like content.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(*element, &mut out);
    out
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if !HIDDEN_TAGS.iter().any(|tag| *tag == element.name()) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn has_child_elements(element: ElementRef<'_>) -> bool {
    element.children().any(|child| child.value().is_element())
}

fn attr<'a>(element: ElementRef<'a>, name: &str) -> &'a str {
    element.value().attr(name).unwrap_or_default()
}
