//! Wire types of the extraction service.

use serde::{Deserialize, Serialize};

/// Body of `POST {serverURL}/extract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    pub selector: String,
    /// Seconds the service may spend on the page.
    pub timeout: u64,
    pub first_only: bool,
    pub render_js: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitFor>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaitFor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractionResponse {
    pub results: Vec<ExtractedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ExtractedItem {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl ExtractedItem {
    /// Text when present and non-empty, otherwise html.
    pub fn best_value(&self) -> Option<&str> {
        [self.text.as_deref(), self.html.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

/// `error` field of a service reply, if the body carries one.
pub fn error_field(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")?
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_wait_fields() {
        let request = ExtractionRequest {
            url: "https://example.com".into(),
            selector: "h1".into(),
            timeout: 45,
            first_only: true,
            render_js: true,
            wait_for: Some(WaitFor {
                load_state: Some("load".into()),
                ..WaitFor::default()
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "url": "https://example.com",
                "selector": "h1",
                "timeout": 45,
                "first_only": true,
                "render_js": true,
                "wait_for": {"load_state": "load"}
            })
        );
    }

    #[test]
    fn best_value_prefers_text_then_html() {
        let both = ExtractedItem {
            text: Some("plain".into()),
            html: Some("<b>plain</b>".into()),
        };
        assert_eq!(both.best_value(), Some("plain"));

        let blank_text = ExtractedItem {
            text: Some("  ".into()),
            html: Some("<i>x</i>".into()),
        };
        assert_eq!(blank_text.best_value(), Some("<i>x</i>"));
        assert_eq!(ExtractedItem::default().best_value(), None);
    }

    #[test]
    fn error_field_is_optional() {
        assert_eq!(error_field(br#"{"error":"bad key"}"#), Some("bad key".into()));
        assert_eq!(error_field(br#"{"detail":"x"}"#), None);
        assert_eq!(error_field(b"<html>oops</html>"), None);
    }
}
