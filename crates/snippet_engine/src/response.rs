//! Defensive decoding of worker output.
//!
//! Workers print one JSON object `{content, error, date}` but may surround it
//! with diagnostic lines. The object is located, decoded strictly, then
//! loosely; anything else becomes a parsing failure whose full text goes to
//! the diagnostic sink only.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snippet_core::{prefix_chars, FailureKind, FetchFailure};

use crate::types::Invocation;

const RAW_PREFIX_CHARS: usize = 100;

/// The canonical output schema shared by the HTTP and worker variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOutput {
    pub content: String,
    #[serde(default)]
    pub error: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub content: String,
    pub error: Option<String>,
    pub date: DateTime<Utc>,
}

impl ParsedOutput {
    /// The reported error, if it carries any text.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}

pub fn parse_output(raw: &str, invocation: Invocation<'_>) -> Result<ParsedOutput, FetchFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchFailure::new(
            FailureKind::Network,
            "No content received from fetcher",
        ));
    }

    let candidate = json_candidate(trimmed);
    let strict_err = match serde_json::from_str::<CanonicalOutput>(candidate) {
        Ok(output) => {
            return Ok(ParsedOutput {
                content: output.content,
                error: output.error,
                date: parse_date(Some(&output.date)),
            })
        }
        Err(err) => err,
    };
    invocation.debug(format!("strict decode failed ({strict_err}), trying loose lookup"));

    let loose = loose_lookup(candidate).or_else(|| brace_span(trimmed).and_then(loose_lookup));
    if let Some(output) = loose {
        return Ok(output);
    }

    invocation.warn(format!("unparseable fetcher output:\n{raw}"));
    Err(FetchFailure::parsing(format!(
        "Could not parse fetcher output: {strict_err}. Output began with \"{}\" (full output logged for invocation {})",
        prefix_chars(trimmed, RAW_PREFIX_CHARS),
        invocation.id,
    )))
}

/// First line starting with `{` when the text spans several lines.
fn json_candidate(trimmed: &str) -> &str {
    if !trimmed.contains('\n') {
        return trimmed;
    }
    trimmed
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .unwrap_or(trimmed)
}

/// Outermost `{ ... }` span, for objects pretty-printed over several lines.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn loose_lookup(text: &str) -> Option<ParsedOutput> {
    let value: Value = serde_json::from_str(text).ok()?;
    let map = value.as_object()?;

    let content = map.get("content").and_then(scalar_text);
    let error = map.get("error").and_then(scalar_text);
    if content.is_none() && error.is_none() {
        return None;
    }
    let date = map.get("date").and_then(Value::as_str);

    Some(ParsedOutput {
        content: content.unwrap_or_default(),
        error,
        date: parse_date(date),
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// ISO-8601 timestamp, falling back to now.
pub fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Utc::now();
    };
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    Utc::now()
}
