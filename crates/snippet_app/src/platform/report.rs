use std::fmt::Write;

use snippet_core::{DisplayContext, FetchResult};

/// Renders one monitor's result as terminal text.
pub(crate) fn render(key: &str, result: &FetchResult, changed: bool) -> String {
    let mut out = String::new();
    let stamp = result.last_updated.format("%Y-%m-%d %H:%M:%S UTC");
    let marker = if changed { " (changed)" } else { "" };
    let _ = writeln!(out, "[{key}] {stamp}{marker}");

    match &result.error {
        None => {
            let matches: Vec<&str> = result.matches().collect();
            if matches.len() > 1 {
                for (index, value) in matches.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", index + 1, value.trim());
                }
            } else {
                let _ = writeln!(out, "  {}", result.content.trim());
            }
        }
        Some(error) => {
            let _ = writeln!(
                out,
                "  {}: {}",
                error.category.label(),
                error.short_message(DisplayContext::Expanded)
            );
            let _ = writeln!(out, "  {}", error.guidance);
        }
    }
    out
}
