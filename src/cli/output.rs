use serde::Serialize;

use crate::models::segment::Segment;

/// Segments parsed from one input file.
#[derive(Debug, Serialize)]
pub struct ParsedFile {
    #[serde(rename = "p")]
    pub path: String,
    #[serde(rename = "s")]
    pub segments: Vec<Segment>,
}

/// Terminal line of a streamed `format` run.
#[derive(Debug, Serialize)]
pub struct StreamSummary {
    pub done: bool,
    pub count: usize,
}

/// Format a result as minified JSON.
pub fn format_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Format a result as indented JSON.
pub fn format_pretty<T: Serialize>(result: &T) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Format per the configured output style.
pub fn render<T: Serialize>(result: &T, pretty: bool) -> String {
    if pretty {
        format_pretty(result)
    } else {
        format_json(result)
    }
}

/// Format an error as JSON.
pub fn format_error(err: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}
