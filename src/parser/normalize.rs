use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown decoration stripped before marker extraction, applied in this order.
///
/// Marker brackets and their payloads go through the same rules, so
/// `[BOLD:**x**]` reaches the marker scan as `[BOLD:x]`.
const RULES: &[(&str, &str)] = &[
    // CRLF line endings
    (r"\r\n", "\n"),
    // fenced code blocks keep their body
    (r"(?s)```[A-Za-z0-9_+-]*\n?(.*?)```", "${1}"),
    // inline code
    (r"`([^`\n]+)`", "${1}"),
    // horizontal rules
    (r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$", ""),
    // heading hashes
    (r"(?m)^[ \t]*#{1,6}[ \t]+", ""),
    // blockquotes
    (r"(?m)^[ \t]*>[ \t]?", ""),
    // bullet lists
    (r"(?m)^[ \t]*[-*+][ \t]+", ""),
    // numbered lists
    (r"(?m)^[ \t]*\d+[.)][ \t]+", ""),
    // bold italic, bold, italic
    (r"\*\*\*(.+?)\*\*\*", "${1}"),
    (r"\*\*(.+?)\*\*", "${1}"),
    (r"\*([^*\n]+)\*", "${1}"),
    // underline
    (r"__([^_\n]+)__", "${1}"),
    // underscore italic, only at a word or payload start so `VOCAB_WORD` survives
    (r"(^|[\s(:|])_([^_\n]+)_", "${1}${2}"),
    // strikethrough
    (r"~~([^~\n]+)~~", "${1}"),
    // three or more newlines collapse to a paragraph break
    (r"\n{3,}", "\n\n"),
];

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

static COMPILED: Lazy<Vec<Rule>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("valid normalization regex"),
            replacement,
        })
        .collect()
});

/// Strip markdown-like decoration from raw tutor text.
///
/// The result is trimmed; an all-whitespace input becomes the empty string.
#[must_use]
pub fn normalize(content: &str) -> String {
    let mut out = content.to_string();
    for rule in COMPILED.iter() {
        out = rule
            .pattern
            .replace_all(&out, rule.replacement)
            .into_owned();
    }
    out.trim().to_string()
}
