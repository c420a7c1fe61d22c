//! Utility functions shared across Scholar crates.

use once_cell::sync::Lazy;
use regex::Regex;

/// Secret-looking patterns and their replacements.
static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(api[_-]?key|apikey)[=:]\s*\S{10,}", "$1=***REDACTED***"),
        (r"(?i)(token|secret|bearer)\s*[=:]?\s*[A-Za-z0-9_\-\.]{16,}", "$1 ***REDACTED***"),
        (r"sk-[a-zA-Z0-9_\-]{16,}", "***REDACTED_API_KEY***"),
        (r"gsk_[a-zA-Z0-9]{16,}", "***REDACTED_API_KEY***"),
        (r"tvly-[a-zA-Z0-9_\-]{8,}", "***REDACTED_API_KEY***"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Works on character boundaries, so multi-byte UTF-8 input is safe.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Sanitize a string for safe logging (redact sensitive patterns).
pub fn sanitize_for_log(s: &str) -> String {
    let mut result = s.to_string();
    for (re, replacement) in SECRET_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}
