//! Response post-processing
//!
//! Cosmetic cleanup applied to raw provider text before it is returned to
//! the extension. Total function over its input: no failure modes, and
//! idempotent (processing its own output is a no-op).

use regex::Regex;
use std::sync::LazyLock;

/// Shown when the provider nominally answered but produced nothing usable.
pub const FALLBACK_MESSAGE: &str = "I'm having trouble processing your request right now. \
Could you try asking in a different way or provide more context?";

static FENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*$").expect("fence marker regex"));

static INNER_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```([A-Za-z0-9_+-]+)?[ \t]*\n?((?s:.*?))```").expect("inner fence regex")
});

/// Clean up a raw provider response.
///
/// - Empty input or the literal "No response from AI" placeholder becomes a
///   fixed apology message.
/// - A code fence wrapping the entire response is stripped (some providers
///   wrap plain-text answers in one).
/// - Remaining fenced blocks are re-tagged with an explicit language
///   identifier ("text" when none given) and trimmed of blank lines inside
///   the fence.
pub fn process(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "No response from AI" {
        return FALLBACK_MESSAGE.to_string();
    }

    let unwrapped = strip_wrapping_fence(trimmed);

    let normalized = INNER_FENCE.replace_all(unwrapped, |caps: &regex::Captures<'_>| {
        let lang = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("text");
        let code = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
        format!("```{}\n{}\n```", lang, code)
    });

    normalized.trim().to_string()
}

/// Remove a code fence that wraps the whole response.
///
/// Only applies when the first line is a fence marker, the text ends with a
/// closing fence, and the body contains no further fences; partial or nested
/// fences are left for the normalization pass.
fn strip_wrapping_fence(text: &str) -> &str {
    let Some((first_line, rest)) = text.split_once('\n') else {
        return text;
    };
    if !FENCE_MARKER.is_match(first_line.trim_end()) {
        return text;
    }
    let Some(body) = rest.trim_end().strip_suffix("```") else {
        return text;
    };
    let body = body.trim();
    if body.contains("```") {
        return text;
    }
    body
}
