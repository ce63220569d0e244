//! Page-context detection
//!
//! Lightweight heuristics over the caller-supplied URL and prompt text that
//! steer prompt construction and the output-token budget. All checks are
//! case-insensitive substring or regex matches; there is no URL parsing.

use regex::Regex;
use std::sync::LazyLock;

/// Coding practice sites recognized by domain substring.
const CODING_PLATFORMS: &[&str] = &[
    "hackerrank.com",
    "leetcode.com",
    "codeforces.com",
    "codewars.com",
    "geeksforgeeks.org",
    "codingame.com",
    "topcoder.com",
    "atcoder.jp",
    "exercism.org",
    "edabit.com",
    "spoj.com",
    "codingbat.com",
];

const CODING_KEYWORDS: &[&str] = &[
    "hackerrank",
    "leetcode",
    "codeforces",
    "codewars",
    "geeksforgeeks",
    "coding",
    "algorithm",
    "data structure",
    "function",
    "class",
    "method",
    "solve",
    "solution",
    "problem",
    "challenge",
    "test case",
    "time complexity",
    "space complexity",
    "debug",
    "error",
    "exception",
    "compile",
    "runtime",
    "programming",
    "code",
    "syntax",
    "variable",
    "loop",
    "array",
    "string",
    "linked list",
    "tree",
    "graph",
    "dynamic programming",
    "recursion",
    "sort",
    "search",
    "binary",
    "hash",
    "stack",
    "queue",
    "heap",
    "database",
    "sql",
    "api",
    "frontend",
    "backend",
    "fullstack",
    "web development",
    "mobile development",
];

const EXPLICIT_CODING_PHRASES: &[&str] = &[
    "coding help",
    "solve this code",
    "programming problem",
    "algorithm question",
    "data structure",
    "tech interview",
    "technical assessment",
];

const IMAGE_CODING_HINTS: &[&str] = &[
    "code", "problem", "question", "solve", "debug", "error", "program",
];

static YOUTUBE_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]+)",
        r"youtube\.com/embed/([A-Za-z0-9_-]+)",
        r"youtube\.com/v/([A-Za-z0-9_-]+)",
        r"youtube\.com/live/([A-Za-z0-9_-]+)",
        r"youtube\.com/shorts/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("youtube URL regex"))
    .collect()
});

/// Whether the URL points at a recognized coding practice platform.
pub fn is_coding_platform(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let lower = url.to_lowercase();
    CODING_PLATFORMS.iter().any(|p| lower.contains(p))
}

/// Whether the prompt (and the presence of a screen capture) suggests a
/// coding question.
pub fn detect_coding_context(prompt: &str, has_image: bool) -> bool {
    let lower = prompt.to_lowercase();

    let keyword = CODING_KEYWORDS.iter().any(|k| lower.contains(k));
    let platform = CODING_PLATFORMS.iter().any(|p| lower.contains(p));
    let explicit = EXPLICIT_CODING_PHRASES.iter().any(|p| lower.contains(p));
    // A capture alongside problem-solving vocabulary often means an IDE or
    // problem statement is on screen.
    let image_hint = has_image && IMAGE_CODING_HINTS.iter().any(|h| lower.contains(h));

    keyword || platform || explicit || image_hint
}

/// Whether the URL belongs to YouTube at all.
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Extract the video id from any common YouTube URL shape
/// (watch, short link, embed, /v/, live, shorts).
pub fn extract_video_id(url: &str) -> Option<&str> {
    if url.is_empty() {
        return None;
    }
    YOUTUBE_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
