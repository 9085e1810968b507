//! Input validation: YouTube URLs, video IDs, credentials, filenames.

use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(www\.)?(youtube\.com|youtu\.be|m\.youtube\.com)/").unwrap());

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Patterns for the URL shapes YouTube serves: watch pages, short links,
/// embeds, shorts, and live streams.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?v=([^&]+)",
        r"youtu\.be/([^?]+)",
        r"youtube\.com/embed/([^?]+)",
        r"youtube\.com/v/([^?]+)",
        r"youtube\.com/shorts/([^?]+)",
        r"m\.youtube\.com/watch\?v=([^&]+)",
        r"youtube\.com/live/([^?]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// True when the URL points at a YouTube host over http(s).
pub fn validate_youtube_url(url: &str) -> bool {
    !url.is_empty() && YOUTUBE_URL.is_match(url)
}

/// Extract the 11-character video ID from any recognized YouTube URL form.
/// Candidates that do not match the canonical ID shape are rejected, so the
/// result is always safe for filesystem paths and API calls.
pub fn extract_video_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    for pattern in VIDEO_ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            let candidate = caps.get(1)?.as_str();
            if VIDEO_ID.is_match(candidate) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.len() >= 8
}

pub fn is_valid_username(username: &str) -> bool {
    username.trim().len() >= 3
}

/// Sanitize a title into a safe download filename: word characters, spaces
/// and hyphens only, runs collapsed to a single `-`, capped at 50 chars.
pub fn sanitize_filename(filename: &str) -> String {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return "untitled".to_string();
    }

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == ' ' || *c == '-')
        .collect();
    let collapsed: String = kept
        .split(|c: char| c == ' ' || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let capped: String = collapsed.chars().take(50).collect();
    let result = capped.trim_matches('-').to_string();
    if result.is_empty() {
        "untitled".to_string()
    } else {
        result
    }
}
