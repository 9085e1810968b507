//! Markdown normalization for model output.
//!
//! Chat models decorate articles with artifacts the product does not want:
//! bold/italic markers, horizontal rules, stray pipes, code fences. This
//! module strips them, clamps headings at three levels, normalizes list
//! bullets, and rebuilds paragraph spacing. `clean_article` is idempotent.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").unwrap());
static HRULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{3,}").unwrap());
static PIPES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|{2,}").unwrap());
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`{3,}").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static DEEP_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{4,}\s*").unwrap());
static STAR_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[*•]\s+").unwrap());
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());

/// Strip artifacts and normalize structure. Safe to run on already-clean
/// input.
pub fn clean_article(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let mut text = content.to_string();
    text = BOLD.replace_all(&text, "$1").into_owned();
    text = ITALIC.replace_all(&text, "$1").into_owned();
    text = UNDERSCORES.replace_all(&text, "").into_owned();
    text = HRULE.replace_all(&text, "").into_owned();
    text = PIPES.replace_all(&text, "").into_owned();
    text = CODE_FENCE.replace_all(&text, "").into_owned();
    text = INLINE_CODE.replace_all(&text, "$1").into_owned();
    text = DEEP_HEADING.replace_all(&text, "### ").into_owned();
    text = STAR_BULLET.replace_all(&text, "- ").into_owned();

    reflow(&text)
}

/// Rebuild paragraph spacing: single blank line between blocks, headings
/// padded with a blank line on both sides, per-line whitespace trimmed.
fn reflow(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut prev_blank = true;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if !prev_blank {
                out.push(String::new());
            }
            prev_blank = true;
        } else if line.starts_with('#') {
            if let Some(last) = out.last()
                && !last.is_empty()
            {
                out.push(String::new());
            }
            out.push(line.to_string());
            out.push(String::new());
            prev_blank = true;
        } else {
            out.push(line.to_string());
            prev_blank = false;
        }
    }

    let joined = out.join("\n");
    joined.trim().to_string()
}

/// First `# ` heading, if any.
pub fn extract_title(content: &str) -> Option<String> {
    TITLE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
}

/// Whitespace-separated token count, the figure shown on the dashboard.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}
