//! Comment content rules: sanitization and validation.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Maximum username length in characters.
pub const MAX_USERNAME_LENGTH: usize = 50;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static URL_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)https?://",
        r"(?i)www\.",
        r"(?i)\.[a-z]{2,}/",
        r"(?i)\b[a-z0-9-]+\.(com|net|org|edu|gov|io|co|uk|us)\b",
    ])
    .expect("valid regex set")
});

/// Strip script blocks and HTML tags, then trim.
pub fn sanitize_text(text: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(text, "");
    let without_tags = HTML_TAG.replace_all(&without_scripts, "");
    without_tags.trim().to_string()
}

/// Whether the text contains anything that looks like a link.
pub fn contains_url(text: &str) -> bool {
    URL_PATTERNS.is_match(text)
}

/// All problems with a comment, in display order. Empty means valid.
pub fn validate_comment(text: &str, username: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if text.trim().is_empty() {
        errors.push("Comment cannot be empty");
    }
    if text.chars().count() > MAX_COMMENT_LENGTH {
        errors.push("Comment must be 500 characters or less");
    }
    if contains_url(text) {
        errors.push("Comments cannot contain URLs or links");
    }
    if username.trim().is_empty() {
        errors.push("Username is required");
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.push("Username must be 50 characters or less");
    }

    errors
}

/// Validate a username chosen at the prompt, returning it trimmed.
pub fn validate_username(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Please enter a username");
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err("Username must be 50 characters or less");
    }
    Ok(trimmed.to_string())
}
