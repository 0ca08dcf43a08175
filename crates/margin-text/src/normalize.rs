//! Comparison-text normalization
//!
//! [`normalize`] produces the canonical form both excerpts and pages are
//! compared in. [`tokenize`] turns that form into the match tokens the
//! locator counts.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens must be strictly longer than this many characters to count.
pub const MIN_TOKEN_CHARS: usize = 5;

/// Cleaned anchors shorter than this fall back to the plain normalization.
const MIN_SANITIZED_CHARS: usize = 10;

static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-[ \t]*\r?\n[ \t]*").expect("hyphen-break pattern is valid"));
static EMA_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ema\s*/\s*\d+\s*/\s*\d+").expect("ema pattern is valid"));
static PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)page\s*\d+(\s*/\s*\d+)?").expect("page pattern is valid"));
static REPORT_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)assessment\s*report").expect("report pattern is valid"));
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}\b",
    )
    .expect("month-year pattern is valid")
});

/// Canonicalize raw text for comparison.
///
/// Joins words split by line-break hyphenation (`"exam-\nple"` becomes
/// `"example"`), collapses every whitespace run to a single space,
/// lower-cases and trims. Total: empty input yields an empty string.
#[must_use]
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let joined = HYPHEN_BREAK.replace_all(text, "$1");
    joined
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split normalized text into match tokens.
///
/// Splits on single spaces and keeps only tokens longer than
/// [`MIN_TOKEN_CHARS`] characters.
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

/// Strip running header/footer artifacts from an anchor, then normalize.
///
/// PDF text extraction tends to glue page headers ("Assessment report",
/// "Page 12/80", agency references, issue dates) onto excerpts taken near a
/// page break. Those lines are dropped, inline leftovers are removed, and
/// the remainder is normalized. When cleaning leaves almost nothing the
/// plain normalization of the input is returned instead.
#[must_use]
pub fn sanitize_anchor(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let kept: Vec<&str> = text.lines().filter(|line| !is_boilerplate_line(line)).collect();
    let joined = kept.join(" ");

    let cleaned = EMA_REFERENCE.replace_all(&joined, "");
    let cleaned = PAGE_MARKER.replace_all(&cleaned, "");
    let cleaned = REPORT_TITLE.replace_all(&cleaned, "");
    let cleaned = MONTH_YEAR.replace_all(&cleaned, "");

    let normalized = normalize(&cleaned);
    if normalized.chars().count() < MIN_SANITIZED_CHARS {
        return normalize(text);
    }
    normalized
}

fn is_boilerplate_line(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    if line.is_empty() {
        return true;
    }
    let has_digit = line.chars().any(|c| c.is_ascii_digit());

    line.starts_with("assessment report")
        || (line.contains("ema/") && has_digit)
        || (line.starts_with("page") && has_digit)
        || line.starts_with("procedure no")
        || line.contains("european medicines agency")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_folds() {
        assert_eq!(normalize("  Hello \t\n  WORLD  "), "hello world");
    }

    #[test]
    fn normalize_joins_hyphenated_line_breaks() {
        assert_eq!(normalize("The stabi-\nlity data holds"), "the stability data holds");
        assert_eq!(normalize("exam-  \r\n   ple"), "example");
    }

    #[test]
    fn normalize_keeps_ordinary_hyphens() {
        assert_eq!(normalize("well-known fact"), "well-known fact");
        assert_eq!(normalize("dash -\nalone"), "dash - alone");
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn tokenize_keeps_only_long_tokens() {
        assert_eq!(
            tokenize("bananas crocodile diagram"),
            vec!["bananas", "crocodile", "diagram"]
        );
        assert!(tokenize("a an the").is_empty());
        // exactly five characters is not enough
        assert!(tokenize("tests").is_empty());
        assert_eq!(tokenize("tested"), vec!["tested"]);
    }

    #[test]
    fn tokenize_counts_characters_not_bytes() {
        // five characters, ten bytes
        assert!(tokenize("ééééé").is_empty());
        assert_eq!(tokenize("éééééé"), vec!["éééééé"]);
    }

    #[test]
    fn sanitize_anchor_drops_header_lines() {
        let raw = "Assessment report\nEMA/123/2020\nPage 12/80\nThe active substance is stable under stress";
        assert_eq!(sanitize_anchor(raw), "the active substance is stable under stress");
    }

    #[test]
    fn sanitize_anchor_removes_inline_artifacts() {
        let raw = "Storage conditions Page 4/10 were confirmed in March 2021 studies";
        assert_eq!(sanitize_anchor(raw), "storage conditions were confirmed in studies");
    }

    #[test]
    fn sanitize_anchor_falls_back_when_everything_is_stripped() {
        assert_eq!(sanitize_anchor("Page 78"), "page 78");
    }
}
