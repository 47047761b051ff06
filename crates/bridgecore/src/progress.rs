//! Percent extraction from downloader output.
//!
//! yt-dlp's `--newline` output is unstructured text; progress is recovered
//! with a best-effort scan for a percent sign, not a structured parse.
//! Lines that don't match are skipped silently, and malformed tokens are
//! passed through as display text — callers that need a number go through
//! [`parse_percent`], which never fails the pipeline on garbage input.

/// Extract the displayed progress token from one output line.
///
/// Finds the first `%` and, when it sits at byte index >= 2, returns the two
/// preceding characters plus the sign itself — `" 42%"` yields `"42%"`,
/// `"[download]  42.3%"` yields `".3%"`. The token is whatever the
/// downloader printed there, taken verbatim. Lines with the sign closer to
/// the start, or no sign at all, yield `None`. Only the first occurrence per
/// line is considered.
pub fn percent_token(line: &str) -> Option<&str> {
    let idx = line.find('%')?;
    if idx < 2 {
        return None;
    }
    // The token is a byte slice; skip the line if a multibyte character
    // straddles the cut instead of panicking.
    if !line.is_char_boundary(idx - 2) {
        return None;
    }
    Some(&line[idx - 2..=idx])
}

/// Defensive numeric view of a token.
///
/// Tokens are display text and may be malformed (`"b%"`, `" .%"`); those
/// return `None`. Values parse clamped to 0..=100.
pub fn parse_percent(token: &str) -> Option<u8> {
    let digits = token.strip_suffix('%')?;
    digits.trim().parse::<u8>().ok().map(|p| p.min(100))
}
