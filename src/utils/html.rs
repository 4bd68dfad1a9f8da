//! HTML helpers for rendered output and error bodies.

use std::borrow::Cow;

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Splice `insert` into `html` directly before the last occurrence of
/// `marker` (matched case-insensitively). Returns `None` when the marker is
/// absent so callers can pick their own fallback position.
pub fn splice_before(html: &str, marker: &str, insert: &str) -> Option<String> {
    let haystack = html.as_bytes();
    let needle = marker.as_bytes();

    let pos = haystack
        .windows(needle.len())
        .rposition(|w| w.eq_ignore_ascii_case(needle))?;

    let mut result = String::with_capacity(html.len() + insert.len());
    result.push_str(&html[..pos]);
    result.push_str(insert);
    result.push_str(&html[pos..]);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape("hello world"), "hello world");
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_splice_before() {
        let out = splice_before("<body>x</body>", "</body>", "<s/>").unwrap();
        assert_eq!(out, "<body>x<s/></body>");
    }

    #[test]
    fn test_splice_before_case_insensitive() {
        let out = splice_before("<BODY>x</BODY>", "</body>", "<s/>").unwrap();
        assert_eq!(out, "<BODY>x<s/></BODY>");
    }

    #[test]
    fn test_splice_before_missing_marker() {
        assert!(splice_before("<div>x</div>", "</body>", "<s/>").is_none());
    }

    #[test]
    fn test_splice_before_last_occurrence() {
        let out = splice_before("</head>a</head>", "</head>", "!").unwrap();
        assert_eq!(out, "</head>a!</head>");
    }
}
