//! Text scrubbing applied to upstream content before it reaches the tracker.
//!
//! The tracker mishandles non-ASCII content, and item content is later fed
//! through regex matching where stray backslashes break lookups. Both are
//! dealt with once, when an intermediary item is built.

/// Maximum comment body length accepted by the tracker, in characters.
pub const MAX_COMMENT_LENGTH: usize = 65_000;

/// Character substituted for anything outside the ASCII range.
pub const REPLACEMENT_CHAR: char = '?';

/// Scrubs item content down to plain ASCII without backslashes.
///
/// Every non-ASCII character becomes [`REPLACEMENT_CHAR`] and every `\` is
/// dropped. Absent content stays absent.
#[must_use]
pub fn scrub_content(content: Option<&str>) -> Option<String> {
    content.map(|text| {
        text.chars()
            .filter(|c| *c != '\\')
            .map(|c| if c.is_ascii() { c } else { REPLACEMENT_CHAR })
            .collect()
    })
}

/// Caps a comment body at [`MAX_COMMENT_LENGTH`] characters.
///
/// Longer bodies are cut silently since the tracker rejects the write
/// otherwise.
#[must_use]
pub fn trim_comment_body(body: &str) -> String {
    match body.char_indices().nth(MAX_COMMENT_LENGTH) {
        Some((cut, _)) => body[..cut].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scrub_replaces_non_ascii() {
        assert_eq!(
            scrub_content(Some("caf\u{e9} \u{1f680}")),
            Some("caf? ?".to_string())
        );
    }

    #[test]
    fn scrub_removes_backslashes() {
        assert_eq!(
            scrub_content(Some(r"C:\path\to FOO-1")),
            Some("C:pathto FOO-1".to_string())
        );
    }

    #[test]
    fn scrub_keeps_absent_content_absent() {
        assert_eq!(scrub_content(None), None);
        assert_eq!(scrub_content(Some("")), Some(String::new()));
    }

    #[test]
    fn trim_cuts_long_bodies() {
        let body = "a".repeat(MAX_COMMENT_LENGTH + 10);
        let trimmed = trim_comment_body(&body);
        assert_eq!(trimmed.len(), MAX_COMMENT_LENGTH);
    }

    #[test]
    fn trim_counts_characters_not_bytes() {
        let body = "\u{e9}".repeat(MAX_COMMENT_LENGTH);
        assert_eq!(trim_comment_body(&body), body);

        let longer = format!("{body}\u{e9}");
        assert_eq!(trim_comment_body(&longer).chars().count(), MAX_COMMENT_LENGTH);
    }

    proptest! {
        #[test]
        fn scrubbed_content_is_plain_ascii(input in any::<String>()) {
            let scrubbed = scrub_content(Some(&input)).unwrap();
            prop_assert!(scrubbed.is_ascii());
            prop_assert!(!scrubbed.contains('\\'));
        }

        #[test]
        fn trimmed_body_never_exceeds_cap(input in "\\PC{0,300}") {
            let trimmed = trim_comment_body(&input);
            prop_assert!(trimmed.chars().count() <= MAX_COMMENT_LENGTH);
            prop_assert_eq!(trimmed, input);
        }
    }
}
