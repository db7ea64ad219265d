//! Extraction of downstream ticket keys from free text.
//!
//! Upstream items reference tracker tickets informally ("Relates to
//! FACTORY-1234") in their description or in any comment. The matcher scans
//! all of that text and returns every `PROJECT-NUMBER` shaped token.

use crate::model::Comment;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Loose first-pass pattern: ASCII word characters, a dash, digits.
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]*-[0-9]*").expect("Invalid ticket key pattern"));

static DIGIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("Invalid digit pattern"));

/// Finds candidate ticket keys in item content and comments.
///
/// Comments are scanned newest first, each preceded by a space, with the
/// content appended directly after the oldest comment. The result is a set:
/// duplicates collapse and iteration order is lexicographic.
///
/// # Arguments
///
/// * `content` - Item description, if any
/// * `comments` - Item comments in chronological order
#[must_use]
pub fn match_ticket_keys(content: Option<&str>, comments: &[Comment]) -> BTreeSet<String> {
    let mut buffer = String::from(" ");
    for comment in comments.iter().rev() {
        buffer.push(' ');
        buffer.push_str(&comment.body);
    }
    if let Some(content) = content {
        buffer.push_str(content);
    }

    KEY_PATTERN
        .find_iter(&buffer)
        .map(|m| m.as_str())
        // A lone dash matches the loose pattern too
        .filter(|candidate| candidate.chars().count() != 1)
        .filter(|candidate| is_ticket_key(candidate))
        .map(str::to_string)
        .collect()
}

/// Second-pass check that a candidate really is key shaped.
fn is_ticket_key(candidate: &str) -> bool {
    KEY_PATTERN.is_match(candidate) && DIGIT_PATTERN.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn comment(body: &str) -> Comment {
        Comment {
            author: "Jane Doe".to_string(),
            name: "jdoe".to_string(),
            body: body.to_string(),
            id: 1,
            date_created: chrono::DateTime::default(),
            changed: None,
        }
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(match_ticket_keys(Some(""), &[]).is_empty());
        assert!(match_ticket_keys(None, &[]).is_empty());
    }

    #[test]
    fn finds_key_in_content() {
        assert_eq!(
            match_ticket_keys(Some("See FACTORY-123"), &[]),
            keys(&["FACTORY-123"])
        );
    }

    #[test]
    fn ignores_lone_dash() {
        assert!(match_ticket_keys(Some("dash alone - nothing"), &[]).is_empty());
    }

    #[test]
    fn ignores_dash_without_digits() {
        assert!(match_ticket_keys(Some("a well-known re-write"), &[]).is_empty());
    }

    #[test]
    fn collects_keys_from_comments_and_content() {
        let comments = vec![comment("Relates to OPS-7"), comment("also FACTORY-9")];
        assert_eq!(
            match_ticket_keys(Some("Fixes FACTORY-9"), &comments),
            keys(&["FACTORY-9", "OPS-7"])
        );
    }

    #[test]
    fn deduplicates_repeated_keys() {
        let comments = vec![comment("FACTORY-1"), comment("FACTORY-1 again")];
        assert_eq!(
            match_ticket_keys(Some("FACTORY-1"), &comments),
            keys(&["FACTORY-1"])
        );
    }

    #[test]
    fn non_ascii_digits_are_not_key_numbers() {
        assert!(match_ticket_keys(Some("PROJ-\u{664}\u{665}"), &[]).is_empty());
    }

    #[test]
    fn content_is_appended_without_separator() {
        let comments = vec![comment("see project")];
        assert_eq!(
            match_ticket_keys(Some("OPS-4"), &comments),
            keys(&["projectOPS-4"])
        );
    }

    #[test]
    fn oldest_comment_is_adjacent_to_content() {
        let comments = vec![comment("first FOO"), comment("second BAR")];
        assert_eq!(
            match_ticket_keys(Some("-12 fixed"), &comments),
            keys(&["FOO-12"])
        );
    }

    proptest! {
        #[test]
        fn result_ignores_comment_order(
            bodies in proptest::collection::vec("[A-Z]{1,4}-[0-9]{1,3}|[a-z ]{0,8}", 0..6)
        ) {
            let forward: Vec<Comment> = bodies.iter().map(|b| comment(b)).collect();
            let backward: Vec<Comment> = forward.iter().rev().cloned().collect();
            prop_assert_eq!(
                match_ticket_keys(None, &forward),
                match_ticket_keys(None, &backward)
            );
        }

        #[test]
        fn every_key_has_dash_and_digit(text in "\\PC{0,80}") {
            for key in match_ticket_keys(Some(&text), &[]) {
                prop_assert!(key.contains('-'));
                prop_assert!(key.chars().any(|c| c.is_ascii_digit()));
            }
        }
    }
}
