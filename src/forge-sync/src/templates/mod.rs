//! Tracker comment and link text.
//!
//! Comments posted on tickets are rendered with Handlebars from fixed
//! templates so that re-rendering for the same event yields byte-identical
//! text, which is what duplicate detection relies on.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{
    create_handlebars_registry, mirrored_comment_prefix, CommentRenderer, CommentTemplate,
};

use crate::config::SyncConfig;
use crate::model::User;

/// Removes square brackets so a title can sit inside tracker link markup.
#[must_use]
pub fn strip_brackets(title: &str) -> String {
    title.replace(['[', ']'], "")
}

/// Generates the remote link title for a pull request.
///
/// Format: "[PR] {title}"
#[must_use]
pub fn generate_link_title(title: &str) -> String {
    format!("[PR] {title}")
}

/// Generates the remote link title for a ticket created from an issue.
#[must_use]
pub fn generate_issue_link_title(title: &str) -> String {
    format!("[Issue] {title}")
}

/// Renders how the reporter is referred to in a comment.
///
/// A mapped tracker account becomes a `[~accountid:...]` mention, anyone else
/// is named by their upstream display name.
#[must_use]
pub fn reporter_mention(config: &SyncConfig, reporter: &User) -> String {
    match config.account_id(&reporter.login) {
        Some(account_id) => format!("[~accountid:{account_id}]"),
        None => reporter.display_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[users.octocat]
account-id = "557058:abcd"
"#;

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("[org/repo] Fix [flaky] test"), "org/repo Fix flaky test");
    }

    #[test]
    fn test_generate_link_title() {
        assert_eq!(
            generate_link_title("[org/repo] Fix it"),
            "[PR] [org/repo] Fix it"
        );
        assert_eq!(
            generate_issue_link_title("[org/repo] Crash"),
            "[Issue] [org/repo] Crash"
        );
    }

    #[test]
    fn mentions_mapped_reporter_by_account() {
        let config = SyncConfig::parse(CONFIG, "test").unwrap();
        assert_eq!(
            reporter_mention(&config, &User::new("octocat")),
            "[~accountid:557058:abcd]"
        );
    }

    #[test]
    fn names_unmapped_reporter_verbatim() {
        let config = SyncConfig::parse(CONFIG, "test").unwrap();
        let reporter = User {
            login: "hubot".to_string(),
            name: Some("Hu Bot".to_string()),
        };
        assert_eq!(reporter_mention(&config, &reporter), "Hu Bot");
    }
}
