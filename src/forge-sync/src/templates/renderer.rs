//! Comment renderer.

use super::strip_brackets;
use crate::model::{Comment, PrEvent};
use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};

/// Creates a configured Handlebars registry.
///
/// The registry is configured with:
/// - No HTML escaping (tracker markup passes through untouched)
/// - Strict mode (catches missing variables)
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs
}

/// The comment posted on a ticket for a pull request event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTemplate {
    /// Pull request closed without merging.
    Closed,
    /// Pull request reopened.
    Reopened,
    /// Pull request merged.
    Merged,
    /// Generic "mentioned this issue" comment.
    Mentioned,
}

impl CommentTemplate {
    /// Picks the template for an event.
    #[must_use]
    pub fn for_event(event: &PrEvent) -> Self {
        match event {
            PrEvent::Closed => Self::Closed,
            PrEvent::Reopened => Self::Reopened,
            PrEvent::Merged => Self::Merged,
            PrEvent::Opened | PrEvent::Other(_) => Self::Mentioned,
        }
    }

    /// Returns the Handlebars source of the template.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::Closed => "Merge request [{{title}}|{{url}}] was closed.",
            Self::Reopened => "Merge request [{{title}}|{{url}}] was reopened.",
            Self::Merged => "Merge request [{{title}}|{{url}}] was merged!",
            Self::Mentioned => {
                "{{reporter}} mentioned this issue in merge request [{{title}}| {{url}}]."
            }
        }
    }
}

/// Comment mirroring one upstream comment. The leading id lets later runs
/// find and edit it.
const MIRRORED_COMMENT: &str =
    "[{{id}}] Upstream, {{author}} wrote [{{date}}]:\n\n{quote}\n{{body}}\n{quote}";

/// Comment posted before moving a ticket after its issue closed.
const CLOSE_NOTICE: &str = "[Upstream issue|{{url}}] closed. Attempting transition to {{status}}.";

/// Prefix every mirrored comment for `comment_id` starts with.
#[must_use]
pub fn mirrored_comment_prefix(comment_id: u64) -> String {
    format!("[{comment_id}] Upstream,")
}

/// Renders ticket comments.
pub struct CommentRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for CommentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentRenderer {
    /// Creates a new comment renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Renders a comment.
    ///
    /// # Arguments
    ///
    /// * `template` - Which comment to render
    /// * `title` - Public item title; brackets are stripped
    /// * `url` - Item URL
    /// * `reporter` - Rendered reporter mention
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_comment(
        &self,
        template: CommentTemplate,
        title: &str,
        url: &str,
        reporter: &str,
    ) -> Result<String, super::TemplateError> {
        let data = json!({
            "title": strip_brackets(title),
            "url": url,
            "reporter": reporter,
        });

        self.render_template(template.source(), &data)
    }

    /// Renders the mirror of an upstream comment.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_mirrored_comment(&self, comment: &Comment) -> Result<String, super::TemplateError> {
        let data = json!({
            "id": comment.id,
            "author": comment.author,
            "date": comment.date_created.format("%a %b %d").to_string(),
            "body": comment.body,
        });

        self.render_template(MIRRORED_COMMENT, &data)
    }

    /// Renders the notice posted before a close transition.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_close_notice(&self, url: &str, status: &str) -> Result<String, super::TemplateError> {
        self.render_template(CLOSE_NOTICE, &json!({ "url": url, "status": status }))
    }

    /// Renders a template with the given data.
    fn render_template(&self, template: &str, data: &Value) -> Result<String, super::TemplateError> {
        Ok(self.handlebars.render_template(template, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &str = "[org/repo] Fix [flaky] test";
    const URL: &str = "https://github.com/org/repo/pull/7";

    fn render(template: CommentTemplate) -> String {
        CommentRenderer::new()
            .render_comment(template, TITLE, URL, "[~accountid:42]")
            .unwrap()
    }

    #[test]
    fn test_render_merged() {
        assert_eq!(
            render(CommentTemplate::Merged),
            "Merge request [org/repo Fix flaky test|https://github.com/org/repo/pull/7] was merged!"
        );
    }

    #[test]
    fn test_render_closed_and_reopened() {
        assert_eq!(
            render(CommentTemplate::Closed),
            "Merge request [org/repo Fix flaky test|https://github.com/org/repo/pull/7] was closed."
        );
        assert_eq!(
            render(CommentTemplate::Reopened),
            "Merge request [org/repo Fix flaky test|https://github.com/org/repo/pull/7] was reopened."
        );
    }

    #[test]
    fn test_render_mentioned() {
        assert_eq!(
            render(CommentTemplate::Mentioned),
            "[~accountid:42] mentioned this issue in merge request \
             [org/repo Fix flaky test| https://github.com/org/repo/pull/7]."
        );
    }

    #[test]
    fn test_no_html_escaping() {
        let comment = CommentRenderer::new()
            .render_comment(
                CommentTemplate::Mentioned,
                "<b>&</b>",
                "https://example.com/?a=1&b=2",
                "O'Brien",
            )
            .unwrap();

        assert_eq!(
            comment,
            "O'Brien mentioned this issue in merge request [<b>&</b>| https://example.com/?a=1&b=2]."
        );
    }

    #[test]
    fn renders_mirrored_comment() {
        use chrono::{TimeZone, Utc};

        let comment = Comment {
            author: "Rita Reviewer".to_string(),
            name: "reviewer".to_string(),
            body: "Looks {{fine}} to me".to_string(),
            id: 88,
            date_created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            changed: None,
        };

        let rendered = CommentRenderer::new()
            .render_mirrored_comment(&comment)
            .unwrap();

        assert_eq!(
            rendered,
            "[88] Upstream, Rita Reviewer wrote [Wed May 01]:\n\n{quote}\nLooks {{fine}} to me\n{quote}"
        );
        assert!(rendered.starts_with(&mirrored_comment_prefix(88)));
    }

    #[test]
    fn renders_close_notice() {
        assert_eq!(
            CommentRenderer::new()
                .render_close_notice("https://github.com/org/repo/issues/42", "Closed")
                .unwrap(),
            "[Upstream issue|https://github.com/org/repo/issues/42] closed. Attempting transition to Closed."
        );
    }

    #[test]
    fn picks_template_for_event() {
        assert_eq!(
            CommentTemplate::for_event(&PrEvent::Merged),
            CommentTemplate::Merged
        );
        assert_eq!(
            CommentTemplate::for_event(&PrEvent::Opened),
            CommentTemplate::Mentioned
        );
        assert_eq!(
            CommentTemplate::for_event(&PrEvent::Other("edited".to_string())),
            CommentTemplate::Mentioned
        );
    }
}
