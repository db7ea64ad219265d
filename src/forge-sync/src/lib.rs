#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod runner;
pub mod summary;
pub mod templates;
pub mod tracker;
pub mod upstream;

pub use config::{
    ConfigError, FieldSync, IssueUpdates, OnClose, PrUpdates, Route, StatusSync, SyncConfig,
    SyncKind, TrackerInstance, UpstreamSource, UserMapping,
};
pub use matcher::match_ticket_keys;
pub use model::{
    Comment, Issue, IssueStatus, PrEvent, PullRequest, UpstreamComment, UpstreamIssue,
    UpstreamPullRequest, User,
};
pub use normalize::{scrub_content, trim_comment_body, MAX_COMMENT_LENGTH};
pub use reconcile::{
    sync_issue, sync_pull_request, AbandonReason, AbandonedCandidate, SyncError, SyncOutcome,
    SyncReport, TicketUpdate,
};
pub use runner::{Runner, RunnerConfig, RunnerError};
pub use summary::{ProcessingResult, RunSummary};
pub use templates::{
    create_handlebars_registry, generate_issue_link_title, generate_link_title,
    mirrored_comment_prefix, reporter_mention, strip_brackets, CommentRenderer, CommentTemplate,
    TemplateError,
};
pub use tracker::{
    FieldUpdate, JiraClient, JiraConnector, NewTicket, RemoteLink, Ticket, TicketComment,
    TicketFields, TrackerClient, TrackerConnector, TrackerError, Transition,
};
pub use upstream::{
    check_core_rate_limit, ensure_core_rate_limit, fetch_comments, fetch_issues,
    fetch_pull_requests, parse_event, RateLimitInfo, UpstreamError, UpstreamEvent,
};
