//! Tracker error types.

/// Error talking to the downstream ticket tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Transport or decoding failure.
    #[error("Tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with a non-success status.
    #[error("Tracker returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// No transition with the wanted name is available on the ticket.
    #[error("Ticket {key} has no transition named '{status}'")]
    Transition {
        /// Ticket key.
        key: String,
        /// Wanted status name.
        status: String,
    },

    /// The tracker base URL cannot be used.
    #[error("Invalid tracker url '{url}'")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}
