//! Error types for anisette acquisition

use std::fmt;

use crate::endpoint::Endpoint;

/// Errors from a single endpoint attempt, plus the aggregate raised by the
/// fetcher when every candidate failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, DNS, timeout, or body read failure.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Provider answered with a status outside 200..=299.
    #[error("{}", describe_status(.status, .content_type, .snippet))]
    HttpStatus {
        status: u16,
        content_type: Option<String>,
        snippet: String,
    },

    /// Body of a successful response is not valid JSON.
    #[error("{0}")]
    Parse(String),

    #[error("anisette response is missing field {0}")]
    MissingField(&'static str),

    #[error("anisette field {field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed X-Apple-I-Client-Time value {0:?}")]
    MalformedTimestamp(String),

    #[error("{}", describe_failures(.0))]
    AllEndpointsFailed(Vec<EndpointError>),

    #[error("no anisette endpoints configured")]
    NoEndpointsConfigured,
}

impl Error {
    /// Short label used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::HttpStatus { .. } => "http_status",
            Error::Parse(_)
            | Error::MissingField(_)
            | Error::InvalidField { .. }
            | Error::MalformedTimestamp(_) => "parse",
            Error::AllEndpointsFailed(_) => "all_endpoints_failed",
            Error::NoEndpointsConfigured => "no_endpoints_configured",
        }
    }

    /// Whether the response reached us but its content was unusable.
    pub fn is_parse_error(&self) -> bool {
        self.kind() == "parse"
    }
}

/// Result alias for anisette operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One candidate's failure, kept for the aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointError {
    endpoint: Endpoint,
    kind: &'static str,
    message: String,
}

impl EndpointError {
    pub fn new(endpoint: Endpoint, error: &Error) -> Self {
        Self {
            endpoint,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Same label as [`Error::kind`] for the underlying failure.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "anisette endpoint failed [{}]: {}",
            self.endpoint, self.message
        )
    }
}

fn describe_status(status: &u16, content_type: &Option<String>, snippet: &str) -> String {
    let mut message = format!("anisette server HTTP {status}");
    if let Some(content_type) = content_type {
        message.push_str(&format!(" ({content_type})"));
    }
    if !snippet.is_empty() {
        message.push_str(&format!(": {snippet}"));
    }
    message
}

fn describe_failures(errors: &[EndpointError]) -> String {
    let mut message = String::from("all anisette endpoints failed");
    for error in errors {
        message.push_str(&format!("\n- {error}"));
    }
    message
}
