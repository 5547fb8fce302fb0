//! Candidate endpoint resolution
//!
//! Turns the two optional overrides into the ordered, de-duplicated list of
//! anisette providers the fetcher walks through. The list is rebuilt on every
//! call to [`EndpointResolver::resolve`] and is never empty.
//!
//! Resolution order:
//! 1. Multi-endpoint override (`ALTSERVER_ANISETTE_SERVERS`), split on `,` `;`
//!    or space. When it yields at least one token it is used verbatim.
//! 2. Otherwise the single override (`ALTSERVER_ANISETTE_SERVER`) or the
//!    public primary, followed by the two local fallbacks.

use std::fmt;

use crate::constants::{LOCAL_FALLBACK_ENDPOINTS, PRIMARY_ENDPOINT, SERVER_ENV, SERVERS_ENV};

/// Characters stripped from both ends of every endpoint token.
const TRIMMED: [char; 4] = [' ', '\t', '\r', '\n'];

/// An anisette provider URL, stored trimmed of spaces, tabs and line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl AsRef<str>) -> Self {
        Self(trim(url.as_ref()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Raw override strings as read from the environment or config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    /// Delimited list that replaces the defaults.
    pub servers: Option<String>,
    /// Single endpoint that replaces the primary default.
    pub server: Option<String>,
}

impl EndpointOverrides {
    /// Read both overrides from the process environment.
    ///
    /// A variable that is unset or blank is reported as `None`.
    pub fn from_env() -> Self {
        Self {
            servers: non_blank_var(SERVERS_ENV),
            server: non_blank_var(SERVER_ENV),
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !trim(v).is_empty())
}

/// Builds the candidate list from fixed overrides.
#[derive(Debug, Clone, Default)]
pub struct EndpointResolver {
    overrides: EndpointOverrides,
}

impl EndpointResolver {
    pub fn new(overrides: EndpointOverrides) -> Self {
        Self { overrides }
    }

    /// Ordered candidates, first-seen order, no duplicates, never empty.
    pub fn resolve(&self) -> Vec<Endpoint> {
        let explicit = self
            .overrides
            .servers
            .as_deref()
            .map(parse_endpoint_list)
            .unwrap_or_default();
        if !explicit.is_empty() {
            return explicit;
        }

        let mut endpoints = Vec::with_capacity(1 + LOCAL_FALLBACK_ENDPOINTS.len());
        let primary = self
            .overrides
            .server
            .as_deref()
            .map(trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PRIMARY_ENDPOINT);
        push_unique(&mut endpoints, primary);
        for fallback in LOCAL_FALLBACK_ENDPOINTS {
            push_unique(&mut endpoints, fallback);
        }
        endpoints
    }
}

/// Split a delimited override into trimmed, unique, non-empty endpoints.
pub fn parse_endpoint_list(raw: &str) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for token in raw.split([',', ';', ' ']) {
        push_unique(&mut endpoints, token);
    }
    endpoints
}

fn trim(raw: &str) -> &str {
    raw.trim_matches(TRIMMED)
}

fn push_unique(endpoints: &mut Vec<Endpoint>, raw: &str) {
    let endpoint = Endpoint::new(raw);
    if endpoint.as_str().is_empty() || endpoints.contains(&endpoint) {
        return;
    }
    endpoints.push(endpoint);
}
