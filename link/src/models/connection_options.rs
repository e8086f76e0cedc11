use serde::{Deserialize, Serialize};

use super::http_version::HttpVersion;

/// Connection-level options for the HTTP client.
///
/// # Example
///
/// ```rust
/// use aceql_link::{ConnectionOptions, HttpVersion};
///
/// let options = ConnectionOptions::default()
///     .with_http_version(HttpVersion::Http1)
///     .with_gzip_result(false)
///     .with_trace_on(true);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// HTTP protocol version to use for connections
    /// Default: Http1
    #[serde(default)]
    pub http_version: HttpVersion,

    /// Ask the server to gzip query result payloads before download.
    /// Default: true
    #[serde(default = "default_gzip_result")]
    pub gzip_result: bool,

    /// Log full request parameters and response bodies at trace level.
    /// Passwords are never logged. Default: false
    #[serde(default)]
    pub trace_on: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_gzip_result() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("aceql-link/{}", crate::VERSION)
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            http_version: HttpVersion::default(),
            gzip_result: true,
            trace_on: false,
            user_agent: default_user_agent(),
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP protocol version to use
    pub fn with_http_version(mut self, version: HttpVersion) -> Self {
        self.http_version = version;
        self
    }

    /// Define if result sets are compressed before download
    pub fn with_gzip_result(mut self, gzip_result: bool) -> Self {
        self.gzip_result = gzip_result;
        self
    }

    /// Turn request/response tracing on or off
    pub fn with_trace_on(mut self, trace_on: bool) -> Self {
        self.trace_on = trace_on;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
