use serde::{Deserialize, Serialize};

/// HTTP protocol version used by the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersion {
    /// HTTP/1.1 only (default, what AceQL servers are deployed behind)
    #[default]
    Http1,
    /// HTTP/2 with prior knowledge
    Http2,
    /// Let the client negotiate
    Auto,
}
