use serde::{Deserialize, Serialize};

/// Error fields of a FAIL envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Server error code (0 = client/transport side)
    #[serde(default)]
    pub error_type: i32,

    /// Human-readable error message
    #[serde(default)]
    pub error_message: String,

    /// Server-side stack trace, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// HTTP status the server attached to the error, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}
