use serde::{Deserialize, Serialize};

/// Status discriminator carried by every server response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Ok,
    Fail,
}

impl ResponseStatus {
    /// Parse the wire value, case-insensitively. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("OK") {
            Some(ResponseStatus::Ok)
        } else if value.eq_ignore_ascii_case("FAIL") {
            Some(ResponseStatus::Fail)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseStatus::Ok => write!(f, "OK"),
            ResponseStatus::Fail => write!(f, "FAIL"),
        }
    }
}
