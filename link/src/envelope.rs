//! Response envelope decoding.
//!
//! Every AceQL response is a JSON document with a `status` discriminator
//! (`OK` / `FAIL`). Decoding never fails: an empty, non-JSON or status-less
//! body degrades to a FAIL envelope carrying the raw HTTP status, so callers
//! always get a definite verdict.
//!
//! Row data of query responses is not handled here; see [`crate::cursor`].

use crate::{
    error::AceQlLinkError,
    models::{ErrorDetail, ResponseStatus, NULL_MARKER},
    transport::HttpReply,
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Decoded ok/error wrapper around one server response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    status: ResponseStatus,
    /// Present only when `status` is OK
    document: Option<Map<String, JsonValue>>,
    /// Present only when `status` is FAIL
    error: Option<ErrorDetail>,
    http_status_code: u16,
    http_status_message: String,
}

impl ResultEnvelope {
    /// Decode a raw body. Never fails.
    pub fn decode(body: &str, http_status_code: u16, http_status_message: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::http_failure(http_status_code, http_status_message);
        }

        let document = match serde_json::from_str::<JsonValue>(trimmed) {
            Ok(JsonValue::Object(map)) => map,
            _ => return Self::http_failure(http_status_code, http_status_message),
        };

        Self::from_document(document, http_status_code, http_status_message)
    }

    pub fn from_reply(reply: &HttpReply) -> Self {
        Self::decode(&reply.body, reply.status_code, &reply.status_message)
    }

    /// Build from an already parsed JSON object.
    pub fn from_document(
        document: Map<String, JsonValue>,
        http_status_code: u16,
        http_status_message: &str,
    ) -> Self {
        let status = match document
            .get("status")
            .and_then(JsonValue::as_str)
            .and_then(ResponseStatus::parse)
        {
            Some(status) => status,
            None => return Self::http_failure(http_status_code, http_status_message),
        };

        match status {
            ResponseStatus::Ok => Self {
                status,
                document: Some(document),
                error: None,
                http_status_code,
                http_status_message: http_status_message.to_string(),
            },
            ResponseStatus::Fail => {
                let error = ErrorDetail {
                    error_type: document
                        .get("error_type")
                        .and_then(json_to_i64)
                        .unwrap_or(0) as i32,
                    error_message: document
                        .get("error_message")
                        .and_then(json_to_string)
                        .unwrap_or_default(),
                    stack_trace: document.get("stack_trace").and_then(json_to_string),
                    http_status: document
                        .get("http_status")
                        .and_then(json_to_i64)
                        .and_then(|v| u16::try_from(v).ok()),
                };
                Self::failure(error, http_status_code, http_status_message)
            },
        }
    }

    /// FAIL envelope synthesized from the HTTP status alone.
    pub fn http_failure(http_status_code: u16, http_status_message: &str) -> Self {
        let error = ErrorDetail {
            error_type: 0,
            error_message: format!("HTTP_FAILURE {} {}", http_status_code, http_status_message)
                .trim_end()
                .to_string(),
            stack_trace: None,
            http_status: Some(http_status_code),
        };
        Self::failure(error, http_status_code, http_status_message)
    }

    fn failure(error: ErrorDetail, http_status_code: u16, http_status_message: &str) -> Self {
        Self {
            status: ResponseStatus::Fail,
            document: None,
            error: Some(error),
            http_status_code,
            http_status_message: http_status_message.to_string(),
        }
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.error_message.as_str())
    }

    /// Server error code; 0 for OK envelopes and synthesized failures.
    pub fn error_type(&self) -> i32 {
        self.error.as_ref().map(|e| e.error_type).unwrap_or(0)
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.stack_trace.as_deref())
    }

    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    pub fn http_status_code(&self) -> u16 {
        self.http_status_code
    }

    pub fn http_status_message(&self) -> &str {
        &self.http_status_message
    }

    /// The full OK document, for actions that return a DTO.
    pub fn document(&self) -> Option<&Map<String, JsonValue>> {
        self.document.as_ref()
    }

    /// Single field lookup rendered as its raw string form.
    pub fn value(&self, key: &str) -> Option<String> {
        self.document.as_ref()?.get(key).and_then(json_to_string)
    }

    pub fn int_value(&self, key: &str) -> Option<i64> {
        self.document.as_ref()?.get(key).and_then(json_to_i64)
    }

    /// The generic `result` field returned by property actions.
    pub fn result(&self) -> Option<String> {
        self.value("result")
    }

    /// OUT parameter values keyed by 1-based parameter index.
    ///
    /// A value equal to the null marker maps to `None`.
    pub fn out_parameters_per_index(&self) -> BTreeMap<u32, Option<String>> {
        let mut out = BTreeMap::new();
        let Some(map) = self
            .document
            .as_ref()
            .and_then(|d| d.get("parameters_out_per_index"))
            .and_then(JsonValue::as_object)
        else {
            return out;
        };

        for (key, value) in map {
            if let Ok(index) = key.trim().parse::<u32>() {
                out.insert(index, json_to_string(value).filter(|v| v != NULL_MARKER));
            }
        }
        out
    }

    /// OUT parameter values keyed by parameter name.
    pub fn out_parameters_per_name(&self) -> BTreeMap<String, Option<String>> {
        self.document
            .as_ref()
            .and_then(|d| d.get("parameters_out_per_name"))
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), json_to_string(v).filter(|v| v != NULL_MARKER)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The error this envelope represents, when it is not OK.
    pub fn to_error(&self) -> Option<AceQlLinkError> {
        let error = self.error.as_ref()?;
        Some(AceQlLinkError::ServerError {
            message: error.error_message.clone(),
            error_type: error.error_type,
            stack_trace: error.stack_trace.clone(),
            http_status_code: self.http_status_code,
            http_status_message: self.http_status_message.clone(),
        })
    }

    /// Error for a reply that must not be read as success.
    ///
    /// Used where a non-200 body is otherwise opaque (blob bytes, schema
    /// files): an OK-looking body still yields an `HTTP_FAILURE` error.
    pub fn failure_of(reply: &HttpReply) -> AceQlLinkError {
        let envelope = Self::from_reply(reply);
        let envelope = if envelope.is_ok() {
            Self::http_failure(reply.status_code, &reply.status_message)
        } else {
            envelope
        };
        let error = envelope.error.unwrap_or_default();
        AceQlLinkError::ServerError {
            message: error.error_message,
            error_type: error.error_type,
            stack_trace: error.stack_trace,
            http_status_code: reply.status_code,
            http_status_message: reply.status_message.clone(),
        }
    }

    /// `Ok(self)` for OK envelopes, `Err(ServerError)` otherwise.
    pub fn into_result(self) -> crate::error::Result<Self> {
        match self.to_error() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Raw string form of a scalar JSON value; `null` maps to `None`.
pub(crate) fn json_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn json_to_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
