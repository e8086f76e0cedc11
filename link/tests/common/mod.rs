#![allow(dead_code)]
//! Shared helpers for aceql-link integration tests.
//!
//! [`MockTransport`] replays scripted replies in order and records every
//! request. When no reply is queued it behaves like a tiny blob store, so
//! upload/download round trips work without a server.

use aceql_link::{
    AceQlClient, AceQlLinkError, HttpReply, HttpStream, MultipartUpload, Result, Transport,
};
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

pub const SERVER_URL: &str = "http://localhost:9090/aceql";
pub const DATABASE: &str = "sampledb";
pub const USERNAME: &str = "user1";
pub const PASSWORD: &str = "password1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Multipart,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    /// Bytes drained from a multipart file part
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Last path segment(s) after the connection id, e.g. `execute_query`.
    pub fn action(&self) -> &str {
        match self.url.find("/connection/") {
            Some(pos) => {
                let rest = &self.url[pos + "/connection/".len()..];
                rest.split_once('/').map(|(_, action)| action).unwrap_or("")
            },
            None => self.url.rsplit('/').next().unwrap_or(""),
        }
    }
}

enum Scripted {
    Reply {
        body: Vec<u8>,
        status_code: u16,
        status_message: String,
    },
    Fail(String),
}

#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    read_chunk: Mutex<Option<usize>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a 200 reply.
    pub fn reply_ok(&self, body: &str) -> &Self {
        self.reply(body.as_bytes().to_vec(), 200, "OK")
    }

    pub fn reply(&self, body: Vec<u8>, status_code: u16, status_message: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Scripted::Reply {
            body,
            status_code,
            status_message: status_message.to_string(),
        });
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(&self, message: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
        self
    }

    /// Read multipart bodies in chunks of `size` bytes.
    pub fn set_read_chunk(&self, size: usize) {
        *self.read_chunk.lock().unwrap() = Some(size);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn stored_blob(&self, blob_id: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(blob_id).cloned()
    }

    fn record(&self, method: Method, url: &str, params: &[(String, String)], body: Vec<u8>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            params: params.to_vec(),
            body,
        });
    }

    fn next_scripted(&self) -> Option<Scripted> {
        self.replies.lock().unwrap().pop_front()
    }

    /// Blob store behavior used when nothing is scripted.
    fn emulate(&self, url: &str, params: &[(String, String)]) -> Result<(Vec<u8>, u16, String)> {
        let blob_id = params
            .iter()
            .find(|(k, _)| k == "blob_id")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        if url.ends_with("/blob_download") {
            return Ok(match self.stored_blob(&blob_id) {
                Some(bytes) => (bytes, 200, "OK".to_string()),
                None => (
                    br#"{"status":"FAIL","error_type":0,"error_message":"Blob not found"}"#.to_vec(),
                    404,
                    "Not Found".to_string(),
                ),
            });
        }
        if url.ends_with("/get_blob_length") {
            let length = self.stored_blob(&blob_id).map(|b| b.len()).unwrap_or(0);
            let body = format!(r#"{{"status":"OK","length":{}}}"#, length);
            return Ok((body.into_bytes(), 200, "OK".to_string()));
        }
        Err(AceQlLinkError::TransportError(format!(
            "no scripted reply for {}",
            url
        )))
    }

    fn respond(&self, url: &str, params: &[(String, String)]) -> Result<(Vec<u8>, u16, String)> {
        match self.next_scripted() {
            Some(Scripted::Reply {
                body,
                status_code,
                status_message,
            }) => Ok((body, status_code, status_message)),
            Some(Scripted::Fail(message)) => Err(AceQlLinkError::TransportError(message)),
            None => self.emulate(url, params),
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpReply> {
        self.record(Method::Get, url, &[], Vec::new());
        let (body, status_code, status_message) = self.respond(url, &[])?;
        Ok(HttpReply::new(
            String::from_utf8_lossy(&body).trim().to_string(),
            status_code,
            status_message,
        ))
    }

    fn post_form_stream(&self, url: &str, params: &[(String, String)]) -> Result<HttpStream> {
        self.record(Method::Post, url, params, Vec::new());
        let (body, status_code, status_message) = self.respond(url, params)?;
        Ok(HttpStream::new(
            Box::new(Cursor::new(body)),
            status_code,
            status_message,
        ))
    }

    fn post_multipart(&self, url: &str, mut upload: MultipartUpload) -> Result<HttpReply> {
        let chunk = self.read_chunk.lock().unwrap().unwrap_or(8192);
        let mut received = Vec::new();
        let mut buf = vec![0u8; chunk];
        let outcome = loop {
            match upload.reader.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) => break Err(AceQlLinkError::TransportError(e.to_string())),
            }
        };

        let blob_id = upload
            .fields
            .iter()
            .find(|(k, _)| k == "blob_id")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        self.record(Method::Multipart, url, &upload.fields, received.clone());
        outcome?;

        match self.next_scripted() {
            Some(Scripted::Reply {
                body,
                status_code,
                status_message,
            }) => Ok(HttpReply::new(
                String::from_utf8_lossy(&body).to_string(),
                status_code,
                status_message,
            )),
            Some(Scripted::Fail(message)) => Err(AceQlLinkError::TransportError(message)),
            None => {
                self.blobs.lock().unwrap().insert(blob_id, received);
                Ok(HttpReply::new(r#"{"status":"OK"}"#, 200, "OK"))
            },
        }
    }
}

/// Client wired to `transport`.
pub fn client_with(transport: Arc<MockTransport>) -> AceQlClient {
    AceQlClient::builder()
        .server_url(SERVER_URL)
        .transport(transport)
        .build()
        .expect("client should build")
}

pub fn login_reply(session_id: &str, connection_id: &str) -> String {
    format!(
        r#"{{"status":"OK","session_id":"{}","connection_id":"{}"}}"#,
        session_id, connection_id
    )
}

pub fn connection_reply(connection_id: &str) -> String {
    format!(r#"{{"status":"OK","connection_id":"{}"}}"#, connection_id)
}

pub const OK: &str = r#"{"status":"OK"}"#;

/// Mock plus a logged-in connection (`s1` / `c1`).
pub fn connected() -> (Arc<MockTransport>, aceql_link::Connection) {
    let transport = MockTransport::new();
    transport.reply_ok(&login_reply("s1", "c1"));
    let client = client_with(transport.clone());
    let connection = client
        .connect(DATABASE, USERNAME, PASSWORD)
        .expect("login should succeed");
    (transport, connection)
}

/// Query payload with `rows` rows of `(id, name)`; `None` names are NULL.
pub fn query_payload(rows: &[(i64, Option<&str>)]) -> String {
    let body: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, (id, name))| {
            let name = match name {
                Some(name) => serde_json::Value::String(name.to_string()).to_string(),
                None => "\"NULL\"".to_string(),
            };
            format!(
                r#"{{"row_{}":[{{"customer_id":{}}},{{"fname":{}}}]}}"#,
                i + 1,
                id,
                name
            )
        })
        .collect();
    format!(
        "{{\n  \"status\": \"OK\",\n  \"column_types\": [\"INTEGER\", \"VARCHAR\"],\n  \"query_rows\": [\n    {}\n  ],\n  \"row_count\": {}\n}}",
        body.join(",\n    "),
        rows.len()
    )
}
