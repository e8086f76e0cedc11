//! HTTP transport for the AceQL protocol.
//!
//! [`Transport`] is the seam between the protocol logic and the network:
//! it returns raw bodies plus the HTTP status pair and never interprets the
//! envelope. Non-success statuses are not errors at this layer, because the
//! server embeds its own structured error inside the body. Only genuine I/O
//! faults (DNS, socket, timeout, malformed URL) become `TransportError`.

use crate::{
    error::{AceQlLinkError, Result},
    models::{ConnectionOptions, HttpVersion, ProxyConfig},
    timeouts::AceQlTimeouts,
};
use log::{debug, trace, warn};
use reqwest::blocking::multipart::{Form, Part};
use std::io::{self, Read, Write};
use std::time::Instant;

/// Fully read response of one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub body: String,
    pub status_code: u16,
    pub status_message: String,
}

impl HttpReply {
    pub fn new(body: impl Into<String>, status_code: u16, status_message: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status_code,
            status_message: status_message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Response whose body is still on the wire.
///
/// Dropping the stream releases the underlying connection.
pub struct HttpStream {
    pub reader: Box<dyn Read + Send>,
    pub status_code: u16,
    pub status_message: String,
}

impl HttpStream {
    pub fn new(
        reader: Box<dyn Read + Send>,
        status_code: u16,
        status_message: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            status_code,
            status_message: status_message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Drain the body into a trimmed UTF-8 string.
    pub fn into_reply(mut self) -> Result<HttpReply> {
        let mut bytes = Vec::new();
        self.reader.read_to_end(&mut bytes)?;
        let body = String::from_utf8_lossy(&bytes).trim().to_string();
        Ok(HttpReply {
            body,
            status_code: self.status_code,
            status_message: self.status_message,
        })
    }
}

impl std::fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStream")
            .field("status_code", &self.status_code)
            .field("status_message", &self.status_message)
            .finish_non_exhaustive()
    }
}

/// One file part plus its accompanying form fields.
pub struct MultipartUpload {
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file_name: String,
    pub reader: Box<dyn Read + Send>,
    pub length: u64,
}

/// Blocking request/response primitive used by every protocol call.
///
/// Implementations must be shareable across connections of one client.
pub trait Transport: Send + Sync {
    /// Issue a GET and read the whole body.
    fn get(&self, url: &str) -> Result<HttpReply>;

    /// POST URL-encoded UTF-8 parameters and return the body unread.
    fn post_form_stream(&self, url: &str, params: &[(String, String)]) -> Result<HttpStream>;

    /// POST one multipart request carrying `upload`.
    fn post_multipart(&self, url: &str, upload: MultipartUpload) -> Result<HttpReply>;

    /// POST URL-encoded UTF-8 parameters and read the whole body.
    fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<HttpReply> {
        self.post_form_stream(url, params)?.into_reply()
    }
}

/// Encode parameters as an `application/x-www-form-urlencoded` body.
pub fn encode_form(params: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Drain a response body into a local sink and flush it.
///
/// Read faults stay `TransportError`; write and flush faults are `LocalIoError`.
pub(crate) fn drain_into<R, W>(reader: &mut R, writer: &mut W) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = [0u8; 8 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer
            .write_all(&buf[..n])
            .map_err(AceQlLinkError::local_io)?;
        total += n as u64;
    }
    writer.flush().map_err(AceQlLinkError::local_io)?;
    Ok(total)
}

/// Render parameters for trace output with secrets masked.
pub(crate) fn describe_params(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| {
            if k == "password" {
                format!("{}=***", k)
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// [`Transport`] over a `reqwest` blocking client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    trace_on: bool,
}

impl HttpTransport {
    /// Build the underlying HTTP client. Timeouts and proxy are fixed here.
    pub fn new(
        timeouts: &AceQlTimeouts,
        proxy: Option<&ProxyConfig>,
        options: &ConnectionOptions,
    ) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(AceQlTimeouts::effective(timeouts.connect_timeout))
            .timeout(AceQlTimeouts::effective(timeouts.read_timeout))
            .user_agent(options.user_agent.clone())
            .pool_max_idle_per_host(10);

        builder = match options.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        if let Some(proxy) = proxy {
            let mut reqwest_proxy = reqwest::Proxy::all(&proxy.url).map_err(|e| {
                AceQlLinkError::ConfigurationError(format!("Invalid proxy URL '{}': {}", proxy.url, e))
            })?;
            if let Some(username) = &proxy.username {
                reqwest_proxy =
                    reqwest_proxy.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            debug!("[ACEQL_HTTP] Using proxy {}", proxy.url);
            builder = builder.proxy(reqwest_proxy);
        }

        let client = builder
            .build()
            .map_err(|e| AceQlLinkError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            client,
            trace_on: options.trace_on,
        })
    }

    fn status_pair(status: reqwest::StatusCode) -> (u16, String) {
        (
            status.as_u16(),
            status.canonical_reason().unwrap_or("").to_string(),
        )
    }

    fn trace_reply(&self, reply: &HttpReply) {
        if self.trace_on {
            trace!("[ACEQL_HTTP] <- {} {}", reply.status_code, reply.body);
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply> {
        let start = Instant::now();
        debug!("[ACEQL_HTTP] GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept-Charset", "UTF-8")
            .send()?;
        let (status_code, status_message) = Self::status_pair(response.status());
        if status_code != 200 {
            warn!("[ACEQL_HTTP] GET {} returned status={}", url, status_code);
        }

        let reply = HttpStream::new(Box::new(response), status_code, status_message).into_reply()?;
        debug!(
            "[ACEQL_HTTP] GET done: status={} duration_ms={}",
            status_code,
            start.elapsed().as_millis()
        );
        self.trace_reply(&reply);
        Ok(reply)
    }

    fn post_form_stream(&self, url: &str, params: &[(String, String)]) -> Result<HttpStream> {
        let start = Instant::now();
        debug!("[ACEQL_HTTP] POST {}", url);
        if self.trace_on {
            trace!("[ACEQL_HTTP] parameters: {}", describe_params(params));
        }

        let response = self
            .client
            .post(url)
            .header("Accept-Charset", "UTF-8")
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .body(encode_form(params))
            .send()?;
        let (status_code, status_message) = Self::status_pair(response.status());
        debug!(
            "[ACEQL_HTTP] POST headers received: status={} duration_ms={}",
            status_code,
            start.elapsed().as_millis()
        );

        Ok(HttpStream::new(Box::new(response), status_code, status_message))
    }

    fn post_multipart(&self, url: &str, upload: MultipartUpload) -> Result<HttpReply> {
        let start = Instant::now();
        debug!(
            "[ACEQL_HTTP] POST multipart {} (file={} length={})",
            url, upload.file_name, upload.length
        );

        let mut form = Form::new();
        for (key, value) in upload.fields {
            form = form.text(key, value);
        }
        let part = Part::reader_with_length(upload.reader, upload.length)
            .file_name(upload.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| AceQlLinkError::protocol(e.to_string()))?;
        form = form.part(upload.file_field, part);

        let response = self
            .client
            .post(url)
            .header("Accept-Charset", "UTF-8")
            .multipart(form)
            .send()?;
        let (status_code, status_message) = Self::status_pair(response.status());

        let reply = HttpStream::new(Box::new(response), status_code, status_message).into_reply()?;
        debug!(
            "[ACEQL_HTTP] multipart done: status={} duration_ms={}",
            status_code,
            start.elapsed().as_millis()
        );
        self.trace_reply(&reply);
        Ok(reply)
    }
}
