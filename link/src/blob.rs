//! Blob upload, download and length queries.
//!
//! Uploads stream the source as one multipart file part; downloads hand back
//! the response body unread. Neither side buffers the blob in memory.
//! Progress and cancellation go through a shared [`TransferProgress`];
//! cancellation is checked before every chunk, never mid-read.

use crate::{
    connection::post_action,
    envelope::ResultEnvelope,
    error::{AceQlLinkError, Result},
    models::TransferProgress,
    session::Session,
    transport::{MultipartUpload, Transport},
};
use log::{debug, warn};
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const CHUNK_SIZE: usize = 64 * 1024;

/// Blob operations bound to one open connection.
pub struct BlobTransfer<'a> {
    transport: &'a dyn Transport,
    session: &'a Session,
}

impl<'a> BlobTransfer<'a> {
    pub(crate) fn new(transport: &'a dyn Transport, session: &'a Session) -> Self {
        Self { transport, session }
    }

    /// Fresh client-side blob id, `<uuid>.blob`.
    pub fn generate_blob_id() -> String {
        format!("{}.blob", Uuid::new_v4())
    }

    /// Upload `total_length` bytes from `reader` under `blob_id`.
    ///
    /// Progress stays at 99 or below until the server confirms the upload.
    /// A confirmed upload succeeds even if cancellation was requested after
    /// the last chunk. Otherwise the server-side object is left undefined.
    pub fn upload<R>(
        &self,
        blob_id: &str,
        reader: R,
        total_length: u64,
        progress: Option<&Arc<TransferProgress>>,
    ) -> Result<()>
    where
        R: Read + Send + 'static,
    {
        if blob_id.is_empty() {
            return Err(AceQlLinkError::configuration("blob_id is required"));
        }
        if let Some(progress) = progress {
            progress.begin(total_length);
            if progress.is_cancelled() {
                debug!("[ACEQL_BLOB] Upload of {} cancelled before start", blob_id);
                return Err(AceQlLinkError::Cancelled);
            }
        }

        let url = self.session.action_url("blob_upload", None)?;
        let upload = MultipartUpload {
            fields: vec![("blob_id".to_string(), blob_id.to_string())],
            file_field: "file".to_string(),
            file_name: Self::generate_blob_id(),
            reader: Box::new(ProgressReader::new(reader, progress.cloned())),
            length: total_length,
        };

        let start = Instant::now();
        debug!("[ACEQL_BLOB] Uploading {} ({} bytes)", blob_id, total_length);
        let cancelled = || progress.is_some_and(|p| p.is_cancelled());

        let outcome = self
            .transport
            .post_multipart(&url, upload)
            .and_then(|reply| ResultEnvelope::from_reply(&reply).into_result());
        match outcome {
            Ok(_) => {},
            Err(_) if cancelled() => {
                debug!("[ACEQL_BLOB] Upload of {} cancelled", blob_id);
                return Err(AceQlLinkError::Cancelled);
            },
            Err(e) => {
                warn!("[ACEQL_BLOB] Upload of {} failed: {}", blob_id, e);
                return Err(e);
            },
        }

        if let Some(progress) = progress {
            progress.complete();
        }
        debug!(
            "[ACEQL_BLOB] Uploaded {} in {:?}",
            blob_id,
            start.elapsed()
        );
        Ok(())
    }

    /// Open the blob's bytes as a stream. The caller drains and drops it.
    pub fn download(&self, blob_id: &str) -> Result<Box<dyn Read + Send>> {
        if blob_id.is_empty() {
            return Err(AceQlLinkError::configuration("blob_id is required"));
        }
        let url = self.session.action_url("blob_download", None)?;
        let params = vec![("blob_id".to_string(), blob_id.to_string())];

        let stream = self.transport.post_form_stream(&url, &params)?;
        if !stream.is_success() {
            let reply = stream.into_reply()?;
            return Err(ResultEnvelope::failure_of(&reply));
        }
        debug!("[ACEQL_BLOB] Download of {} started", blob_id);
        Ok(stream.reader)
    }

    /// Declared length of a stored blob, without transferring it.
    pub fn get_length(&self, blob_id: &str) -> Result<u64> {
        if blob_id.is_empty() {
            return Err(AceQlLinkError::configuration("blob_id is required"));
        }
        let params = vec![("blob_id".to_string(), blob_id.to_string())];
        let envelope = post_action(self.transport, self.session, "get_blob_length", &params)?;

        let length = envelope
            .value("length")
            .ok_or_else(|| AceQlLinkError::protocol("AceQL Server response has no length"))?;
        length
            .trim()
            .parse::<u64>()
            .map_err(|_| AceQlLinkError::protocol(format!("Invalid blob length: {}", length)))
    }

    /// Download `blob_id` into `writer`, returning the byte count.
    ///
    /// The progress denominator comes from [`get_length`](Self::get_length).
    pub fn download_to<W: Write + ?Sized>(
        &self,
        blob_id: &str,
        writer: &mut W,
        progress: Option<&Arc<TransferProgress>>,
    ) -> Result<u64> {
        if let Some(progress) = progress {
            progress.begin(self.get_length(blob_id)?);
        }

        let mut reader = self.download(blob_id)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            if progress.is_some_and(|p| p.is_cancelled()) {
                debug!("[ACEQL_BLOB] Download of {} cancelled", blob_id);
                return Err(AceQlLinkError::Cancelled);
            }
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buf[..n])
                .map_err(AceQlLinkError::local_io)?;
            written += n as u64;
            if let Some(progress) = progress {
                progress.record(n as u64);
            }
        }
        writer.flush().map_err(AceQlLinkError::local_io)?;

        if let Some(progress) = progress {
            progress.complete();
        }
        debug!("[ACEQL_BLOB] Downloaded {} ({} bytes)", blob_id, written);
        Ok(written)
    }
}

/// Reader adapter feeding the progress counter and honoring cancellation.
struct ProgressReader<R> {
    inner: R,
    progress: Option<Arc<TransferProgress>>,
}

impl<R: Read> ProgressReader<R> {
    fn new(inner: R, progress: Option<Arc<TransferProgress>>) -> Self {
        Self { inner, progress }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(progress) = &self.progress {
            if progress.is_cancelled() {
                return Err(io::Error::new(io::ErrorKind::Other, "blob transfer cancelled"));
            }
        }
        let n = self.inner.read(buf)?;
        if let Some(progress) = &self.progress {
            progress.record(n as u64);
        }
        Ok(n)
    }
}
