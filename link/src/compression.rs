//! Result payload decompression
//!
//! With `gzip_result=true` the server gzips query payloads. Older servers
//! and error bodies are sent as-is, so detection is done on the magic bytes
//! rather than trusted from the request flag.

use flate2::read::GzDecoder;
use std::io::{BufRead, BufReader, Read};

/// Check if data is gzip compressed (magic bytes check)
#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Wrap `reader` so it yields plain bytes whether or not the stream is gzipped.
///
/// Only the first buffer is peeked; the body itself is never read eagerly.
pub fn decompressing_reader<R>(reader: R) -> std::io::Result<Box<dyn Read + Send>>
where
    R: Read + Send + 'static,
{
    let mut buffered = BufReader::new(reader);
    let compressed = is_gzip(buffered.fill_buf()?);
    if compressed {
        log::debug!("[ACEQL_QUERY] Result payload is gzip compressed");
        Ok(Box::new(GzDecoder::new(buffered)))
    } else {
        Ok(Box::new(buffered))
    }
}
