//! Decoding of streamed replies
//!
//! The backend answers `POST /talks/{id}/message` with a body made of
//! newline-terminated JSON objects. Each object carries the whole reply
//! accumulated so far, so consumers replace the displayed text with every
//! snapshot instead of appending to it.

use crate::error::{Error, Result};
use crate::types::ReplySnapshot;
use async_stream::stream;
use futures::StreamExt;
use std::pin::Pin;
use tokio_stream::Stream;

/// A stream of decoded reply snapshots
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplySnapshot>> + Send>>;

/// Incremental decoder for newline-delimited reply snapshots.
///
/// Bytes are buffered until a newline arrives, so chunk boundaries may fall
/// anywhere, including inside a multi-byte character. A terminated line that
/// is only the beginning of an object stays buffered and the next line is
/// appended to it; the buffer is cleared only once an object parses.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    /// Bytes of the current, not yet terminated line
    pending: Vec<u8>,
    /// Terminated lines of an object that has not parsed yet
    running: String,
}

impl ReplyDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the body, returning every snapshot it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<ReplySnapshot>> {
        self.pending.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(item) = self.decode_line(&line[..line.len() - 1]) {
                decoded.push(item);
            }
        }
        decoded
    }

    /// Flush the decoder at the end of the body.
    ///
    /// A final line without a trailing newline is still decoded. Anything
    /// left buffered afterwards is a truncated object.
    pub fn finish(&mut self) -> Vec<Result<ReplySnapshot>> {
        let mut decoded = Vec::new();
        let rest = std::mem::take(&mut self.pending);
        if let Some(item) = self.decode_line(&rest) {
            decoded.push(item);
        }
        if !self.running.is_empty() {
            decoded.push(Err(Error::Truncated(std::mem::take(&mut self.running))));
        }
        decoded
    }

    /// Whether part of an object is still buffered
    pub fn is_buffering(&self) -> bool {
        !self.pending.is_empty() || !self.running.is_empty()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Result<ReplySnapshot>> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                self.running.clear();
                return Some(Err(Error::decode(String::from_utf8_lossy(raw), e)));
            }
        };
        if text.trim().is_empty() {
            return None;
        }

        self.running.push_str(text);
        if !self.running.trim_start().starts_with('{') {
            return Some(Err(Error::decode(
                std::mem::take(&mut self.running),
                "expected a JSON object",
            )));
        }
        match serde_json::from_str::<ReplySnapshot>(&self.running) {
            Ok(snapshot) => {
                self.running.clear();
                Some(Ok(snapshot))
            }
            // Object continues on the next line
            Err(e) if e.is_eof() => None,
            Err(e) => Some(Err(Error::decode(std::mem::take(&mut self.running), e))),
        }
    }
}

/// Turn a reply body into a stream of snapshots.
///
/// The stream ends after the first error, whether it comes from the
/// transport or from decoding.
pub fn decode_stream<S, B, E>(body: S) -> ReplyStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    Box::pin(stream! {
        let mut decoder = ReplyDecoder::new();
        let mut body = Box::pin(body);

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => {
                    for item in decoder.feed(chunk.as_ref()) {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            return;
                        }
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            }
        }

        if decoder.is_buffering() {
            tracing::debug!("Reply body ended with a partial object buffered");
        }
        for item in decoder.finish() {
            let failed = item.is_err();
            yield item;
            if failed {
                return;
            }
        }
    })
}
