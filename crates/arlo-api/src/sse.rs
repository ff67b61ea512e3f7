//! Server-Sent Events framing.
//!
//! The push channel is a plain `text/event-stream` body. Only `data:` lines
//! matter to us; `event:`, `id:`, `retry:` and comment lines are dropped.
//! A blank line terminates a frame, and multi-line data is joined with `\n`.

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::Error;
use crate::transport::ByteStream;

/// Incremental decoder. Chunk boundaries may fall anywhere, including
/// inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed one chunk and return every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(frame) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush whatever is left once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(frame) = self.process_line(line.trim_end_matches('\r')) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_owned());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let frame = self.data.join("\n");
        self.data.clear();
        Some(frame)
    }
}

/// Turn a raw byte stream into a stream of `data` payloads.
pub fn data_frames(mut bytes: ByteStream) -> impl Stream<Item = Result<String, Error>> + Send {
    async_stream::try_stream! {
        let mut decoder = SseDecoder::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for frame in decoder.feed(&chunk) {
                yield frame;
            }
        }
        if let Some(frame) = decoder.finish() {
            yield frame;
        }
    }
}
