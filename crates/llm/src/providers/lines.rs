//! Line framing for streamed response bodies.
//!
//! Both streaming formats in use (SSE and NDJSON) are line based. Bytes are
//! buffered raw and decoded one complete line at a time, so a multibyte
//! character split across network chunks is reassembled before decoding.

use crate::client::LlmStreamChunk;
use agentic_core::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// What one decoded line means for the stream.
#[derive(Debug)]
pub(crate) enum LineEvent {
    Chunk(AppResult<LlmStreamChunk>),
    /// Emit this chunk, then end the stream
    Last(LlmStreamChunk),
    Skip,
}

/// Parses one line; the second argument is the requested model name.
pub(crate) type LineParser = fn(&str, &str) -> LineEvent;

/// Raw byte buffer yielding complete `\n`-terminated lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line, without its terminator.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        let end = self.bytes.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line[..end]);
        Some(text.trim_end_matches('\r').to_string())
    }

    /// Whatever is left once the body has ended.
    pub(crate) fn take_rest(&mut self) -> Option<String> {
        if self.bytes.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.bytes);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// State for turning a byte stream into [`LlmStreamChunk`]s.
pub(crate) struct LineStream<S> {
    inner: S,
    buffer: LineBuffer,
    pending: VecDeque<AppResult<LlmStreamChunk>>,
    parse: LineParser,
    model: String,
    finished: bool,
}

impl<S, B> LineStream<S>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
{
    pub(crate) fn new(inner: S, model: String, parse: LineParser) -> Self {
        Self {
            inner,
            buffer: LineBuffer::default(),
            pending: VecDeque::new(),
            parse,
            model,
            finished: false,
        }
    }

    /// Step function for `futures::stream::unfold`.
    pub(crate) async fn next(mut self) -> Option<(AppResult<LlmStreamChunk>, Self)> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some((item, self));
            }
            if self.finished {
                return None;
            }

            match self.inner.next().await {
                Some(Ok(bytes)) => {
                    self.buffer.push(bytes.as_ref());
                    while let Some(line) = self.buffer.next_line() {
                        if !self.handle(&line) {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some((Err(AppError::Llm(format!("Stream error: {}", e))), self));
                }
                None => {
                    if let Some(rest) = self.buffer.take_rest() {
                        self.handle(&rest);
                    }
                    self.finished = true;
                }
            }
        }
    }

    /// Queue the event for `line`; false once the stream is over.
    fn handle(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        match (self.parse)(line, &self.model) {
            LineEvent::Chunk(chunk) => {
                self.pending.push_back(chunk);
                true
            }
            LineEvent::Last(chunk) => {
                self.pending.push_back(Ok(chunk));
                self.finished = true;
                self.buffer.clear();
                false
            }
            LineEvent::Skip => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_joins_split_multibyte() {
        let bytes = "café\nnext".as_bytes();
        // Split inside the two-byte 'é'
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut buffer = LineBuffer::default();
        buffer.push(&bytes[..split]);
        assert_eq!(buffer.next_line(), None);
        buffer.push(&bytes[split..]);
        assert_eq!(buffer.next_line().as_deref(), Some("café"));
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.take_rest().as_deref(), Some("next"));
        assert_eq!(buffer.take_rest(), None);
    }

    #[test]
    fn test_line_buffer_strips_carriage_return() {
        let mut buffer = LineBuffer::default();
        buffer.push(b"data: x\r\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: x"));
    }
}
