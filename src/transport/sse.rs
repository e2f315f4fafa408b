//! Incremental SSE framing
//!
//! [`SseDecoder`] accumulates raw bytes and yields an [`SseFrame`] only once
//! a complete frame (terminated by a blank line) has arrived. Buffering
//! bytes rather than strings means a chunk boundary in the middle of a
//! multi-byte character or in the middle of a `\r\n\r\n` delimiter is
//! harmless.
//!
//! Field processing follows the SSE format:
//!
//! - `data:` -- appended; multiple data lines are joined with `\n`.
//! - `event:` -- the frame's event name.
//! - `id:` -- remembered on the frame.
//! - `retry:` -- ignored.
//! - Lines starting with `:` are comments and ignored.
//!
//! A single space after the colon is stripped from values; any further
//! whitespace is part of the value.

use bytes::{Buf, BytesMut};

/// One complete SSE event block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    /// Joined `data:` lines, `None` if the frame had none.
    pub data: Option<String>,
    pub id: Option<String>,
}

impl SseFrame {
    /// Comment-only or empty blocks carry nothing to dispatch.
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_none()
    }

    /// Parse the text of one event block.
    pub fn parse(block: &str) -> Self {
        let mut frame = SseFrame::default();
        let mut data_lines: Vec<&str> = Vec::new();

        for line in block.split(['\n', '\r']) {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "data" => data_lines.push(value),
                "event" => frame.event = Some(value.trim().to_string()),
                "id" => frame.id = Some(value.trim().to_string()),
                _ => {}
            }
        }

        if !data_lines.is_empty() {
            frame.data = Some(data_lines.join("\n"));
        }
        frame
    }
}

/// Find the earliest blank-line delimiter: `(frame_end, delimiter_len)`.
fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    const DELIMITERS: [&[u8]; 3] = [b"\r\n\r\n", b"\n\n", b"\r\r"];

    DELIMITERS
        .iter()
        .filter_map(|delim| {
            buf.windows(delim.len())
                .position(|w| w == *delim)
                .map(|pos| (pos, delim.len()))
        })
        .min_by_key(|(pos, _)| *pos)
}

/// Byte-level SSE frame decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, delim_len)) = find_boundary(&self.buffer) {
            let block = self.buffer.split_to(end);
            self.buffer.advance(delim_len);

            let frame = SseFrame::parse(&String::from_utf8_lossy(&block));
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Decode whatever remains after the body ended without a final blank
    /// line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let block = self.buffer.split();
        let frame = SseFrame::parse(&String::from_utf8_lossy(&block));
        (!frame.is_empty()).then_some(frame)
    }

    /// Bytes held back waiting for a frame boundary.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
