//! # SSE framing
//!
//! Turns the chunked body of a `text/event-stream` response into one string
//! per event:
//! - bytes are buffered until a full line is available
//! - consecutive `data:` lines of one event are joined with `\n`
//! - a blank line dispatches the event
//! - comment lines (`:` heartbeats) and other fields (`event:`, `id:`,
//!   `retry:`) are ignored
//!
//! A read error ends the stream; the caller treats that like a closure.

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

struct Framer<S> {
    source: S,
    buffer: BytesMut,
    data: Vec<String>,
    finished: bool,
}

impl<S> Framer<S> {
    /// Pending event, if any `data:` lines were collected.
    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }

    /// Feed one line. Returns an event when the line completes one.
    fn feed_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(value) = data_field(line) {
            self.data.push(value.to_owned());
        }
        None
    }

    /// Split the next complete line out of the buffer.
    fn next_line(&mut self) -> Option<Option<String>> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line = self.buffer.split_to(newline + 1);
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(std::str::from_utf8(&line).ok().map(str::to_owned))
    }
}

/// Value of a `data` field, or `None` for any other line.
fn data_field(line: &str) -> Option<&str> {
    if line.starts_with(':') {
        return None;
    }
    let value = line.strip_prefix("data")?;
    if value.is_empty() {
        return Some("");
    }
    let value = value.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Frame an SSE byte stream into event data strings.
///
/// Events whose data is blank are skipped. Lines that are not valid UTF-8
/// are dropped. A trailing event without its closing blank line is still
/// emitted when the body ends.
pub fn parse_sse_events<S, E>(byte_stream: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display,
{
    let framer = Framer {
        source: byte_stream,
        buffer: BytesMut::with_capacity(8192),
        data: Vec::new(),
        finished: false,
    };

    futures::stream::unfold(framer, |mut framer| async move {
        loop {
            if framer.finished {
                return None;
            }

            while let Some(line) = framer.next_line() {
                let Some(line) = line else { continue };
                if let Some(event) = framer.feed_line(&line) {
                    if event.trim().is_empty() {
                        continue;
                    }
                    return Some((event, framer));
                }
            }

            match framer.source.next().await {
                Some(Ok(chunk)) => framer.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!(error = %e, "event stream read error");
                    framer.finished = true;
                }
                None => {
                    framer.finished = true;
                    if let Ok(rest) = std::str::from_utf8(&framer.buffer) {
                        let rest = rest.trim_end_matches(['\r', '\n']).to_owned();
                        let _ = framer.feed_line(&rest);
                    }
                    framer.buffer.clear();
                    if let Some(event) = framer.take_event() {
                        if !event.trim().is_empty() {
                            return Some((event, framer));
                        }
                    }
                }
            }
        }
    })
}
