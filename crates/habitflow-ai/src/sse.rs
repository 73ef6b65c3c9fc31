//! Incremental decoder for the coach reply stream
//!
//! The reply body is a sequence of newline-terminated frames:
//!
//! ```text
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"Hi"}}]}
//! data: [DONE]
//! ```
//!
//! Bytes arrive in arbitrary chunks. A chunk may end inside a line, inside a
//! JSON object or inside a multi-byte character; the decoder keeps whatever it
//! cannot resolve yet and retries once more bytes arrive.

use serde::Deserialize;

/// Prefix of a data frame
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the end of the reply
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decoder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitingChunk,
    HaveBufferedText,
    Done,
    Failed,
}

/// One line of the reply body, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Empty or whitespace-only line
    Blank,
    /// `:` keep-alive
    Comment,
    /// Anything that is not a data frame
    Other,
    /// Trimmed payload of a `data: ` line
    Data(&'a str),
    /// `data: [DONE]`
    Done,
}

impl<'a> Frame<'a> {
    /// Classify a single line with its newline already removed
    pub fn parse(line: &'a str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return Frame::Blank;
        }
        if line.starts_with(':') {
            return Frame::Comment;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return Frame::Other;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            Frame::Done
        } else {
            Frame::Data(payload)
        }
    }
}

#[derive(Deserialize)]
struct StreamPayload {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Text delta carried at `choices[0].delta.content`, if any
fn extract_delta(payload: &str) -> serde_json::Result<Option<String>> {
    let parsed: StreamPayload = serde_json::from_str(payload)?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty()))
}

/// Result of one pass over the buffered text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Bytes at the front of the buffer that were fully resolved
    pub consumed: usize,
    /// Deltas in frame order
    pub deltas: Vec<String>,
    /// The sentinel was reached
    pub terminal: bool,
}

/// Resolve as many complete frames as possible from `buffer`.
///
/// Stops at the first line that has no newline yet, at a data frame whose
/// JSON ends early, or at the sentinel. Everything from `consumed` onward
/// must be kept for the next pass.
pub fn scan_frames(buffer: &str) -> Scan {
    let mut scan = Scan::default();

    while let Some(offset) = buffer[scan.consumed..].find('\n') {
        let line_end = scan.consumed + offset;
        let line = &buffer[scan.consumed..line_end];

        match Frame::parse(line) {
            Frame::Blank | Frame::Comment | Frame::Other => {}
            Frame::Done => {
                scan.consumed = line_end + 1;
                scan.terminal = true;
                break;
            }
            Frame::Data(payload) => match extract_delta(payload) {
                Ok(Some(delta)) => scan.deltas.push(delta),
                Ok(None) => {}
                // Incomplete object: keep the line and wait for more bytes.
                Err(err) if err.is_eof() => break,
                Err(err) => {
                    tracing::warn!(error = %err, frame = payload, "Discarding malformed stream frame");
                }
            },
        }

        scan.consumed = line_end + 1;
    }

    scan
}

/// Streaming UTF-8 decoder that carries split characters across chunks
#[derive(Debug, Default)]
struct Utf8Stream {
    pending: Vec<u8>,
}

impl Utf8Stream {
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(bytes);

        let mut out = String::with_capacity(data.len());
        let mut rest: &[u8] = &data;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Outcome reported when the transport reaches end-of-stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalState {
    pub state: DecoderState,
    /// The sentinel was seen before the stream ended
    pub sentinel_seen: bool,
    /// Unresolved bytes dropped at end-of-stream
    pub discarded_bytes: usize,
}

/// Turns reply body chunks into text deltas
#[derive(Debug)]
pub struct EventDecoder {
    buffer: String,
    utf8: Utf8Stream,
    state: DecoderState,
    sentinel_seen: bool,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            utf8: Utf8Stream::default(),
            state: DecoderState::AwaitingChunk,
            sentinel_seen: false,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn sentinel_seen(&self) -> bool {
        self.sentinel_seen
    }

    /// Text received but not yet resolved into frames
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Feed one chunk and return the deltas it completed, in order.
    ///
    /// After the sentinel, or once the decoder is finished, input is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if matches!(self.state, DecoderState::Done | DecoderState::Failed) {
            return Vec::new();
        }
        if self.sentinel_seen {
            return Vec::new();
        }

        let text = self.utf8.decode(bytes);
        self.buffer.push_str(&text);
        self.state = DecoderState::HaveBufferedText;

        let scan = scan_frames(&self.buffer);
        self.buffer.drain(..scan.consumed);

        if scan.terminal {
            self.sentinel_seen = true;
            self.buffer.clear();
            self.utf8.clear();
        }

        if self.buffer.is_empty() && self.utf8.pending_len() == 0 {
            self.state = DecoderState::AwaitingChunk;
        }

        scan.deltas
    }

    /// Mark the transport as exhausted. Unresolved text is dropped.
    pub fn finish(&mut self) -> FinalState {
        let discarded_bytes = if self.state == DecoderState::Failed {
            0
        } else {
            let discarded = self.buffer.len() + self.utf8.pending_len();
            self.state = DecoderState::Done;
            discarded
        };

        if discarded_bytes > 0 {
            tracing::debug!(discarded_bytes, "Dropping unresolved stream text at end of stream");
        }
        self.buffer.clear();
        self.utf8.clear();

        FinalState {
            state: self.state,
            sentinel_seen: self.sentinel_seen,
            discarded_bytes,
        }
    }

    /// Mark the exchange as failed by the transport
    pub fn fail(&mut self) {
        self.state = DecoderState::Failed;
        self.buffer.clear();
        self.utf8.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    fn decode_all(chunks: &[&[u8]]) -> String {
        let mut decoder = EventDecoder::new();
        let mut content = String::new();
        for chunk in chunks {
            for delta in decoder.feed(chunk) {
                content.push_str(&delta);
            }
        }
        decoder.finish();
        content
    }

    #[test]
    fn single_chunk_frame() {
        let body = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n";
        assert_eq!(decode_all(&[body]), "Hi");
    }

    #[test]
    fn fragment_split_inside_json_recombines() {
        let first = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi";
        let second = b"\"}}]}\n";
        assert_eq!(decode_all(&[first, second]), "Hi");
    }

    #[test]
    fn sentinel_only_yields_empty_content() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: [DONE]\n").is_empty());
        let final_state = decoder.finish();
        assert_eq!(final_state.state, DecoderState::Done);
        assert!(final_state.sentinel_seen);
        assert_eq!(final_state.discarded_bytes, 0);
    }

    #[test]
    fn every_split_point_matches_single_chunk() {
        let mut body = String::new();
        body.push_str(": keep-alive\r\n");
        body.push_str(&frame("Hey 👋 "));
        body.push('\n');
        body.push_str(&frame("café, "));
        body.push_str(&frame("日本語"));
        body.push_str("data: {\"choices\":[{\"delta\":{}}]}\r\n");
        body.push_str(&frame(" done"));
        body.push_str("data: [DONE]\n");
        let bytes = body.as_bytes();

        let expected = decode_all(&[bytes]);
        assert_eq!(expected, "Hey 👋 café, 日本語 done");

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), expected, "split at byte {split}");
        }

        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&singles), expected);
    }

    #[test]
    fn incomplete_fragment_is_idempotent_under_empty_feeds() {
        let mut decoder = EventDecoder::new();
        decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi");
        let before = decoder.buffered().to_string();

        for _ in 0..3 {
            assert!(decoder.feed(&[]).is_empty());
            assert_eq!(decoder.buffered(), before);
        }
        assert_eq!(decoder.state(), DecoderState::HaveBufferedText);
    }

    #[test]
    fn incomplete_complete_line_is_kept_for_retry() {
        // A newline-terminated line whose object is cut short stays buffered.
        let scan = scan_frames("data: {\"choices\":[\n");
        assert_eq!(scan.consumed, 0);
        assert!(scan.deltas.is_empty());
        assert!(!scan.terminal);

        let mut decoder = EventDecoder::new();
        decoder.feed(b"data: {\"choices\":[\n");
        assert_eq!(decoder.buffered(), "data: {\"choices\":[\n");
        assert!(decoder.feed(&[]).is_empty());
        assert_eq!(decoder.buffered(), "data: {\"choices\":[\n");
    }

    #[test]
    fn malformed_complete_line_is_discarded() {
        let mut body = String::from("data: {not json}\n");
        body.push_str(&frame("ok"));
        assert_eq!(decode_all(&[body.as_bytes()]), "ok");
    }

    #[test]
    fn comments_blank_and_foreign_lines_never_reach_the_parser() {
        assert_eq!(Frame::parse(": ping"), Frame::Comment);
        assert_eq!(Frame::parse(""), Frame::Blank);
        assert_eq!(Frame::parse("   \r"), Frame::Blank);
        assert_eq!(Frame::parse("event: message"), Frame::Other);
        assert_eq!(Frame::parse("data:{\"a\":1}"), Frame::Other);
        assert_eq!(Frame::parse("data:  [DONE] \r"), Frame::Done);
        assert_eq!(Frame::parse("data: {\"a\":1}\r"), Frame::Data("{\"a\":1}"));

        let scan = scan_frames(": {\n\n   \nevent: {\n");
        assert_eq!(scan.consumed, ": {\n\n   \nevent: {\n".len());
        assert!(scan.deltas.is_empty());
    }

    #[test]
    fn sentinel_stops_delta_application() {
        let mut body = frame("before");
        body.push_str("data: [DONE]\n");
        body.push_str(&frame("after"));

        let mut decoder = EventDecoder::new();
        let deltas = decoder.feed(body.as_bytes());
        assert_eq!(deltas, vec!["before".to_string()]);
        assert!(decoder.sentinel_seen());
        assert!(decoder.feed(frame("later").as_bytes()).is_empty());

        let final_state = decoder.finish();
        assert_eq!(final_state.state, DecoderState::Done);
    }

    #[test]
    fn empty_and_missing_deltas_are_skipped() {
        let mut body = frame("");
        body.push_str("data: {\"choices\":[]}\n");
        body.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n");
        body.push_str("data: {\"id\":\"x\"}\n");
        body.push_str(&frame("text"));

        let scan = scan_frames(&body);
        assert_eq!(scan.deltas, vec!["text".to_string()]);
        assert_eq!(scan.consumed, body.len());
    }

    #[test]
    fn finish_discards_partial_tail() {
        let mut decoder = EventDecoder::new();
        let mut body = frame("kept");
        body.push_str("data: {\"choices\"");
        assert_eq!(decoder.feed(body.as_bytes()), vec!["kept".to_string()]);

        let final_state = decoder.finish();
        assert_eq!(final_state.discarded_bytes, "data: {\"choices\"".len());
        assert!(!final_state.sentinel_seen);
        assert_eq!(decoder.buffered(), "");
        assert!(decoder.feed(frame("late").as_bytes()).is_empty());
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let body = frame("✓");
        let bytes = body.as_bytes();
        let check = body.find('✓').unwrap();

        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(&bytes[..check + 1]).is_empty());
        assert!(decoder.feed(&bytes[check + 1..check + 2]).is_empty());
        assert_eq!(decoder.feed(&bytes[check + 2..]), vec!["✓".to_string()]);
    }

    #[test]
    fn invalid_utf8_becomes_replacement_character() {
        let mut bytes = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"b\"}}]}\n");
        assert_eq!(decode_all(&[&bytes]), "a\u{FFFD}b");
    }

    #[test]
    fn state_transitions() {
        let mut decoder = EventDecoder::new();
        assert_eq!(decoder.state(), DecoderState::AwaitingChunk);

        decoder.feed(b"data: ");
        assert_eq!(decoder.state(), DecoderState::HaveBufferedText);

        decoder.feed(b"[DONE]\n");
        assert_eq!(decoder.state(), DecoderState::AwaitingChunk);

        decoder.fail();
        assert_eq!(decoder.state(), DecoderState::Failed);
        assert_eq!(decoder.finish().state, DecoderState::Failed);
    }
}
