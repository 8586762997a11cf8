//! Incremental decoder for the analyze event stream.
//!
//! The backend pushes UTF-8 text where each event is two lines,
//! `event: <name>` and `data: <json>`, and events are separated by a blank
//! line. Network chunks carry no framing of their own: a chunk may end in
//! the middle of an event, of the `\n\n` delimiter, or of a multi-byte
//! character, so both the undecoded bytes and the undelimited text are
//! carried over between [`StreamDecoder::feed`] calls.

use crate::models::RawEvent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace, warn};

const EVENT_DELIMITER: &str = "\n\n";

static EVENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^event:\s*([A-Za-z0-9_]+)\s*\ndata:\s*(.*)$").expect("event pattern is valid")
});

/// Counters kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Events yielded.
    pub events: usize,
    /// Segments that did not match the `event:`/`data:` shape.
    pub mismatched: usize,
    /// Events dropped because the payload was not valid JSON.
    pub bad_payloads: usize,
}

/// Stateful decoder; one instance per stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes of an incomplete UTF-8 sequence at the end of the last chunk.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a delimiter.
    buffer: String,
    stats: DecoderStats,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next network chunk and return every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.decode_utf8(chunk);
        self.drain_segments()
    }

    /// Signal end of stream.
    ///
    /// An unterminated trailing segment is discarded, not parsed. Returns
    /// the number of bytes thrown away.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffered_len();
        if discarded > 0 {
            debug!("Discarding {} bytes of unterminated stream data", discarded);
        }
        self.buffer.clear();
        self.pending.clear();
        discarded
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Number of bytes currently held back (undecoded plus undelimited).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.pending.len()
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.buffer.push_str(&String::from_utf8_lossy(
                        &self.pending[consumed..consumed + valid],
                    ));
                    match err.error_len() {
                        Some(invalid) => {
                            // Genuinely invalid bytes, not a split sequence
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid + invalid;
                        }
                        None => {
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    fn drain_segments(&mut self) -> Vec<RawEvent> {
        let mut events = Vec::new();

        while let Some(boundary) = self.buffer.find(EVENT_DELIMITER) {
            let segment = self.buffer[..boundary].trim().to_string();
            self.buffer.drain(..boundary + EVENT_DELIMITER.len());

            match parse_segment(&segment) {
                SegmentParse::Event(event) => {
                    self.stats.events += 1;
                    events.push(event);
                }
                SegmentParse::Mismatch => {
                    self.stats.mismatched += 1;
                    trace!("Ignoring non-event segment: {:?}", segment);
                }
                SegmentParse::BadPayload(err) => {
                    self.stats.bad_payloads += 1;
                    warn!("Event payload parse error: {} in {:?}", err, segment);
                }
            }
        }

        events
    }
}

/// Outcome of parsing one delimited segment.
#[derive(Debug)]
pub enum SegmentParse {
    Event(RawEvent),
    Mismatch,
    BadPayload(serde_json::Error),
}

/// Parse one trimmed segment of the stream.
pub fn parse_segment(segment: &str) -> SegmentParse {
    let Some(captures) = EVENT_PATTERN.captures(segment) else {
        return SegmentParse::Mismatch;
    };

    let name = &captures[1];
    let raw = &captures[2];

    match serde_json::from_str::<Value>(raw) {
        Ok(data) => SegmentParse::Event(RawEvent {
            name: name.to_string(),
            data,
        }),
        Err(err) => SegmentParse::BadPayload(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STREAM: &str = "event: status\ndata: {\"message\": \"Fetching article…\"}\n\n\
event: evaluation\ndata: {\"model\": \"gpt-4o\"}\n\n\
event: status\ndata: {\"message\": \"Résumé généré ✓\"}\n\n\
event: done\ndata: {\"title\": \"Über 日本\", \"consensus\": {\"confidence\": 0.8}}\n\n";

    fn decode_all(chunks: &[&[u8]]) -> Vec<RawEvent> {
        let mut decoder = StreamDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.feed(chunk));
        }
        decoder.finish();
        events
    }

    #[test]
    fn test_single_chunk() {
        let events = decode_all(&[STREAM.as_bytes()]);

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["status", "evaluation", "status", "done"]);
        assert_eq!(events[1].data, json!({"model": "gpt-4o"}));
        assert_eq!(events[2].data["message"], "Résumé généré ✓");
        assert_eq!(events[3].data["title"], "Über 日本");
    }

    #[test]
    fn test_chunking_invariance_at_every_offset() {
        let bytes = STREAM.as_bytes();
        let expected = decode_all(&[bytes]);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let bytes = STREAM.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&chunks), decode_all(&[bytes]));
    }

    #[test]
    fn test_irregular_chunk_sizes() {
        let bytes = STREAM.as_bytes();
        for size in [2, 3, 5, 7, 13] {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            assert_eq!(decode_all(&chunks), decode_all(&[bytes]), "chunk size {}", size);
        }
    }

    #[test]
    fn test_split_multibyte_is_not_replaced() {
        let text = "event: status\ndata: {\"message\": \"日本\"}\n\n";
        let bytes = text.as_bytes();
        let split = text.find('日').unwrap() + 1;

        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        let events = decoder.feed(&bytes[split..]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["message"], "日本");
    }

    #[test]
    fn test_split_delimiter() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder
            .feed(b"event: evaluation\ndata: {\"model\": \"m1\"}\n")
            .is_empty());
        let events = decoder.feed(b"\nevent: evaluation\ndata: {\"model\": \"m2\"}\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data["model"], "m2");
    }

    #[test]
    fn test_bad_payload_is_dropped() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(
            b"event: status\ndata: {not json}\n\nevent: status\ndata: {\"message\": \"ok\"}\n\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["message"], "ok");
        assert_eq!(decoder.stats().bad_payloads, 1);
    }

    #[test]
    fn test_mismatched_segments_are_dropped() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(
            b": keep-alive\n\ndata: {\"message\": \"no name\"}\n\nevent: status\n\nevent: status\ndata: {\"message\": \"kept\"}\n\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(decoder.stats().mismatched, 3);
    }

    #[test]
    fn test_finish_discards_partial_segment() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"event: done\ndata: {\"title\": \"never terminated\"}");
        assert!(events.is_empty());

        let discarded = decoder.finish();
        assert!(discarded > 0);
        assert_eq!(decoder.buffered_len(), 0);
        assert_eq!(decoder.stats().events, 0);
    }

    #[test]
    fn test_invalid_bytes_become_replacement() {
        let mut decoder = StreamDecoder::new();
        let mut bytes = b"event: status\ndata: {\"message\": \"a".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"b\"}\n\n");

        let events = decoder.feed(&bytes);
        assert_eq!(events[0].data["message"], "a\u{FFFD}b");
    }

    #[test]
    fn test_event_names_are_ascii_words() {
        assert!(matches!(
            parse_segment("event: statüs\ndata: {}"),
            SegmentParse::Mismatch
        ));
        assert!(matches!(
            parse_segment("event: model_done2\ndata: {}"),
            SegmentParse::Event(_)
        ));
    }

    #[test]
    fn test_parse_segment_shapes() {
        assert!(matches!(
            parse_segment("event:done\ndata:{}"),
            SegmentParse::Event(_)
        ));
        assert!(matches!(
            parse_segment("event: status \n data: {}"),
            SegmentParse::Mismatch
        ));
        assert!(matches!(
            parse_segment("event: status\ndata: [1,"),
            SegmentParse::BadPayload(_)
        ));

        // Payload may span lines
        match parse_segment("event: done\ndata: {\"a\":\n1}") {
            SegmentParse::Event(event) => assert_eq!(event.data, json!({"a": 1})),
            other => panic!("unexpected parse: {:?}", other),
        }
    }
}
