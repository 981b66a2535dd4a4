//! Frame accumulation for the inbound stream and encoding for the outbound one
//!
//! Inbound units are either `Content-Length: <n>\r\n\r\n<json>` or a bare JSON
//! line. The header is only used to find where the payload starts; its value
//! is never checked against the payload length. Outbound units always carry
//! the header with the exact byte length of the body.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub const CONTENT_LENGTH_HEADER: &str = "Content-Length:";

/// Largest amount of unparsed input held while waiting for a frame to close
pub const MAX_BUFFERED_BYTES: usize = 4 * 1024 * 1024;

/// Result of asking the parser for the next message
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Not enough bytes yet; the buffer is kept
    Incomplete,
    /// One full JSON document, removed from the buffer
    Complete(Value),
    /// The buffer can never become a message and was discarded
    Invalid(String),
}

/// Accumulating frame parser
#[derive(Debug)]
pub struct FrameParser {
    buffer: String,
    max_buffered: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::with_limit(MAX_BUFFERED_BYTES)
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that gives up on a pending frame once it exceeds `max_buffered` bytes
    pub fn with_limit(max_buffered: usize) -> Self {
        Self {
            buffer: String::new(),
            max_buffered,
        }
    }

    /// Append one inbound line; blank lines are ignored
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return;
        }

        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Try to take one message off the front of the buffer
    ///
    /// Call repeatedly until it returns [`FrameOutcome::Incomplete`].
    pub fn next_frame(&mut self) -> FrameOutcome {
        let start = match self.payload_start() {
            Ok(Some(start)) => start,
            Ok(None) => return self.incomplete(),
            Err(reason) => {
                self.buffer.clear();
                return FrameOutcome::Invalid(reason);
            }
        };

        let (parsed, consumed) = {
            let mut stream =
                serde_json::Deserializer::from_str(&self.buffer[start..]).into_iter::<Value>();
            let parsed = stream.next();
            (parsed, start + stream.byte_offset())
        };

        match parsed {
            Some(Ok(value)) => {
                self.buffer.drain(..consumed);
                if self.buffer.trim().is_empty() {
                    self.buffer.clear();
                }
                FrameOutcome::Complete(value)
            }
            Some(Err(e)) if e.is_eof() => {
                debug!("Buffered partial frame ({} bytes)", self.buffer.len());
                self.incomplete()
            }
            Some(Err(e)) => {
                self.buffer.clear();
                FrameOutcome::Invalid(e.to_string())
            }
            None => self.incomplete(),
        }
    }

    /// Keep waiting unless the pending input has outgrown the cap
    fn incomplete(&mut self) -> FrameOutcome {
        if self.buffer.len() > self.max_buffered {
            let size = self.buffer.len();
            self.buffer.clear();
            return FrameOutcome::Invalid(format!(
                "unterminated frame exceeds {} bytes ({} buffered)",
                self.max_buffered, size
            ));
        }
        FrameOutcome::Incomplete
    }

    /// Byte offset of the JSON payload, `None` while waiting for it
    fn payload_start(&self) -> Result<Option<usize>, String> {
        let trimmed = self.buffer.trim_start();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let offset = self.buffer.len() - trimmed.len();

        if trimmed.starts_with('{') {
            Ok(Some(offset))
        } else if has_header_prefix(trimmed, CONTENT_LENGTH_HEADER) {
            let after = offset + CONTENT_LENGTH_HEADER.len();
            Ok(self.buffer[after..].find('{').map(|i| after + i))
        } else if has_header_prefix(CONTENT_LENGTH_HEADER, trimmed.trim_end()) {
            // A header split across reads
            Ok(None)
        } else {
            Err(format!(
                "unexpected leading bytes: {:?}",
                trimmed.chars().take(32).collect::<String>()
            ))
        }
    }
}

/// ASCII case-insensitive `starts_with`; header names are not case sensitive
fn has_header_prefix(text: &str, prefix: &str) -> bool {
    text.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

/// Serialize a message with a `Content-Length` header
pub fn encode_frame<T: Serialize>(message: &T) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut frame = format!("{} {}\r\n\r\n", CONTENT_LENGTH_HEADER, body.len()).into_bytes();
    frame.extend_from_slice(&body);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete(outcome: FrameOutcome) -> Value {
        match outcome {
            FrameOutcome::Complete(v) => v,
            other => panic!("Expected complete frame, got: {:?}", other),
        }
    }

    #[test]
    fn test_bare_json_line() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id":1,"method":"tools/list"}"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(1));
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
        assert!(parser.buffered().is_empty());
    }

    #[test]
    fn test_header_then_payload() {
        let mut parser = FrameParser::new();
        parser.push_line("Content-Length: 34\r\n");
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
        parser.push_line("\r\n");
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
        parser.push_line(r#"{"id":7,"method":"prompts/list"}"#);

        assert_eq!(complete(parser.next_frame())["method"], json!("prompts/list"));
    }

    #[test]
    fn test_header_length_is_not_enforced() {
        let mut parser = FrameParser::new();
        parser.push_line("Content-Length: 3");
        parser.push_line(r#"{"id":2,"method":"initialize"}"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(2));
    }

    #[test]
    fn test_message_split_across_lines() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id": 3,"#);
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
        parser.push_line(r#""method": "tools/list"}"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(3));
    }

    #[test]
    fn test_blank_line_keeps_partial_state() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id": 4,"#);
        parser.push_line("");
        parser.push_line("   ");
        assert_eq!(parser.buffered(), "{\"id\": 4,\n");
    }

    #[test]
    fn test_back_to_back_messages_in_one_chunk() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id":1,"method":"resources/list"}{"id":2,"method":"prompts/list"}"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(1));
        assert_eq!(complete(parser.next_frame())["id"], json!(2));
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
    }

    #[test]
    fn test_bare_message_then_header_framed() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id":1,"method":"tools/list"}Content-Length: 30"#);
        parser.push_line(r#"{"id":2,"method":"initialize"}"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(1));
        assert_eq!(complete(parser.next_frame())["id"], json!(2));
    }

    #[test]
    fn test_trailing_partial_is_kept() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id":1,"method":"tools/list"}{"id":2,"#);

        assert_eq!(complete(parser.next_frame())["id"], json!(1));
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
        parser.push_line(r#""method":"tools/list"}"#);
        assert_eq!(complete(parser.next_frame())["id"], json!(2));
    }

    // Malformed fragments are dropped without an error frame; the parser
    // recovers for the next message.
    #[test]
    fn test_malformed_message_is_discarded() {
        let mut parser = FrameParser::new();
        parser.push_line(r#"{"id": 5, "method": ]"#);
        assert!(matches!(parser.next_frame(), FrameOutcome::Invalid(_)));
        assert!(parser.buffered().is_empty());

        parser.push_line(r#"{"id":6,"method":"tools/list"}"#);
        assert_eq!(complete(parser.next_frame())["id"], json!(6));
    }

    #[test]
    fn test_garbage_prefix_is_discarded() {
        let mut parser = FrameParser::new();
        parser.push_line("hello there");
        assert!(matches!(parser.next_frame(), FrameOutcome::Invalid(_)));
        assert!(parser.buffered().is_empty());
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let mut parser = FrameParser::new();
        parser.push_line("content-length: 30");
        parser.push_line(r#"{"id":9,"method":"initialize"}"#);
        assert_eq!(complete(parser.next_frame())["id"], json!(9));

        parser.push_line("CONTENT-LENGTH: 31");
        parser.push_line(r#"{"id":10,"method":"initialize"}"#);
        assert_eq!(complete(parser.next_frame())["id"], json!(10));

        parser.push_line("content-len");
        assert_eq!(parser.next_frame(), FrameOutcome::Incomplete);
    }

    #[test]
    fn test_unterminated_frame_is_capped() {
        let limit = 64 * 1024;
        let mut parser = FrameParser::with_limit(limit);
        parser.push_line(r#"{"a":["#);
        let chunk = "1,".repeat(512);

        let mut outcome = parser.next_frame();
        while outcome == FrameOutcome::Incomplete {
            assert!(parser.buffered().len() <= limit + chunk.len() + 1);
            parser.push_line(&chunk);
            outcome = parser.next_frame();
        }

        assert!(matches!(outcome, FrameOutcome::Invalid(_)));
        assert!(parser.buffered().is_empty());

        parser.push_line(r#"{"id":11,"method":"tools/list"}"#);
        assert_eq!(complete(parser.next_frame())["id"], json!(11));
    }

    #[test]
    fn test_encode_frame_length_is_exact() {
        let frame = encode_frame(&json!({"id": 1, "result": {"text": "caf\u{e9}"}})).unwrap();
        let text = String::from_utf8(frame).unwrap();
        let (header, body) = text.split_once("\r\n\r\n").unwrap();

        let declared: usize = header
            .strip_prefix("Content-Length: ")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(declared, body.len());
    }
}
