//! Incremental Relay Frame Parser
//!
//! This module parses relay frames out of a byte buffer that may hold a
//! partial frame, exactly one frame, or several frames back to back.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((frame, consumed)))` - Parsed a frame, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the frame is incomplete
//! - `Err(ParseError)` - Invalid protocol data
//!
//! The caller appends network data to its buffer, calls `parse()`, advances the
//! buffer by `consumed` on success, and reads more on `None`.

use crate::protocol::types::{keyword, Frame, NO_ROLES};
use thiserror::Error;

/// Errors that can occur during frame parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A header line with nothing on it
    #[error("empty frame")]
    EmptyFrame,

    /// The keyword is not part of the protocol
    #[error("unknown frame keyword: {0}")]
    UnknownKeyword(String),

    /// The header has the wrong number of fields
    #[error("{keyword} expects {expected} fields, got {found}")]
    WrongFieldCount {
        keyword: String,
        expected: usize,
        found: usize,
    },

    /// A numeric field failed to parse
    #[error("invalid number in {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    /// Header or payload is not UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The frame exceeds a size limit
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum length of a header line (4 KB)
pub const MAX_HEADER_SIZE: usize = 4 * 1024;

/// Maximum length of a text payload (64 KB)
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// An incremental relay frame parser.
///
/// # Example
///
/// ```
/// use pimobot::protocol::{FrameParser, Frame};
///
/// let mut parser = FrameParser::new();
/// let (frame, consumed) = parser.parse(b"PING 17\r\n").unwrap().unwrap();
/// assert_eq!(frame, Frame::Ping { token: "17".to_string() });
/// assert_eq!(consumed, 9);
/// ```
#[derive(Debug)]
pub struct FrameParser {
    max_header: usize,
    max_payload: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Creates a parser with the default size limits.
    pub fn new() -> Self {
        Self {
            max_header: MAX_HEADER_SIZE,
            max_payload: MAX_PAYLOAD_SIZE,
        }
    }

    /// Overrides the payload size limit.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Attempts to parse one frame from the start of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        let line_end = match find_crlf(buf) {
            Some(pos) => pos,
            None if buf.len() > self.max_header => {
                return Err(ParseError::FrameTooLarge {
                    size: buf.len(),
                    max: self.max_header,
                })
            }
            None => return Ok(None),
        };
        if line_end > self.max_header {
            return Err(ParseError::FrameTooLarge {
                size: line_end,
                max: self.max_header,
            });
        }

        let line = std::str::from_utf8(&buf[..line_end])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        let header_len = line_end + 2;

        let (word, rest) = match line.split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (line, ""),
        };
        if word.is_empty() {
            return Err(ParseError::EmptyFrame);
        }

        // ERROR carries free text up to the end of the line.
        if word == keyword::ERROR {
            let frame = Frame::Error {
                reason: rest.trim().to_string(),
            };
            return Ok(Some((frame, header_len)));
        }

        let fields: Vec<&str> = rest.split_ascii_whitespace().collect();
        let frame = match word {
            keyword::READY => {
                let [user_id, user_name] = expect_fields(word, &fields)?;
                Frame::Ready { user_id, user_name }
            }
            keyword::CHANNEL => {
                let [id, name] = expect_fields(word, &fields)?;
                Frame::Channel { id, name }
            }
            keyword::JOIN => {
                let [user_id, user_name] = expect_fields(word, &fields)?;
                Frame::Join { user_id, user_name }
            }
            keyword::PING => {
                let [token] = expect_fields(word, &fields)?;
                Frame::Ping { token }
            }
            keyword::PONG => {
                let [token] = expect_fields(word, &fields)?;
                Frame::Pong { token }
            }
            keyword::IDENTIFY => {
                let [credential] = expect_fields(word, &fields)?;
                Frame::Identify { credential }
            }
            keyword::DELETE => {
                let [channel_id, message_id] = expect_fields(word, &fields)?;
                Frame::Delete {
                    channel_id,
                    message_id: parse_number("message-id", &message_id)?,
                }
            }
            keyword::MESSAGE => {
                let [channel_id, author_id, author_name, roles, len] =
                    expect_fields(word, &fields)?;
                let len = parse_number("length", &len)? as usize;
                let (text, consumed) = match self.parse_payload(buf, header_len, len)? {
                    Some(payload) => payload,
                    None => return Ok(None),
                };
                let frame = Frame::Message {
                    channel_id,
                    author_id,
                    author_name,
                    roles: parse_roles(&roles),
                    text,
                };
                return Ok(Some((frame, consumed)));
            }
            keyword::SEND => {
                let [channel_id, message_id, len] = expect_fields(word, &fields)?;
                let message_id = parse_number("message-id", &message_id)?;
                let len = parse_number("length", &len)? as usize;
                let (text, consumed) = match self.parse_payload(buf, header_len, len)? {
                    Some(payload) => payload,
                    None => return Ok(None),
                };
                let frame = Frame::Send {
                    channel_id,
                    message_id,
                    text,
                };
                return Ok(Some((frame, consumed)));
            }
            other => return Err(ParseError::UnknownKeyword(other.to_string())),
        };

        Ok(Some((frame, header_len)))
    }

    /// Reads a `len`-byte payload starting at `start`, plus its CRLF.
    fn parse_payload(
        &self,
        buf: &[u8],
        start: usize,
        len: usize,
    ) -> ParseResult<Option<(String, usize)>> {
        if len > self.max_payload {
            return Err(ParseError::FrameTooLarge {
                size: len,
                max: self.max_payload,
            });
        }

        let end = start + len;
        if buf.len() < end + 2 {
            return Ok(None);
        }
        if &buf[end..end + 2] != b"\r\n" {
            return Err(ParseError::ProtocolError(
                "expected CRLF after payload".to_string(),
            ));
        }

        let text = std::str::from_utf8(&buf[start..end])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        Ok(Some((text.to_string(), end + 2)))
    }
}

/// Parses a single frame using a fresh parser.
pub fn parse_frame(buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
    FrameParser::new().parse(buf)
}

fn expect_fields<const N: usize>(keyword: &str, fields: &[&str]) -> ParseResult<[String; N]> {
    if fields.len() != N {
        return Err(ParseError::WrongFieldCount {
            keyword: keyword.to_string(),
            expected: N,
            found: fields.len(),
        });
    }
    Ok(std::array::from_fn(|i| fields[i].to_string()))
}

fn parse_number(field: &'static str, value: &str) -> ParseResult<u64> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_roles(roles: &str) -> Vec<String> {
    if roles == NO_ROLES {
        return Vec::new();
    }
    roles
        .split(',')
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the position of the first CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ping() {
        let (frame, consumed) = parse_frame(b"PING abc\r\n").unwrap().unwrap();
        assert_eq!(frame, Frame::Ping { token: "abc".into() });
        assert_eq!(consumed, 10);
    }

    #[test]
    fn test_parse_incomplete_header() {
        assert!(parse_frame(b"READY 900 pimo").unwrap().is_none());
        assert!(parse_frame(b"").unwrap().is_none());
        assert!(parse_frame(b"PING abc\r").unwrap().is_none());
    }

    #[test]
    fn test_parse_ready_and_channel() {
        let (frame, _) = parse_frame(b"READY 900 pimobot#0042\r\n").unwrap().unwrap();
        assert_eq!(
            frame,
            Frame::Ready {
                user_id: "900".into(),
                user_name: "pimobot#0042".into()
            }
        );

        let (frame, _) = parse_frame(b"CHANNEL 11 bot-testing\r\n").unwrap().unwrap();
        assert_eq!(
            frame,
            Frame::Channel {
                id: "11".into(),
                name: "bot-testing".into()
            }
        );
    }

    #[test]
    fn test_parse_message() {
        let input = b"MESSAGE 10 42 sailor#1234 @staff,@everyone 14\r\n!say hi\r\nthere\r\n";
        let (frame, consumed) = parse_frame(input).unwrap().unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(
            frame,
            Frame::Message {
                channel_id: "10".into(),
                author_id: "42".into(),
                author_name: "sailor#1234".into(),
                roles: vec!["@staff".into(), "@everyone".into()],
                text: "!say hi\r\nthere".into(),
            }
        );
    }

    #[test]
    fn test_parse_message_without_roles() {
        let (frame, _) = parse_frame(b"MESSAGE 10 42 sailor - 5\r\n!roll\r\n")
            .unwrap()
            .unwrap();
        match frame {
            Frame::Message { roles, text, .. } => {
                assert!(roles.is_empty());
                assert_eq!(text, "!roll");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_parse_payload_incomplete() {
        assert!(parse_frame(b"MESSAGE 10 42 sailor - 5\r\n!ro")
            .unwrap()
            .is_none());
        assert!(parse_frame(b"SEND 10 1 5\r\n!roll").unwrap().is_none());
    }

    #[test]
    fn test_parse_payload_missing_crlf() {
        assert!(matches!(
            parse_frame(b"SEND 10 1 2\r\nabcd\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_parse_send_and_delete() {
        let (frame, _) = parse_frame(b"SEND 10 7 9\r\n4 rolled!\r\n").unwrap().unwrap();
        assert_eq!(frame, Frame::send("10", 7, "4 rolled!"));

        let (frame, _) = parse_frame(b"DELETE 10 7\r\n").unwrap().unwrap();
        assert_eq!(
            frame,
            Frame::Delete {
                channel_id: "10".into(),
                message_id: 7
            }
        );
    }

    #[test]
    fn test_parse_error_keeps_free_text() {
        let (frame, _) = parse_frame(b"ERROR bad credential, goodbye\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            frame,
            Frame::Error {
                reason: "bad credential, goodbye".into()
            }
        );
    }

    #[test]
    fn test_parse_multiple_frames() {
        let input = b"CHANNEL 10 general\r\nPING 1\r\n";
        let mut parser = FrameParser::new();

        let (first, consumed) = parser.parse(input).unwrap().unwrap();
        assert!(matches!(first, Frame::Channel { .. }));

        let (second, rest) = parser.parse(&input[consumed..]).unwrap().unwrap();
        assert_eq!(second, Frame::Ping { token: "1".into() });
        assert_eq!(consumed + rest, input.len());
    }

    #[test]
    fn test_parse_rejects_bad_frames() {
        assert!(matches!(
            parse_frame(b"HELLO there\r\n"),
            Err(ParseError::UnknownKeyword(_))
        ));
        assert!(matches!(
            parse_frame(b"PING\r\n"),
            Err(ParseError::WrongFieldCount { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            parse_frame(b"DELETE 10 seven\r\n"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(parse_frame(b"\r\n"), Err(ParseError::EmptyFrame)));
        assert!(matches!(
            parse_frame(b"SEND 10 1 2\r\n\xff\xfe\r\n"),
            Err(ParseError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_parse_size_limits() {
        let long = vec![b'A'; MAX_HEADER_SIZE + 1];
        assert!(matches!(
            parse_frame(&long),
            Err(ParseError::FrameTooLarge { .. })
        ));

        let mut parser = FrameParser::new().with_max_payload(4);
        assert!(matches!(
            parser.parse(b"SEND 10 1 5\r\nhello\r\n"),
            Err(ParseError::FrameTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_serialized_frames_parse_back() {
        let frames = [
            Frame::send("10", 1, "multi\nline\r\nreply"),
            Frame::Identify {
                credential: "secret-token".into(),
            },
            Frame::Join {
                user_id: "5".into(),
                user_name: "newbie#0005".into(),
            },
        ];
        for frame in frames {
            let wire = frame.serialize();
            let (parsed, consumed) = parse_frame(&wire).unwrap().unwrap();
            assert_eq!(parsed, frame);
            assert_eq!(consumed, wire.len());
        }
    }
}
