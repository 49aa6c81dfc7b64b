//! Relay Protocol Frames
//!
//! This module defines the frames exchanged with the chat relay and how they
//! are written to the wire.
//!
//! ## Protocol Format
//!
//! Every frame starts with a keyword and a few space-separated fields, and the
//! header line ends with CRLF (`\r\n`). Fields never contain whitespace.
//! Frames that carry free text end their header with the text's byte length,
//! followed by the text itself and another CRLF, so the text may contain
//! anything, newlines included.
//!
//! ## Examples
//!
//! Ready: `READY 900 pimobot#0042\r\n`
//! Channel: `CHANNEL 11 bot-testing\r\n`
//! Message: `MESSAGE 10 42 sailor#1234 @staff,@everyone 5\r\n!roll\r\n`
//! Send: `SEND 10 7 9\r\n4 rolled!\r\n`
//! Delete: `DELETE 10 7\r\n`

use std::fmt;

/// The CRLF terminator used by the relay protocol
pub const CRLF: &[u8] = b"\r\n";

/// Placeholder for an empty role list
pub const NO_ROLES: &str = "-";

/// Frame keywords
pub mod keyword {
    // relay -> bot
    pub const READY: &str = "READY";
    pub const CHANNEL: &str = "CHANNEL";
    pub const JOIN: &str = "JOIN";
    pub const MESSAGE: &str = "MESSAGE";
    pub const PING: &str = "PING";
    pub const ERROR: &str = "ERROR";

    // bot -> relay
    pub const IDENTIFY: &str = "IDENTIFY";
    pub const SEND: &str = "SEND";
    pub const DELETE: &str = "DELETE";
    pub const PONG: &str = "PONG";
}

/// A single relay protocol frame.
///
/// The same type is used in both directions, so a test relay can parse what
/// the bot writes with the bot's own parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The relay accepted the bot and tells it who it is.
    /// Format: `READY <user-id> <user-name>`
    Ready { user_id: String, user_name: String },

    /// A channel exists on the server.
    /// Format: `CHANNEL <channel-id> <channel-name>`
    Channel { id: String, name: String },

    /// Someone joined the server.
    /// Format: `JOIN <user-id> <user-name>`
    Join { user_id: String, user_name: String },

    /// A chat message was posted.
    /// Format: `MESSAGE <channel-id> <author-id> <author-name> <roles> <len>\r\n<text>`
    Message {
        channel_id: String,
        author_id: String,
        author_name: String,
        roles: Vec<String>,
        text: String,
    },

    /// Liveness check from the relay.
    /// Format: `PING <token>`
    Ping { token: String },

    /// The relay reports a problem; the rest of the line is free text.
    /// Format: `ERROR <reason>`
    Error { reason: String },

    /// Authenticates the bot.
    /// Format: `IDENTIFY <credential>`
    Identify { credential: String },

    /// Posts a message; `message_id` is chosen by the bot.
    /// Format: `SEND <channel-id> <message-id> <len>\r\n<text>`
    Send {
        channel_id: String,
        message_id: u64,
        text: String,
    },

    /// Removes a message the bot sent earlier.
    /// Format: `DELETE <channel-id> <message-id>`
    Delete { channel_id: String, message_id: u64 },

    /// Answer to a `PING`.
    /// Format: `PONG <token>`
    Pong { token: String },
}

/// Whether `s` can be carried as a single header field.
pub fn is_field(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

impl Frame {
    /// Convenience constructor for an outgoing message.
    pub fn send(channel_id: impl Into<String>, message_id: u64, text: impl Into<String>) -> Self {
        Frame::Send {
            channel_id: channel_id.into(),
            message_id,
            text: text.into(),
        }
    }

    /// The frame's keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Frame::Ready { .. } => keyword::READY,
            Frame::Channel { .. } => keyword::CHANNEL,
            Frame::Join { .. } => keyword::JOIN,
            Frame::Message { .. } => keyword::MESSAGE,
            Frame::Ping { .. } => keyword::PING,
            Frame::Error { .. } => keyword::ERROR,
            Frame::Identify { .. } => keyword::IDENTIFY,
            Frame::Send { .. } => keyword::SEND,
            Frame::Delete { .. } => keyword::DELETE,
            Frame::Pong { .. } => keyword::PONG,
        }
    }

    /// Serializes the frame to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the frame into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        let header = |buf: &mut Vec<u8>, fields: &[&str]| {
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                buf.extend_from_slice(field.as_bytes());
            }
            buf.extend_from_slice(CRLF);
        };
        let payload = |buf: &mut Vec<u8>, text: &str| {
            buf.extend_from_slice(text.as_bytes());
            buf.extend_from_slice(CRLF);
        };

        match self {
            Frame::Ready { user_id, user_name } => {
                header(buf, &[keyword::READY, user_id, user_name])
            }
            Frame::Channel { id, name } => header(buf, &[keyword::CHANNEL, id, name]),
            Frame::Join { user_id, user_name } => header(buf, &[keyword::JOIN, user_id, user_name]),
            Frame::Message {
                channel_id,
                author_id,
                author_name,
                roles,
                text,
            } => {
                let roles = if roles.is_empty() {
                    NO_ROLES.to_string()
                } else {
                    roles.join(",")
                };
                let len = text.len().to_string();
                header(
                    buf,
                    &[keyword::MESSAGE, channel_id, author_id, author_name, &roles, &len],
                );
                payload(buf, text);
            }
            Frame::Ping { token } => header(buf, &[keyword::PING, token]),
            Frame::Error { reason } => header(buf, &[keyword::ERROR, reason]),
            Frame::Identify { credential } => header(buf, &[keyword::IDENTIFY, credential]),
            Frame::Send {
                channel_id,
                message_id,
                text,
            } => {
                let id = message_id.to_string();
                let len = text.len().to_string();
                header(buf, &[keyword::SEND, channel_id, &id, &len]);
                payload(buf, text);
            }
            Frame::Delete {
                channel_id,
                message_id,
            } => {
                let id = message_id.to_string();
                header(buf, &[keyword::DELETE, channel_id, &id]);
            }
            Frame::Pong { token } => header(buf, &[keyword::PONG, token]),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Message {
                channel_id,
                author_name,
                text,
                ..
            } => write!(f, "MESSAGE {} from {} ({} bytes)", channel_id, author_name, text.len()),
            Frame::Send {
                channel_id,
                message_id,
                text,
            } => write!(f, "SEND {} #{} ({} bytes)", channel_id, message_id, text.len()),
            // Never log the credential.
            Frame::Identify { .. } => f.write_str("IDENTIFY <redacted>"),
            other => {
                let wire = other.serialize();
                let line = String::from_utf8_lossy(&wire);
                f.write_str(line.trim_end())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_header_frames() {
        let cases = [
            (
                Frame::Ready {
                    user_id: "900".into(),
                    user_name: "pimobot#0042".into(),
                },
                &b"READY 900 pimobot#0042\r\n"[..],
            ),
            (
                Frame::Channel {
                    id: "11".into(),
                    name: "bot-testing".into(),
                },
                &b"CHANNEL 11 bot-testing\r\n"[..],
            ),
            (
                Frame::Delete {
                    channel_id: "10".into(),
                    message_id: 7,
                },
                &b"DELETE 10 7\r\n"[..],
            ),
            (Frame::Pong { token: "abc".into() }, &b"PONG abc\r\n"[..]),
            (
                Frame::Error {
                    reason: "bad credential".into(),
                },
                &b"ERROR bad credential\r\n"[..],
            ),
        ];

        for (frame, wire) in cases {
            assert_eq!(frame.serialize(), wire, "{:?}", frame);
        }
    }

    #[test]
    fn test_serialize_send_counts_bytes() {
        let frame = Frame::send("10", 3, "Ahoy ☠");
        assert_eq!(frame.serialize(), "SEND 10 3 8\r\nAhoy ☠\r\n".as_bytes());
    }

    #[test]
    fn test_serialize_message_roles() {
        let frame = Frame::Message {
            channel_id: "10".into(),
            author_id: "42".into(),
            author_name: "sailor#1234".into(),
            roles: vec![],
            text: "!roll".into(),
        };
        assert_eq!(frame.serialize(), b"MESSAGE 10 42 sailor#1234 - 5\r\n!roll\r\n");

        let frame = Frame::Message {
            channel_id: "10".into(),
            author_id: "42".into(),
            author_name: "sailor#1234".into(),
            roles: vec!["@staff".into(), "@everyone".into()],
            text: "!roll".into(),
        };
        assert!(frame.serialize().starts_with(b"MESSAGE 10 42 sailor#1234 @staff,@everyone 5\r\n"));
    }

    #[test]
    fn test_display_redacts_credential() {
        let frame = Frame::Identify {
            credential: "hunter2".into(),
        };
        assert!(!frame.to_string().contains("hunter2"));
        assert_eq!(Frame::Pong { token: "t".into() }.to_string(), "PONG t");
    }

    #[test]
    fn test_keyword_leads_the_header() {
        let frames = [
            Frame::Ping { token: "1".into() },
            Frame::send("10", 1, "hi"),
            Frame::Delete {
                channel_id: "10".into(),
                message_id: 1,
            },
            Frame::Identify {
                credential: "secret".into(),
            },
        ];
        for frame in frames {
            let wire = frame.serialize();
            assert!(wire.starts_with(format!("{} ", frame.keyword()).as_bytes()));
        }
    }

    #[test]
    fn test_is_field() {
        assert!(is_field("bot-testing"));
        assert!(!is_field(""));
        assert!(!is_field("two words"));
    }
}
