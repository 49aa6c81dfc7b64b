//! Relay Protocol Implementation
//!
//! This module implements the line-oriented protocol the bot speaks with its
//! chat relay.
//!
//! ## Overview
//!
//! The relay owns the actual chat service connection and forwards server
//! events (ready, channel roster, joins, messages) to the bot as frames. The
//! bot answers with frames of its own (identify, send, delete, pong).
//!
//! ## Modules
//!
//! - `types`: Defines the `Frame` enum and serialization
//! - `parser`: Incremental parser for incoming frames
//!
//! ## Example
//!
//! ```
//! use pimobot::protocol::{parse_frame, Frame};
//!
//! // Parsing incoming data
//! let data = b"MESSAGE 10 42 sailor#1234 - 5\r\n!roll\r\n";
//! let (frame, consumed) = parse_frame(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! // Creating outgoing frames
//! let reply = Frame::send("10", 1, "4 rolled!");
//! let bytes = reply.serialize();
//! assert!(bytes.starts_with(b"SEND 10 1 9\r\n"));
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_frame, FrameParser, ParseError, ParseResult};
pub use types::Frame;
