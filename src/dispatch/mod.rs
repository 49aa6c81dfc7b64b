//! Dispatch Module
//!
//! Decides whether a message is a command, finds the command and runs it,
//! turning every kind of result into exactly one chat reply.
//!
//! ## Modules
//!
//! - `parser`: trigger detection and token splitting
//! - `dispatcher`: resolution, fault isolation and reply rendering

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{Dispatcher, Outcome, FAILURE_REPLY, PERMISSION_DENIED_REPLY};
pub use parser::{parse_command, split_first_word, ParsedCommand};
