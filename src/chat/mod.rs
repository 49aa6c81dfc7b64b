//! Chat Module
//!
//! The bot's view of the chat service: who is talking, in which channel, and
//! the one capability it needs from the outside world, [`ChatClient`].
//!
//! ## Modules
//!
//! - `types`: `Author`, `Channel` and `Message`
//! - `client`: the `ChatClient` trait and the in-memory `MemoryClient`

pub mod client;
pub mod types;

pub use client::{ChatClient, ClientError, MemoryClient, SentMessage};
pub use types::{Author, Channel, Message};
