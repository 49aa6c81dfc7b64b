//! # pimobot - A Chat Server Command Bot
//!
//! pimobot watches the messages of a chat server and answers the ones that
//! start with the command trigger (`!` by default). It greets, rolls dice,
//! picks between options, adds numbers, hands out links, and lets staff make
//! it speak in other channels.
//!
//! ## Features
//!
//! - **Command Registry**: Commands with synonyms, case-insensitive lookup
//! - **Secret Commands**: Hidden from help and indistinguishable from typos
//! - **Role Gating**: Commands restricted to holders of authorized roles
//! - **Fault Isolation**: Every command runs in its own task under a timeout
//! - **Async I/O**: Built on Tokio, talking to the chat server through a relay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              pimobot                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Relay     │───>│   Session   │───>│ Dispatcher  │                  │
//! │  │ (TCP peer)  │    │ (read loop) │    │ (per task)  │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │         ▲                  │                  │                         │
//! │         │                  ▼                  ▼                         │
//! │  ┌──────┴──────┐    ┌─────────────┐    ┌──────────────────────────────┐ │
//! │  │ Writer task │<───│ RelayClient │<───│          Registry            │ │
//! │  └─────────────┘    └─────────────┘    │ ┌──────┐ ┌──────┐ ┌────────┐ │ │
//! │                                        │ │ help │ │ roll │ │say(gated)│ │
//! │                                        │ └──────┘ └──────┘ └────────┘ │ │
//! │                                        └──────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use pimobot::{BotConfig, Dispatcher, Registry, Session, SessionStats};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(BotConfig::default());
//!     let registry = Arc::new(Registry::builtin(&config)?);
//!     let dispatcher = Dispatcher::new(registry, &config);
//!     let stats = Arc::new(SessionStats::new());
//!
//!     let session = Session::connect("127.0.0.1:7878", "token", dispatcher, config, stats).await?;
//!     session.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Built-in Commands
//!
//! - `help [command]` / `about` - command overview or one command's description
//! - `hello` / `hi`, `goodbye` / `bye` - greetings
//! - `version`, `code` / `source` - bot version and source link
//! - `roll` - a six-sided die
//! - `choose a b c` - picks one option
//! - `add 1 2 3.5` - sums numbers
//! - `link [name]` - useful Pimoroni links
//! - `checkauth`, `say [channel] text` - role gated
//!
//! ## Module Overview
//!
//! - [`chat`]: Chat-domain types and the `ChatClient` capability
//! - [`commands`]: Commands, the registry, the authorization gate, built-ins
//! - [`dispatch`]: Trigger parsing and the dispatcher
//! - [`protocol`]: Relay wire protocol
//! - [`connection`]: The relay session
//! - [`config`]: Bot configuration

pub mod chat;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod protocol;

// Re-export commonly used types for convenience
pub use chat::{Author, Channel, ChatClient, ClientError, MemoryClient, Message};
pub use commands::{Command, CommandError, Registry, RegistryError, Reply};
pub use config::BotConfig;
pub use connection::{RelayClient, Session, SessionError, SessionStats};
pub use dispatch::{Dispatcher, Outcome};
pub use protocol::{Frame, FrameParser, ParseError};

/// The default port of the chat relay
pub const DEFAULT_PORT: u16 = 7878;

/// The default host of the chat relay
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The character that marks a message as a command
pub const DEFAULT_TRIGGER: char = '!';

/// Version of pimobot
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
