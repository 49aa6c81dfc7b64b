//! Relay Connection Module
//!
//! This module manages the bot's connection to its chat relay. The read loop
//! runs on the session's own task; every chat message is dispatched on a
//! separate task so a slow command never stalls the connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Parse frame │───>│ Handle frame│      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │ MESSAGE     │
//! │                                               ▼             │
//! │                                      ┌─────────────────┐    │
//! │                                      │ Dispatcher task │    │
//! │                                      └────────┬────────┘    │
//! │                                               │             │
//! │  ┌─────────────┐    ┌─────────────┐           │             │
//! │  │ Writer task │<───│ RelayClient │<──────────┘             │
//! │  └─────────────┘    └─────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pimobot::{BotConfig, Dispatcher, Registry, Session, SessionStats};
//! use std::sync::Arc;
//!
//! let config = Arc::new(BotConfig::default());
//! let registry = Arc::new(Registry::builtin(&config)?);
//! let dispatcher = Dispatcher::new(registry, &config);
//! let stats = Arc::new(SessionStats::new());
//!
//! let session = Session::connect("127.0.0.1:7878", "token", dispatcher, config, stats).await?;
//! session.run().await?;
//! ```

pub mod session;

// Re-export commonly used types
pub use session::{RelayClient, Session, SessionError, SessionStats, STARTUP_ANNOUNCEMENT};
