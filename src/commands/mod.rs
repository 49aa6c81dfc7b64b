//! Commands Module
//!
//! Everything that defines what the bot can do: the command type, the registry
//! that names commands, the authorization gate and the built-in command set.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Registry                          │
//! │                                                          │
//! │   primary names                 synonyms                 │
//! │   "help" ──┐                    "about" ──┐              │
//! │   "add"  ──┼──> Arc<Command>    "sum"   ──┼──> (same)    │
//! │   "say"  ──┘        │                     ┘              │
//! │                     ▼                                    │
//! │        name · description · secret · Action              │
//! │                                   │                      │
//! │                 (gated commands)  ▼                      │
//! │                        Authorized { inner, policy }      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `command`: `Command`, `Action`, `Reply`, `Invocation`, `CommandError`
//! - `registry`: name/synonym lookup
//! - `auth`: role-based authorization wrapper
//! - `builtin`: the commands the bot ships with

pub mod auth;
pub mod builtin;
pub mod command;
pub mod registry;

// Re-export the types most callers need
pub use auth::{authorized, AuthorizationPolicy};
pub use command::{
    Action, Command, CommandError, CommandResult, Context, Invocation, Reply,
};
pub use registry::{Registry, RegistryError};
