//! Command Dispatcher
//!
//! Takes one incoming message from start to finish:
//!
//! ```text
//! Message
//!    │  parse_command()        not a command ──> Ignored (no reply)
//!    ▼
//! Registry::resolve()          miss ──> "I don't know that command" ──> Unknown
//!    │
//!    ▼
//! spawn + timeout ──> Command::invoke()
//!    │
//!    ├── Ok(reply)             ──> reply text ──────────────> Handled
//!    ├── UnknownCommand        ──> "I don't know that command" ──> Unknown
//!    ├── PermissionDenied      ──> "You do not have permission" ──> Denied
//!    └── anything else / panic / timeout
//!                              ──> generic apology (logged) ──> Failed
//! ```
//!
//! Each invocation runs in its own Tokio task, so a handler that panics or
//! hangs costs one reply and nothing else.

use crate::chat::{ChatClient, Message};
use crate::commands::{Command, CommandError, CommandResult, Context, Invocation, Registry};
use crate::config::BotConfig;
use crate::dispatch::parser::parse_command;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Reply for callers lacking a required role on a visible command.
pub const PERMISSION_DENIED_REPLY: &str = "You do not have permission to use this command.";

/// Reply when a handler fails, panics or times out.
pub const FAILURE_REPLY: &str = "Something went wrong running that command, sorry.";

/// How a dispatched message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command; nothing was sent
    Ignored,
    /// A command ran and its reply was sent
    Handled,
    /// The command does not exist (or is secret and refused)
    Unknown,
    /// The caller is not authorized for a visible command
    Denied,
    /// The handler failed; a generic apology was sent
    Failed,
}

/// Routes command messages to registered handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    trigger: char,
    timeout: Duration,
    unknown_reply: String,
}

impl Dispatcher {
    /// Creates a dispatcher over a fully built registry.
    pub fn new(registry: Arc<Registry>, config: &BotConfig) -> Self {
        Self {
            registry,
            trigger: config.trigger,
            timeout: config.handler_timeout,
            unknown_reply: config.unknown_command_reply(),
        }
    }

    /// Handles one message, sending at most one reply through `client`.
    pub async fn dispatch(&self, client: &dyn ChatClient, message: &Message) -> Outcome {
        let parsed = match parse_command(&message.text, self.trigger) {
            Some(parsed) => parsed,
            None => return Outcome::Ignored,
        };

        let command = match self.registry.resolve(&parsed.token) {
            Ok(command) => command,
            Err(_) => {
                debug!(command = %parsed.token, author = %message.author, "Unknown command");
                self.send(client, &message.channel.id, &self.unknown_reply)
                    .await;
                return Outcome::Unknown;
            }
        };

        info!(
            command = command.name(),
            author = %message.author,
            channel = %message.channel.name,
            "Dispatching command"
        );

        let invocation = Invocation::new(message.clone(), parsed.token, parsed.rest);
        let (outcome, channel, text) = match self.invoke(command, invocation).await {
            Ok(reply) => (
                Outcome::Handled,
                reply.channel.unwrap_or_else(|| message.channel.id.clone()),
                reply.text,
            ),
            Err(CommandError::UnknownCommand(_)) => (
                Outcome::Unknown,
                message.channel.id.clone(),
                self.unknown_reply.clone(),
            ),
            Err(CommandError::PermissionDenied(name)) => {
                debug!(command = %name, author = %message.author, "Permission denied");
                (
                    Outcome::Denied,
                    message.channel.id.clone(),
                    PERMISSION_DENIED_REPLY.to_string(),
                )
            }
            Err(e) => {
                error!(text = %message.text, error = %e, "Command failed");
                (
                    Outcome::Failed,
                    message.channel.id.clone(),
                    FAILURE_REPLY.to_string(),
                )
            }
        };

        self.send(client, &channel, &text).await;
        outcome
    }

    /// Runs the command in its own task, bounded by the handler timeout.
    async fn invoke(&self, command: Arc<Command>, invocation: Invocation) -> CommandResult {
        let registry = Arc::clone(&self.registry);
        let mut task = tokio::spawn(async move {
            let cx = Context::new(&invocation, &registry);
            command.invoke(&cx).await
        });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(CommandError::Failed(format!(
                "handler task ended abnormally: {}",
                join_error
            ))),
            Err(_) => {
                task.abort();
                Err(CommandError::Timeout(self.timeout))
            }
        }
    }

    async fn send(&self, client: &dyn ChatClient, channel_id: &str, text: &str) {
        if let Err(e) = client.send_message(channel_id, text).await {
            warn!(channel = %channel_id, error = %e, "Failed to send reply");
        }
    }
}
