//! Commands, Actions and Replies
//!
//! A [`Command`] is the unit the registry stores: a name, help text, the
//! secret flag and an [`Action`] that does the actual work. Actions never send
//! anything themselves. They return a [`Reply`] and the dispatcher delivers it,
//! which keeps every handler a plain async function of its input.

use crate::chat::Message;
use crate::commands::registry::Registry;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a command invocation can end with.
///
/// `UnknownCommand` and `PermissionDenied` are ordinary, user-facing outcomes.
/// Everything else is a fault the dispatcher reports generically.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No such command, or a secret command refusing to admit it exists
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The caller lacks a role required by the command
    #[error("permission denied for '{0}'")]
    PermissionDenied(String),

    /// The handler did not finish in time
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The handler failed for any other reason
    #[error("command failed: {0}")]
    Failed(String),
}

/// Result type for command invocations.
pub type CommandResult = Result<Reply, CommandError>;

/// The text a command answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Destination channel id; `None` answers in the invoking channel
    pub channel: Option<String>,
    pub text: String,
}

impl Reply {
    /// A reply in the channel the command came from.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            channel: None,
            text: text.into(),
        }
    }

    /// A reply sent to a specific channel.
    pub fn to(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: Some(channel_id.into()),
            text: text.into(),
        }
    }
}

/// One parsed command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The message that triggered it
    pub message: Message,
    /// Lower-cased command token, trigger stripped
    pub command: String,
    /// Everything after the token, leading whitespace removed (may be empty)
    pub rest: String,
}

impl Invocation {
    pub fn new(message: Message, command: impl Into<String>, rest: impl Into<String>) -> Self {
        Self {
            message,
            command: command.into(),
            rest: rest.into(),
        }
    }

    /// The whitespace-separated arguments after the command token.
    pub fn args(&self) -> Vec<&str> {
        self.rest.split_whitespace().collect()
    }
}

/// What an action gets to look at while it runs.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub invocation: &'a Invocation,
    pub registry: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(invocation: &'a Invocation, registry: &'a Registry) -> Self {
        Self {
            invocation,
            registry,
        }
    }

    pub fn message(&self) -> &'a Message {
        &self.invocation.message
    }
}

/// The behaviour behind a command.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, cx: &Context<'_>) -> CommandResult;
}

/// A named, documented bot command.
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    secret: bool,
    action: Arc<dyn Action>,
}

impl Command {
    /// Creates a visible command.
    ///
    /// The first line of `description` is the summary shown in `!help`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        action: impl Action + 'static,
    ) -> Self {
        Self::from_parts(name, description, false, Arc::new(action))
    }

    pub(crate) fn from_parts(
        name: impl Into<String>,
        description: impl Into<String>,
        secret: bool,
        action: Arc<dyn Action>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            secret,
            action,
        }
    }

    /// Marks the command as secret: hidden from `!help`, and indistinguishable
    /// from a nonexistent command when it refuses to run.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// First line of the description.
    pub fn summary(&self) -> &str {
        self.description.lines().next().unwrap_or("")
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Runs the command's action.
    pub async fn invoke(&self, cx: &Context<'_>) -> CommandResult {
        self.action.run(cx).await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}
