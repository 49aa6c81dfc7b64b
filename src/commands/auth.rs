//! Authorization Gate
//!
//! [`authorized`] wraps a command so it only runs for callers holding one of
//! the policy's roles. A refused caller sees one of two things:
//!
//! ```text
//! caller has role?  ── yes ──> inner command runs, reply passed through
//!        │
//!        no
//!        ├── inner is secret ──> UnknownCommand   (command stays hidden)
//!        └── otherwise       ──> PermissionDenied
//! ```

use crate::commands::command::{Action, Command, CommandError, CommandResult, Context};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The set of role names allowed through the gate, stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    roles: BTreeSet<String>,
}

impl AuthorizationPolicy {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|r| r.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether any of `roles` (compared case-insensitively) is authorized.
    pub fn permits<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles
            .iter()
            .any(|r| self.roles.contains(&r.as_ref().to_lowercase()))
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

struct Authorized {
    inner: Arc<Command>,
    policy: AuthorizationPolicy,
}

#[async_trait]
impl Action for Authorized {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        let author = &cx.message().author;
        if self.policy.permits(&author.roles) {
            return self.inner.invoke(cx).await;
        }

        tracing::debug!(
            command = self.inner.name(),
            author = %author,
            "Caller lacks an authorized role"
        );
        if self.inner.is_secret() {
            Err(CommandError::UnknownCommand(cx.invocation.command.clone()))
        } else {
            Err(CommandError::PermissionDenied(self.inner.name().to_string()))
        }
    }
}

/// Gates `command` behind `policy`, keeping its name, description and secrecy.
pub fn authorized(command: Command, policy: AuthorizationPolicy) -> Command {
    let name = command.name().to_string();
    let description = command.description().to_string();
    let secret = command.is_secret();

    Command::from_parts(
        name,
        description,
        secret,
        Arc::new(Authorized {
            inner: Arc::new(command),
            policy,
        }),
    )
}
