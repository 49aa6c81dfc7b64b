//! Bot Configuration
//!
//! All tunables of the bot live in [`BotConfig`]. The defaults reproduce the
//! behaviour of the bot running on the Pimoroni server; the binary overrides
//! them from the command line.

use std::time::Duration;

/// Roles allowed to run gated commands such as `say` and `checkauth`.
pub const DEFAULT_AUTHORIZED_ROLES: &[&str] = &["@swashbucklers", "@staff"];

/// The only user `sudo make me a sandwich` actually works for.
pub const DEFAULT_SANDWICH_OWNER: &str = "Ryanteck#1989";

/// Where `!code` points people.
pub const DEFAULT_SOURCE_URL: &str = "https://github.com/Ariz/pimobot";

/// Configuration for a bot instance.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Leading character that marks a message as a command
    pub trigger: char,

    /// Version string reported by `!version` and `!help`
    pub version: String,

    /// Source link reported by `!code` and `!help`
    pub source_url: String,

    /// Role names (case-insensitive) that pass the authorization gate
    pub authorized_roles: Vec<String>,

    /// Display identity that `sudo` obeys
    pub sandwich_owner: String,

    /// Human-readable server name used in the welcome message
    pub server_name: String,

    /// Channel id new members are welcomed in, if any
    pub welcome_channel: Option<String>,

    /// How long the welcome message stays up (default: 5s)
    pub welcome_delay: Duration,

    /// Channel ids that receive the startup announcement
    pub announce_channels: Vec<String>,

    /// Upper bound on a single handler invocation (default: 10s)
    pub handler_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: crate::DEFAULT_TRIGGER,
            version: crate::VERSION.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            authorized_roles: DEFAULT_AUTHORIZED_ROLES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            sandwich_owner: DEFAULT_SANDWICH_OWNER.to_string(),
            server_name: "Officially Unofficial Pimoroni Discord Server".to_string(),
            welcome_channel: None,
            welcome_delay: Duration::from_secs(5),
            announce_channels: Vec::new(),
            handler_timeout: Duration::from_secs(10),
        }
    }
}

impl BotConfig {
    /// The reply sent for commands that do not exist (or must look like they don't).
    pub fn unknown_command_reply(&self) -> String {
        format!(
            "I don't know that command. Type {}help for a list of commands.",
            self.trigger
        )
    }

    /// The greeting posted when someone joins the server.
    pub fn welcome_text(&self, mention: &str) -> String {
        format!("Welcome {} to the {}!", mention, self.server_name)
    }
}
