//! pimobot - A Chat Server Command Bot
//!
//! This is the main entry point for the bot.
//! It reads the credential, builds the command registry, connects to the
//! chat relay and runs the session until the relay goes away or Ctrl+C.

use anyhow::Context as _;
use clap::Parser;
use pimobot::config::{BotConfig, DEFAULT_AUTHORIZED_ROLES, DEFAULT_SANDWICH_OWNER, DEFAULT_SOURCE_URL};
use pimobot::connection::{Session, SessionStats};
use pimobot::{Dispatcher, Registry};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "pimobot", version, about = "Command bot for the Pimoroni chat server")]
struct Cli {
    /// Relay host to connect to
    #[arg(long, default_value = pimobot::DEFAULT_HOST)]
    host: String,

    /// Relay port to connect to
    #[arg(short, long, default_value_t = pimobot::DEFAULT_PORT)]
    port: u16,

    /// File holding the bot credential
    #[arg(long, default_value = "token.txt")]
    token_file: PathBuf,

    /// Role allowed to use gated commands (repeatable)
    #[arg(long = "authorized-role", value_name = "ROLE")]
    authorized_roles: Vec<String>,

    /// Channel id new members are welcomed in
    #[arg(long, value_name = "CHANNEL_ID")]
    welcome_channel: Option<String>,

    /// Channel id that receives the startup announcement (repeatable)
    #[arg(long = "announce-channel", value_name = "CHANNEL_ID")]
    announce_channels: Vec<String>,

    /// Display name `sudo` obeys
    #[arg(long, default_value = DEFAULT_SANDWICH_OWNER)]
    sandwich_owner: String,

    /// Link reported by the code command
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Seconds a single command may run before it is abandoned
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    handler_timeout: u64,
}

impl Cli {
    /// Returns the relay address as a string
    fn relay_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn bot_config(&self) -> BotConfig {
        let authorized_roles = if self.authorized_roles.is_empty() {
            DEFAULT_AUTHORIZED_ROLES.iter().map(|r| r.to_string()).collect()
        } else {
            self.authorized_roles.clone()
        };

        BotConfig {
            source_url: self.source_url.clone(),
            authorized_roles,
            sandwich_owner: self.sandwich_owner.clone(),
            welcome_channel: self.welcome_channel.clone(),
            announce_channels: self.announce_channels.clone(),
            handler_timeout: Duration::from_secs(self.handler_timeout),
            ..BotConfig::default()
        }
    }
}

fn print_banner(cli: &Cli, registry: &Registry) {
    println!(
        r#"
pimobot v{} - Pimoroni Chat Server Bot
──────────────────────────────────────────────────────────────
Relay:    {}
Commands: {} ({} synonyms)

Use Ctrl+C to shut down.
"#,
        pimobot::VERSION,
        cli.relay_address(),
        registry.len(),
        registry.synonym_count()
    );
}

/// Reads the credential, trimming the trailing newline editors like to add.
fn read_token(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read token file {}", path.display()))?;
    let token = raw.trim().to_string();
    anyhow::ensure!(!token.is_empty(), "token file {} is empty", path.display());
    Ok(token)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let token = read_token(&cli.token_file)?;
    let config = Arc::new(cli.bot_config());

    let registry = Arc::new(Registry::builtin(&config).context("failed to register commands")?);
    info!(
        commands = registry.len(),
        synonyms = registry.synonym_count(),
        "Command registry ready"
    );
    print_banner(&cli, &registry);

    let dispatcher = Dispatcher::new(registry, &config);
    let stats = Arc::new(SessionStats::new());

    let session = Session::connect(
        cli.relay_address(),
        &token,
        dispatcher,
        Arc::clone(&config),
        Arc::clone(&stats),
    )
    .await
    .with_context(|| format!("failed to connect to relay at {}", cli.relay_address()))?;

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, disconnecting...");
    };

    let result = tokio::select! {
        result = session.run() => result.map_err(anyhow::Error::from),
        _ = shutdown => Ok(()),
    };

    info!(
        frames_received = stats.frames_received.load(Ordering::Relaxed),
        messages_dispatched = stats.messages_dispatched.load(Ordering::Relaxed),
        frames_sent = stats.frames_sent.load(Ordering::Relaxed),
        "Bot stopped"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["pimobot"]).unwrap();
        assert_eq!(cli.relay_address(), "127.0.0.1:7878");

        let config = cli.bot_config();
        assert_eq!(config.handler_timeout, Duration::from_secs(10));
        assert_eq!(config.authorized_roles, DEFAULT_AUTHORIZED_ROLES);
    }

    #[test]
    fn test_cli_rejects_zero_handler_timeout() {
        assert!(Cli::try_parse_from(["pimobot", "--handler-timeout", "0"]).is_err());

        let cli = Cli::try_parse_from(["pimobot", "--handler-timeout", "1"]).unwrap();
        assert_eq!(cli.bot_config().handler_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_cli_repeatable_flags() {
        let cli = Cli::try_parse_from([
            "pimobot",
            "--authorized-role",
            "@mods",
            "--announce-channel",
            "11",
            "--announce-channel",
            "12",
        ])
        .unwrap();
        let config = cli.bot_config();
        assert_eq!(config.authorized_roles, vec!["@mods"]);
        assert_eq!(config.announce_channels, vec!["11", "12"]);
    }
}
