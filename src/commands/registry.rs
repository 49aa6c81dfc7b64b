//! Command Registry
//!
//! Maps command names and synonyms to [`Command`]s. A registry is filled once
//! at startup and then shared read-only (behind an `Arc`) by every dispatch,
//! so no locking is involved.
//!
//! ## Lookup Order
//!
//! ```text
//! token ──lowercase──> primary names ──miss──> synonyms ──miss──> UnknownCommand
//! ```

use crate::commands::builtin;
use crate::commands::command::{Command, CommandError};
use crate::config::BotConfig;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two commands claim the same name
    #[error("command '{0}' is already registered")]
    DuplicateName(String),

    /// Two synonyms claim the same alias
    #[error("synonym '{0}' is already registered")]
    DuplicateSynonym(String),

    /// A synonym points at a command that was never registered
    #[error("synonym '{alias}' refers to unknown command '{target}'")]
    UnknownTarget { alias: String, target: String },

    /// The name could never be typed as a single command token
    #[error("invalid command name '{0}'")]
    InvalidName(String),
}

/// Name and synonym tables for all commands.
#[derive(Debug, Default)]
pub struct Registry {
    /// Lower-cased primary name -> command
    primary: BTreeMap<String, Arc<Command>>,
    /// Lower-cased alias -> command (always one also present in `primary`)
    synonyms: HashMap<String, Arc<Command>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command under its (lower-cased) name.
    pub fn register(&mut self, command: Command) -> Result<Arc<Command>, RegistryError> {
        let key = normalize(command.name())?;
        if self.primary.contains_key(&key) {
            return Err(RegistryError::DuplicateName(key));
        }

        let command = Arc::new(command);
        self.primary.insert(key, Arc::clone(&command));
        Ok(command)
    }

    /// Makes `alias` resolve to the command registered as `target`.
    ///
    /// Synonyms are only consulted when no primary name matches, so an alias
    /// equal to some primary name is accepted but never reached.
    pub fn register_synonym(&mut self, alias: &str, target: &str) -> Result<(), RegistryError> {
        let alias = normalize(alias)?;
        if self.synonyms.contains_key(&alias) {
            return Err(RegistryError::DuplicateSynonym(alias));
        }

        let command = self
            .primary
            .get(&target.to_lowercase())
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTarget {
                alias: alias.clone(),
                target: target.to_string(),
            })?;

        self.synonyms.insert(alias, command);
        Ok(())
    }

    /// Looks a token up by primary name, then by synonym.
    pub fn resolve(&self, token: &str) -> Result<Arc<Command>, CommandError> {
        let key = token.to_lowercase();
        self.primary
            .get(&key)
            .or_else(|| self.synonyms.get(&key))
            .cloned()
            .ok_or(CommandError::UnknownCommand(key))
    }

    /// Like [`resolve`](Self::resolve), but secret commands count as unknown.
    pub fn resolve_visible(&self, token: &str) -> Result<Arc<Command>, CommandError> {
        match self.resolve(token) {
            Ok(command) if command.is_secret() => {
                Err(CommandError::UnknownCommand(token.to_lowercase()))
            }
            other => other,
        }
    }

    /// All non-secret commands, sorted by name.
    pub fn list_visible(&self) -> Vec<Arc<Command>> {
        let mut visible: Vec<_> = self
            .primary
            .values()
            .filter(|c| !c.is_secret())
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.name().cmp(b.name()));
        visible
    }

    /// Builds a registry holding all built-in commands.
    pub fn builtin(config: &BotConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        builtin::register_all(&mut registry, config)?;
        Ok(registry)
    }

    /// Number of primary names.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Number of synonyms.
    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }
}

fn normalize(name: &str) -> Result<String, RegistryError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::{Action, CommandResult, Context, Reply};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Action for Noop {
        async fn run(&self, _cx: &Context<'_>) -> CommandResult {
            Ok(Reply::text("noop"))
        }
    }

    fn cmd(name: &str) -> Command {
        Command::new(name, format!("The {} command.", name), Noop)
    }

    fn sample() -> Registry {
        let mut registry = Registry::new();
        registry.register(cmd("hello")).unwrap();
        registry.register(cmd("goodbye")).unwrap();
        registry.register(cmd("Roll")).unwrap();
        registry.register(cmd("sudo").secret()).unwrap();
        registry.register_synonym("hi", "hello").unwrap();
        registry.register_synonym("bye", "goodbye").unwrap();
        registry
    }

    #[test]
    fn test_resolve_primary_names() {
        let registry = sample();
        for name in ["hello", "goodbye", "roll", "sudo"] {
            assert_eq!(registry.resolve(name).unwrap().name().to_lowercase(), name);
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = sample();
        assert_eq!(registry.resolve("HeLLo").unwrap().name(), "hello");
        assert_eq!(registry.resolve("roll").unwrap().name(), "Roll");
        assert_eq!(registry.resolve("HI").unwrap().name(), "hello");
    }

    #[test]
    fn test_resolve_synonyms_point_at_primary() {
        let registry = sample();
        let via_alias = registry.resolve("bye").unwrap();
        let via_name = registry.resolve("goodbye").unwrap();
        assert!(Arc::ptr_eq(&via_alias, &via_name));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = sample();
        for token in ["", "nope", "hell", "hello!"] {
            assert!(matches!(
                registry.resolve(token),
                Err(CommandError::UnknownCommand(_))
            ));
        }
    }

    #[test]
    fn test_primary_wins_over_synonym() {
        let mut registry = sample();
        // An alias shadowed by a primary name is never reached.
        registry.register_synonym("roll", "hello").unwrap();
        assert_eq!(registry.resolve("roll").unwrap().name(), "Roll");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = sample();
        assert_eq!(
            registry.register(cmd("HELLO")).unwrap_err(),
            RegistryError::DuplicateName("hello".to_string())
        );
    }

    #[test]
    fn test_duplicate_synonym_rejected() {
        let mut registry = sample();
        assert_eq!(
            registry.register_synonym("Hi", "goodbye").unwrap_err(),
            RegistryError::DuplicateSynonym("hi".to_string())
        );
        assert_eq!(registry.resolve("hi").unwrap().name(), "hello");
    }

    #[test]
    fn test_synonym_requires_registered_target() {
        let mut registry = sample();
        assert!(matches!(
            registry.register_synonym("about", "help"),
            Err(RegistryError::UnknownTarget { .. })
        ));
        assert!(registry.resolve("about").is_err());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register(cmd("")),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(
            registry.register(cmd("two words")),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_visible_sorted_without_secrets() {
        let registry = sample();
        let names: Vec<_> = registry
            .list_visible()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Roll", "goodbye", "hello"]);
        assert!(registry.list_visible().iter().all(|c| !c.is_secret()));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.synonym_count(), 2);
    }

    #[test]
    fn test_resolve_visible_hides_secrets() {
        let registry = sample();
        assert!(registry.resolve("sudo").is_ok());
        assert!(matches!(
            registry.resolve_visible("sudo"),
            Err(CommandError::UnknownCommand(ref t)) if t == "sudo"
        ));
        assert!(matches!(
            registry.resolve_visible("nonexistent"),
            Err(CommandError::UnknownCommand(_))
        ));
        assert_eq!(registry.resolve_visible("hi").unwrap().name(), "hello");
    }
}
