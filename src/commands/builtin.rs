//! Built-in Commands
//!
//! Every command the bot ships with, and [`register_all`], which performs the
//! one-time static registration at startup.
//!
//! | command     | synonyms | notes                          |
//! |-------------|----------|--------------------------------|
//! | `help`      | `about`  |                                |
//! | `hello`     | `hi`     |                                |
//! | `goodbye`   | `bye`    |                                |
//! | `version`   |          |                                |
//! | `code`      | `source` |                                |
//! | `roll`      |          |                                |
//! | `choose`    |          |                                |
//! | `add`       | `sum`    |                                |
//! | `link`      |          |                                |
//! | `sudo`      |          | secret                         |
//! | `checkauth` |          | requires an authorized role    |
//! | `say`       |          | requires an authorized role    |

use crate::commands::auth::{authorized, AuthorizationPolicy};
use crate::commands::command::{Action, Command, CommandError, CommandResult, Context, Reply};
use crate::commands::registry::{Registry, RegistryError};
use crate::config::BotConfig;
use crate::dispatch::split_first_word;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use thiserror::Error;

const GREETINGS: &[&str] = &["Hello", "Hi", "Greetings", "What's up"];
const FAREWELLS: &[&str] = &["Goodbye", "See you", "Later", "Tata"];

const RECOMMENDATIONS: &[&str] = &[
    "Try",
    "Go with",
    "Maybe",
    "Definitely",
    "Consider",
    "I asked @Gadgetoid and he said",
];

const SUM_REPLIES: &[&str] = &[
    "Hmmm. {}.",
    "Easy. {}.",
    "That would be {}.",
    "That equals {}.",
    "That's {}. Quick maths.",
];

const LINK_REPLIES: &[&str] = &[
    "The {} is at: {}",
    "Here's a link to the {}: {}",
    "The {} can be found at: {}",
];

const SANDWICH_ORDER: &[&str] = &["make", "me", "a", "sandwich"];
const FOODS: &[&str] = &[
    ":croissant:",
    ":hamburger:",
    ":stuffed_pita:",
    ":hotdog:",
    ":bread:",
];
const SANDWICH_REPLIES: &[&str] = &["How about a {} instead?", "Best I can do is {}"];

/// Registers all built-in commands and their synonyms.
pub fn register_all(registry: &mut Registry, config: &BotConfig) -> Result<(), RegistryError> {
    let policy = AuthorizationPolicy::new(&config.authorized_roles);

    registry.register(Command::new(
        "help",
        "Prints help about commands. With no argument, prints general help.\n\
         \n\
         Usage: help [<command>]\n   \
            - command: command you want help with.",
        Help {
            version: config.version.clone(),
            source_url: config.source_url.clone(),
            trigger: config.trigger,
        },
    ))?;
    registry.register_synonym("about", "help")?;

    registry.register(Command::new(
        "hello",
        "Says hello back to you!",
        Greet(GREETINGS),
    ))?;
    registry.register_synonym("hi", "hello")?;

    registry.register(Command::new(
        "goodbye",
        "Says goodbye back to you!",
        Greet(FAREWELLS),
    ))?;
    registry.register_synonym("bye", "goodbye")?;

    registry.register(Command::new(
        "version",
        "Says the currently active version of the bot.",
        Version(config.version.clone()),
    ))?;

    registry.register(Command::new(
        "code",
        "Prints a link to the bot's code.",
        Code(config.source_url.clone()),
    ))?;
    registry.register_synonym("source", "code")?;

    registry.register(Command::new("roll", "Roll a six-sided die.", Roll))?;

    registry.register(Command::new(
        "choose",
        "Choose something from a list of options.\n\
         \n\
         Usage: choose <option> [<option> ...]",
        Choose,
    ))?;

    registry.register(Command::new(
        "add",
        "Add a list of numbers.\n\
         \n\
         Usage: add [<number> ...]",
        Add,
    ))?;
    registry.register_synonym("sum", "add")?;

    registry.register(Command::new(
        "link",
        "Get links to Pimoroni resources.\n\
         \n\
         Usage: link <thing>\n   \
            - thing: the thing you want the link for.",
        Link::pimoroni(),
    ))?;

    registry.register(
        Command::new(
            "sudo",
            "A secret command. You will never see this help message.",
            Sudo {
                owner: config.sandwich_owner.clone(),
            },
        )
        .secret(),
    )?;

    registry.register(authorized(
        Command::new(
            "checkauth",
            "Test command to check whether you are authorized. (Requires authorization.)",
            CheckAuth,
        ),
        policy.clone(),
    ))?;

    registry.register(authorized(
        Command::new(
            "say",
            "Send a message to a channel. (Requires authorization.)\n\
             \n\
             Usage: say [<channel>] <message>\n\
             Channel is optional. It must be a channel on your current server. If not\n\
             specified or not found, the message will go to the current channel.",
            Say,
        ),
        policy,
    ))?;

    Ok(())
}

/// Picks one option at random; empty input yields an empty string.
fn pick<'a>(options: &[&'a str]) -> &'a str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

/// Substitutes each `{}` in `template` with the next value.
fn fill(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut values = values.iter();
    let mut pieces = template.split("{}").peekable();
    while let Some(piece) = pieces.next() {
        out.push_str(piece);
        if pieces.peek().is_some() {
            out.push_str(values.next().copied().unwrap_or_default());
        }
    }
    out
}

// ============================================================================
// help
// ============================================================================

struct Help {
    version: String,
    source_url: String,
    trigger: char,
}

impl Help {
    fn overview(&self, registry: &Registry) -> String {
        let listing = registry
            .list_visible()
            .iter()
            .map(|c| format!("{:10} {}", c.name(), c.summary()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "```A good ol' Pimoroni Robot (Pirated, of course)\n\
             Version {version}\n\
             \n\
             Commands should be prefixed with '{trigger}' and are not case sensitive.\n\
             \n\
             The source code for the Pimoroni Bot can be found here: {url}\n\
             \n\
             Commands: \n\
             {listing}\n\
             \n\
             Type {trigger}help <command> for help with that command.```",
            version = self.version,
            trigger = self.trigger,
            url = self.source_url,
            listing = listing,
        )
    }
}

#[async_trait]
impl Action for Help {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        let (topic, _) = split_first_word(&cx.invocation.rest);
        if topic.is_empty() {
            return Ok(Reply::text(self.overview(cx.registry)));
        }

        let command = cx.registry.resolve_visible(topic)?;
        Ok(Reply::text(format!(
            "```{}: {}```",
            command.name(),
            command.description()
        )))
    }
}

// ============================================================================
// Small talk
// ============================================================================

/// `hello` and `goodbye`: a random phrase followed by the caller's mention.
struct Greet(&'static [&'static str]);

#[async_trait]
impl Action for Greet {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        Ok(Reply::text(format!(
            "{} {}!",
            pick(self.0),
            cx.message().author.mention()
        )))
    }
}

struct Version(String);

#[async_trait]
impl Action for Version {
    async fn run(&self, _cx: &Context<'_>) -> CommandResult {
        Ok(Reply::text(format!("Version {}", self.0)))
    }
}

struct Code(String);

#[async_trait]
impl Action for Code {
    async fn run(&self, _cx: &Context<'_>) -> CommandResult {
        Ok(Reply::text(format!(
            "Here's a link to my source code: {}",
            self.0
        )))
    }
}

struct Roll;

#[async_trait]
impl Action for Roll {
    async fn run(&self, _cx: &Context<'_>) -> CommandResult {
        let roll: u8 = rand::thread_rng().gen_range(1..=6);
        Ok(Reply::text(format!("{} rolled!", roll)))
    }
}

struct Choose;

#[async_trait]
impl Action for Choose {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        let options = cx.invocation.args();
        if options.is_empty() {
            return Ok(Reply::text("What are the options?"));
        }
        Ok(Reply::text(format!(
            "{} {}.",
            pick(RECOMMENDATIONS),
            pick(&options)
        )))
    }
}

// ============================================================================
// add
// ============================================================================

/// A token `add` could not read as a number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("'{0}' isn't a number")]
pub struct NotANumber(pub String);

/// A numeric literal as `add` understands it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(sum) => Number::Int(sum),
                None => Number::Float(a as f64 + b as f64),
            },
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

/// Renders a float the way a calculator user expects: always with a decimal
/// point (`9.0`), switching to exponent form (`1e+20`, `1e-05`) outside
/// `1e-4..1e16`.
fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let plain = x.to_string();
        return if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        };
    }

    let scientific = format!("{:e}", x);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => scientific,
    }
}

/// Applies the sign to a parsed magnitude, staying integral while it fits.
fn signed_integer(magnitude: u64, negative: bool) -> Number {
    let value = if negative {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };
    match i64::try_from(value) {
        Ok(n) => Number::Int(n),
        Err(_) => Number::Float(value as f64),
    }
}

/// Reads digits too large for `u64` as a float.
fn wide_integer(digits: &str, radix: u32, negative: bool) -> Number {
    let magnitude = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    Number::Float(if negative { -magnitude } else { magnitude })
}

/// Removes `_` digit separators, which may only sit between two digits.
fn strip_separators(digits: &str) -> Option<String> {
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    Some(digits.replace('_', ""))
}

/// Parses a single numeric literal: `42`, `-1_000`, `0x1F`, `0b101`, `2.5e3`.
pub fn parse_number(token: &str) -> Result<Number, NotANumber> {
    let err = || NotANumber(token.to_string());

    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let body = strip_separators(body).ok_or_else(err)?;
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(err());
    }

    let radix = match body.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &body[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(err());
        }
        return Ok(match u64::from_str_radix(digits, radix) {
            Ok(n) => signed_integer(n, negative),
            Err(_) => wide_integer(digits, radix, negative),
        });
    }

    if body.bytes().all(|b| b.is_ascii_digit()) {
        // No leading zeros on decimal integers, except zero itself.
        if body.starts_with('0') && body.bytes().any(|b| b != b'0') {
            return Err(err());
        }
        return Ok(match body.parse::<u64>() {
            Ok(n) => signed_integer(n, negative),
            Err(_) => wide_integer(&body, 10, negative),
        });
    }

    let float_chars = |b: u8| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-');
    if !body.bytes().any(|b| b.is_ascii_digit()) || !body.bytes().all(float_chars) {
        return Err(err());
    }
    let f: f64 = body.parse().map_err(|_| err())?;
    Ok(Number::Float(if negative { -f } else { f }))
}

/// Sums numeric literals; an empty list sums to zero.
pub fn sum_numbers<'a, I>(tokens: I) -> Result<Number, NotANumber>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .try_fold(Number::Int(0), |acc, t| Ok(acc.add(parse_number(t)?)))
}

struct Add;

#[async_trait]
impl Action for Add {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        match sum_numbers(cx.invocation.args()) {
            Ok(total) => {
                let total = total.to_string();
                Ok(Reply::text(fill(pick(SUM_REPLIES), &[total.as_str()])))
            }
            Err(e) => {
                tracing::debug!(error = %e, "add: bad operand");
                Ok(Reply::text("Something in there isn't a number, sorry."))
            }
        }
    }
}

// ============================================================================
// link
// ============================================================================

/// A named external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub key: &'static str,
    pub title: &'static str,
    pub url: &'static str,
}

struct Link {
    links: Vec<LinkEntry>,
}

impl Link {
    fn pimoroni() -> Self {
        let entry = |key, title, url| LinkEntry { key, title, url };
        Self {
            links: vec![
                entry("shop", "Pimoroni shop", "https://shop.pimoroni.com/"),
                entry("learn", "Pimoroni Yarr-niversity", "https://learn.pimoroni.com/"),
                entry("blog", "Pimoroni blog", "https://blog.pimoroni.com/"),
                entry("forum", "Pimoroni forums", "https://forums.pimoroni.com/"),
                entry("twitter", "Pimoroni Twitter", "https://twitter.com/pimoroni"),
                entry(
                    "youtube",
                    "Pimoroni YouTube channel",
                    "https://youtube.com/pimoroniltd",
                ),
                entry(
                    "about",
                    "Pimoroni \"about us\" page",
                    "https://shop.pimoroni.com/pages/about-us",
                ),
            ],
        }
    }

    fn keys(&self) -> String {
        self.links
            .iter()
            .map(|l| l.key)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl Action for Link {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        let (wanted, _) = split_first_word(&cx.invocation.rest);
        if wanted.is_empty() {
            return Ok(Reply::text(format!(
                "Which link do you want? {}",
                self.keys()
            )));
        }

        let wanted = wanted.to_lowercase();
        let text = match self.links.iter().find(|l| l.key == wanted) {
            Some(link) => fill(pick(LINK_REPLIES), &[link.title, link.url]),
            None => format!(
                "I don't know where that is. Try one of these: {}",
                self.keys()
            ),
        };
        Ok(Reply::text(text))
    }
}

// ============================================================================
// sudo
// ============================================================================

struct Sudo {
    owner: String,
}

#[async_trait]
impl Action for Sudo {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        if cx.invocation.args() != SANDWICH_ORDER {
            return Err(CommandError::UnknownCommand(cx.invocation.command.clone()));
        }

        let author = &cx.message().author;
        let text = if author.name == self.owner {
            format!("Okay {}, you're a sandwich.", author.mention())
        } else {
            fill(pick(SANDWICH_REPLIES), &[pick(FOODS)])
        };
        Ok(Reply::text(text))
    }
}

// ============================================================================
// Gated commands
// ============================================================================

struct CheckAuth;

#[async_trait]
impl Action for CheckAuth {
    async fn run(&self, _cx: &Context<'_>) -> CommandResult {
        Ok(Reply::text("Congratulations, you are authorized."))
    }
}

/// `say [<channel>] <message>`
struct Say;

#[async_trait]
impl Action for Say {
    async fn run(&self, cx: &Context<'_>) -> CommandResult {
        let rest = cx.invocation.rest.as_str();
        let (first, remainder) = split_first_word(rest);

        if !remainder.is_empty() {
            if let Some(channel) = cx.message().find_channel(first) {
                return Ok(Reply::to(channel.id.clone(), remainder));
            }
        }
        if rest.is_empty() {
            return Ok(Reply::text("What do you want me to say?"));
        }
        Ok(Reply::text(rest))
    }
}
