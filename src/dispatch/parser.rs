//! Command Text Parsing
//!
//! Turns raw message text into a command token and its argument string:
//!
//! ```text
//! "!Roll   please"  ──>  token = "roll", rest = "please"
//! "! help"          ──>  token = "",     rest = "help"
//! "hello there"     ──>  not a command
//! ```

/// A message recognised as a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First word after the trigger, lower-cased
    pub token: String,
    /// The remainder after the first whitespace run (may be empty)
    pub rest: String,
}

/// Splits off the first whitespace-delimited word.
///
/// Leading whitespace is skipped; the remainder has its leading whitespace
/// removed but keeps everything else verbatim.
pub fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

/// Parses `text` as a command if it starts with `trigger`.
///
/// Anything after the trigger counts, even nothing at all: a bare trigger
/// (or one followed by whitespace) yields an empty token, which no command
/// is registered under.
pub fn parse_command(text: &str, trigger: char) -> Option<ParsedCommand> {
    let body = text.strip_prefix(trigger)?;
    if body.starts_with(char::is_whitespace) {
        return Some(ParsedCommand {
            token: String::new(),
            rest: body.trim_start().to_string(),
        });
    }

    let (word, rest) = split_first_word(body);
    Some(ParsedCommand {
        token: word.to_lowercase(),
        rest: rest.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(token: &str, rest: &str) -> Option<ParsedCommand> {
        Some(ParsedCommand {
            token: token.to_string(),
            rest: rest.to_string(),
        })
    }

    #[test]
    fn test_parse_bare_command() {
        assert_eq!(parse_command("!help", '!'), parsed("help", ""));
    }

    #[test]
    fn test_parse_lowercases_token_only() {
        assert_eq!(
            parse_command("!CHOOSE Red Blue", '!'),
            parsed("choose", "Red Blue")
        );
    }

    #[test]
    fn test_parse_keeps_inner_whitespace_of_rest() {
        assert_eq!(
            parse_command("!say general   hello  world ", '!'),
            parsed("say", "general   hello  world ")
        );
        assert_eq!(parse_command("!add\t2\n3", '!'), parsed("add", "2\n3"));
    }

    #[test]
    fn test_parse_ignores_non_commands() {
        assert_eq!(parse_command("help", '!'), None);
        assert_eq!(parse_command(" !help", '!'), None);
        assert_eq!(parse_command("?help", '!'), None);
        assert_eq!(parse_command("", '!'), None);
    }

    #[test]
    fn test_parse_bare_trigger() {
        assert_eq!(parse_command("!", '!'), parsed("", ""));
        assert_eq!(parse_command("! help", '!'), parsed("", "help"));
        assert_eq!(parse_command("!  ", '!'), parsed("", ""));
    }

    #[test]
    fn test_custom_trigger() {
        assert_eq!(parse_command("$roll", '$'), parsed("roll", ""));
        assert_eq!(parse_command("!roll", '$'), None);
    }

    #[test]
    fn test_split_first_word() {
        assert_eq!(split_first_word("general hi there"), ("general", "hi there"));
        assert_eq!(split_first_word("  lonely  "), ("lonely", ""));
        assert_eq!(split_first_word(""), ("", ""));
    }
}
