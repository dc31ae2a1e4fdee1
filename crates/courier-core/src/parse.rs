//! Command grammar: `/word[@botname] [args]`.
//!
//! The parser is compiled once per bot instance because the mention suffix
//! (`@botname`) depends on the bot's own username, which is only known after
//! the first `getMe` call.

use regex::RegexBuilder;

use crate::error::{CourierError, Result};

/// Parses raw message text into `(command, args)`.
///
/// A message matches the grammar when it starts with `/` followed by a
/// command word (`[a-zA-Z_]+`), optionally suffixed with `@botname`
/// (stripped and ignored), optionally followed by whitespace and arguments.
/// The command word is matched case-insensitively and returned lowercased;
/// arguments keep interior newlines but are trimmed at both ends.
#[derive(Debug, Clone)]
pub struct CommandParser {
    pattern: regex::Regex,
}

impl CommandParser {
    /// Compile the grammar for a bot with the given username.
    pub fn new(bot_username: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&format!(
            r"^/([a-zA-Z_]+)(?:@{})?(?:\s+(.+))?$",
            regex::escape(bot_username)
        ))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| CourierError::Pattern(e.to_string()))?;

        Ok(Self { pattern })
    }

    /// Extract `(command, args)` from `text`, or `None` when the text does
    /// not match the command grammar. Pure, no side effects.
    pub fn parse(&self, text: &str) -> Option<(String, String)> {
        let captures = self.pattern.captures(text)?;
        let command = captures[1].to_lowercase();
        let args = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some((command, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new("courier_bot").unwrap()
    }

    #[test]
    fn bare_command() {
        assert_eq!(
            parser().parse("/start"),
            Some(("start".to_string(), String::new()))
        );
    }

    #[test]
    fn command_with_args() {
        assert_eq!(
            parser().parse("/echo hello world"),
            Some(("echo".to_string(), "hello world".to_string()))
        );
    }

    #[test]
    fn command_is_lowercased() {
        assert_eq!(
            parser().parse("/Start"),
            Some(("start".to_string(), String::new()))
        );
    }

    #[test]
    fn mention_suffix_is_stripped() {
        assert_eq!(
            parser().parse("/start@courier_bot now"),
            Some(("start".to_string(), "now".to_string()))
        );
    }

    #[test]
    fn mention_matches_case_insensitively() {
        assert_eq!(
            parser().parse("/start@Courier_Bot"),
            Some(("start".to_string(), String::new()))
        );
    }

    #[test]
    fn foreign_mention_does_not_match() {
        assert_eq!(parser().parse("/start@other_bot"), None);
    }

    #[test]
    fn args_keep_newlines_but_are_trimmed() {
        assert_eq!(
            parser().parse("/note first line\nsecond line  "),
            Some(("note".to_string(), "first line\nsecond line".to_string()))
        );
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parser().parse("hello"), None);
        assert_eq!(parser().parse("not /a command"), None);
    }

    #[test]
    fn slash_alone_is_not_a_command() {
        assert_eq!(parser().parse("/"), None);
        assert_eq!(parser().parse("/123"), None);
    }
}
