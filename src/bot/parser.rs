use crate::error::ParseError;

/// A prefixed chat line split into a command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    NotACommand,
    Malformed(ParseError),
    Command(ParsedCommand),
}

/// Parses a chat line against the command `prefix`.
///
/// The name must follow the prefix directly (`!play`, not `! play`); the
/// remaining words are positional arguments.
pub fn parse(prefix: &str, text: &str) -> ParseOutcome {
    let Some(rest) = text.trim_end().strip_prefix(prefix) else {
        return ParseOutcome::NotACommand;
    };

    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return ParseOutcome::Malformed(ParseError::EmptyCommand);
    }

    let mut words = rest.split_whitespace().map(str::to_string);
    match words.next() {
        Some(name) => ParseOutcome::Command(ParsedCommand {
            name,
            args: words.collect(),
        }),
        None => ParseOutcome::Malformed(ParseError::EmptyCommand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn command(name: &str, args: &[&str]) -> ParseOutcome {
        ParseOutcome::Command(ParsedCommand {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn text_without_prefix_is_ignored() {
        assert_eq!(parse("!", "hello there"), ParseOutcome::NotACommand);
        assert_eq!(parse("!", ""), ParseOutcome::NotACommand);
        assert_eq!(parse("!", " !play"), ParseOutcome::NotACommand);
    }

    #[test]
    fn splits_name_and_arguments() {
        assert_eq!(parse("!", "!pause"), command("pause", &[]));
        assert_eq!(
            parse("!", "!play https://youtu.be/dQw4w9WgXcQ"),
            command("play", &["https://youtu.be/dQw4w9WgXcQ"])
        );
        assert_eq!(
            parse("!", "!addNext   a\tb  "),
            command("addNext", &["a", "b"])
        );
    }

    #[test]
    fn prefix_alone_is_malformed() {
        assert_eq!(
            parse("!", "!"),
            ParseOutcome::Malformed(ParseError::EmptyCommand)
        );
        assert_eq!(
            parse("!", "! play"),
            ParseOutcome::Malformed(ParseError::EmptyCommand)
        );
    }

    #[test]
    fn multi_character_prefix() {
        assert_eq!(parse("dj.", "dj.status"), command("status", &[]));
        assert_eq!(parse("dj.", "!status"), ParseOutcome::NotACommand);
    }
}
