/// What a chat command does once it is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Play,
    AddNext,
    Pause,
    Unpause,
    Next,
    Status,
    Help,
    Kick,
}

/// One entry of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub kind: CommandKind,
}

/// Prefix commands understood by the bot.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "play",
        aliases: &[],
        description: "Add a YouTube link to the queue, or resume playback when called without one",
        kind: CommandKind::Play,
    },
    CommandSpec {
        name: "addNext",
        aliases: &["insertNext", "pn"],
        description: "Add a YouTube link right after the current track",
        kind: CommandKind::AddNext,
    },
    CommandSpec {
        name: "pause",
        aliases: &[],
        description: "Pause the current track",
        kind: CommandKind::Pause,
    },
    CommandSpec {
        name: "unpause",
        aliases: &["resume"],
        description: "Resume the paused track",
        kind: CommandKind::Unpause,
    },
    CommandSpec {
        name: "next",
        aliases: &["skip"],
        description: "Skip to the next track in the queue",
        kind: CommandKind::Next,
    },
    CommandSpec {
        name: "status",
        aliases: &["queue"],
        description: "Show the current track and the queue",
        kind: CommandKind::Status,
    },
    CommandSpec {
        name: "help",
        aliases: &[],
        description: "List the available commands",
        kind: CommandKind::Help,
    },
    CommandSpec {
        name: "kick",
        aliases: &["stop", "leave"],
        description: "Stop playback, clear the queue and leave the voice channel",
        kind: CommandKind::Kick,
    },
];

/// Finds a command by name or alias, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| {
        spec.name.eq_ignore_ascii_case(name)
            || spec.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    })
}

/// Commands ordered by name, case-insensitively, for the help listing.
pub fn sorted() -> Vec<&'static CommandSpec> {
    let mut specs: Vec<_> = COMMANDS.iter().collect();
    specs.sort_by_key(|spec| spec.name.to_ascii_lowercase());
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn names_and_aliases_resolve() {
        assert_eq!(lookup("play").map(|s| s.kind), Some(CommandKind::Play));
        assert_eq!(lookup("pn").map(|s| s.kind), Some(CommandKind::AddNext));
        assert_eq!(lookup("insertnext").map(|s| s.kind), Some(CommandKind::AddNext));
        assert_eq!(lookup("SKIP").map(|s| s.kind), Some(CommandKind::Next));
        assert_eq!(lookup("leave").map(|s| s.kind), Some(CommandKind::Kick));
        assert!(lookup("volume").is_none());
    }

    #[test]
    fn help_order_is_alphabetical() {
        let names: Vec<_> = sorted().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["addNext", "help", "kick", "next", "pause", "play", "status", "unpause"]
        );
    }

    #[test]
    fn no_name_is_claimed_twice() {
        let mut seen = HashSet::new();
        for spec in COMMANDS {
            for name in std::iter::once(&spec.name).chain(spec.aliases) {
                assert!(seen.insert(name.to_ascii_lowercase()), "duplicate {name}");
            }
        }
    }
}
