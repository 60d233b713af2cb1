//! Every piece of text the bot sends to a channel.

use crate::{
    audio::session::{SessionPhase, SessionStatus, StopReason},
    bot::commands::CommandSpec,
    error::CommandError,
};

pub fn now_playing(title: &str) -> String {
    format!("🎶 **Now playing**: {title} 🎶")
}

pub fn queued(title: &str, position: usize) -> String {
    format!("**Request received**: \"{title}\", it will be played soon. (Position **{position}**)")
}

pub fn queued_next(title: &str) -> String {
    format!("**Coming up right after this one**: {title}")
}

pub fn queue_empty() -> String {
    "**The queue is empty, send another request...**".to_string()
}

pub fn not_connected() -> String {
    "**Not in a voice channel yet**, send play with a link from a voice channel to start".to_string()
}

pub fn cannot_play(title: &str) -> String {
    format!("**Sorry, can't play this one**: {title}, moving on...")
}

pub fn retrying(title: &str, attempt: u32, max: u32) -> String {
    format!("Wrong chord on **{title}**, let's try again ({attempt}/{max})... 1.. 2.. 3..")
}

pub fn giving_up(title: &str) -> String {
    format!("Sorry, **{title}** keeps failing to play, skipping ahead...")
}

pub fn cannot_pause() -> String {
    "Can't pause right now, nothing is playing".to_string()
}

pub fn paused() -> String {
    "**Taking a short break**".to_string()
}

pub fn resumed() -> String {
    "**Let's keep going**".to_string()
}

pub fn kicked() -> String {
    "Thanks everyone, enjoy the rest of your evening...".to_string()
}

pub fn teardown(reason: StopReason) -> Option<String> {
    match reason {
        StopReason::Requested => None,
        StopReason::IdleTimeout => {
            Some("**No more requests for a while, leaving the voice channel...**".to_string())
        }
        StopReason::ConnectionLost => {
            Some("**Lost the voice connection, playback stopped.**".to_string())
        }
    }
}

pub fn command_error(error: &CommandError) -> String {
    format!("⚠️ {error}")
}

/// Now playing plus the full queue listing.
pub fn status(status: &SessionStatus) -> String {
    let now_playing = match (&status.now_playing, status.phase) {
        (Some(track), SessionPhase::ConnectedPaused) => format!("{} (paused)", track.title()),
        (Some(track), _) => track.title().to_string(),
        (None, _) => "Taking a break".to_string(),
    };

    let queue = if status.queue.is_empty() {
        "**Queue is empty**".to_string()
    } else {
        status
            .queue
            .iter()
            .enumerate()
            .map(|(index, track)| format!("{}.\t{}", index + 1, track.title()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!("**Jukebox status**\n\nNow playing: {now_playing}\n\nQueue:\n\n{queue}")
}

/// Command listing; callers pass the commands already sorted by name.
pub fn help(prefix: &str, commands: &[&CommandSpec]) -> String {
    let listing = commands
        .iter()
        .map(|command| {
            if command.aliases.is_empty() {
                format!("{} - {}", command.name, command.description)
            } else {
                format!(
                    "{} - {} (aliases: {})",
                    command.name,
                    command.description,
                    command.aliases.join(", ")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "**List of commands**\nCommands must be prefixed by \"{prefix}\" character\n\n{listing}"
    )
}
