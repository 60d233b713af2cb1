//! Error types shared across the bot.
//!
//! Every failure the playback session or a command handler can produce is a
//! value of one of these enums. Nothing here is fatal to the process: the
//! dispatcher renders them as chat replies and the session degrades to
//! "notify and skip forward".

use thiserror::Error;

/// Errors returned by [`crate::audio::session::PlaybackSession`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A voice connection exists for a different channel or guild.
    #[error("already connected to another voice channel")]
    AlreadyConnectedElsewhere,

    /// Joining the voice channel or subscribing the player failed.
    #[error("unable to connect to voice channel: {0}")]
    Connection(String),

    /// The session task has shut down and no longer accepts requests.
    #[error("playback session is no longer running")]
    Closed,
}

/// Failures while loading or controlling audio in the voice driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("not connected to a voice channel")]
    NotConnected,

    #[error("nothing is loaded in the player")]
    NothingLoaded,

    #[error("unplayable source: {0}")]
    InvalidSource(String),

    #[error("voice driver error: {0}")]
    Backend(String),
}

/// Failures while turning a user supplied URL into a [`crate::sources::Track`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("video ID not found in URL")]
    MissingVideoId,

    #[error("no video found for ID {0}")]
    NotFound(String),

    #[error("YouTube API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Malformed command text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    EmptyCommand,
}

/// Errors produced by command handlers, rendered uniformly by the dispatcher.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Malformed(#[from] ParseError),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("this command only works inside a server")]
    NotInGuild,

    #[error("user is not in a voice channel")]
    NotInVoiceChannel,

    #[error("unable to get video title ({0})")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
