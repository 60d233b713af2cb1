use async_trait::async_trait;
use regex::Regex;
use songbird::{tracks::PlayMode, Event, EventContext, EventHandler as VoiceEventHandler};
use std::sync::LazyLock;
use tracing::{debug, error, warn};

use super::session::{PlayerEvent, SessionEvents};

/// Rejected or expired media fetches (HTTP 403 from the audio host).
static TRANSIENT_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\b403\b|forbidden)").expect("transient failure pattern is valid")
});

/// How the session reacts to a playback error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retry the same track after a short delay, up to the retry bound.
    Transient,
    /// Skip to the next track immediately.
    Fatal,
}

pub fn classify_failure(message: &str) -> FailureClass {
    if TRANSIENT_FAILURE.is_match(message) {
        FailureClass::Transient
    } else {
        FailureClass::Fatal
    }
}

/// Which track event a forwarder is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSignal {
    /// The track finished preparing and started; fires once per load.
    Playable,
    /// Resumed after a pause.
    Play,
    End,
    Error,
}

/// Forwards per-track songbird events into the session inbox.
///
/// `generation` identifies the load this handle belongs to; the session
/// drops events from older loads.
pub struct TrackEventForwarder {
    pub generation: u64,
    pub signal: TrackSignal,
    pub events: SessionEvents,
}

#[async_trait]
impl VoiceEventHandler for TrackEventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let failure = failure_message(ctx);

        match player_event(self.signal, failure) {
            Some(event) => {
                if let PlayerEvent::Error(message) = &event {
                    error!("❌ Error en track (generación {}): {}", self.generation, message);
                }
                debug!("📡 Evento de track {:?} (generación {})", self.signal, self.generation);
                self.events.player(self.generation, event);
            }
            None => debug!(
                "📡 Fin por error ignorado (generación {}), lo reporta el evento de error",
                self.generation
            ),
        }

        None
    }
}

/// Maps a songbird track signal to the session event it stands for.
///
/// Songbird fires `End` alongside `Error` for a failed track, in no fixed
/// order; that `End` is dropped so only the error reaches the session.
pub fn player_event(signal: TrackSignal, failure: Option<String>) -> Option<PlayerEvent> {
    match (signal, failure) {
        (TrackSignal::Playable | TrackSignal::Play, _) => Some(PlayerEvent::Playing),
        (TrackSignal::End, Some(_)) => None,
        (TrackSignal::End, None) => Some(PlayerEvent::Idle),
        (TrackSignal::Error, failure) => Some(PlayerEvent::Error(
            failure.unwrap_or_else(|| "unknown playback error".to_string()),
        )),
    }
}

fn failure_message(ctx: &EventContext<'_>) -> Option<String> {
    let EventContext::Track(tracks) = ctx else {
        return None;
    };

    tracks.iter().find_map(|(state, _handle)| match &state.playing {
        PlayMode::Errored(err) => Some(format!("{err:?}")),
        _ => None,
    })
}

/// Tears the session down when the voice driver loses its connection.
pub struct DisconnectForwarder {
    pub epoch: u64,
    pub events: SessionEvents,
}

#[async_trait]
impl VoiceEventHandler for DisconnectForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            warn!(
                "🔌 Conexión de voz perdida en guild {:?} ({:?})",
                data.guild_id, data.reason
            );
        }

        self.events.disconnected(self.epoch);
        None
    }
}
