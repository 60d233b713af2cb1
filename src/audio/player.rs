use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    events::CoreEvent,
    tracks::TrackHandle,
    Call, Event, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        events::{DisconnectForwarder, TrackEventForwarder, TrackSignal},
        session::SessionEvents,
    },
    error::{PlaybackError, SessionError},
    sources::{AudioSource, Track},
};

/// The voice side of a playback session: one channel binding and one player.
///
/// Only the session task drives a backend, so methods take `&mut self`.
/// Implementations report asynchronous player changes through the
/// [`SessionEvents`] they are handed, tagged with the generation or epoch the
/// session passed in.
#[async_trait]
pub trait VoiceBackend: Send + 'static {
    /// Binds to a voice channel and subscribes the player to it.
    async fn join(
        &mut self,
        guild_id: GuildId,
        channel_id: ChannelId,
        epoch: u64,
        events: SessionEvents,
    ) -> Result<(), SessionError>;

    /// Destroys the channel binding.
    async fn leave(&mut self, guild_id: GuildId) -> Result<(), SessionError>;

    /// Replaces whatever is loaded with `track` and starts it.
    async fn load(
        &mut self,
        track: &Track,
        generation: u64,
        events: SessionEvents,
    ) -> Result<(), PlaybackError>;

    async fn pause(&mut self) -> Result<(), PlaybackError>;

    async fn resume(&mut self) -> Result<(), PlaybackError>;

    /// Stops the loaded track, if any.
    async fn stop(&mut self);
}

/// [`VoiceBackend`] on top of a songbird [`Songbird`] manager.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    source: Arc<dyn AudioSource>,
    call: Option<Arc<Mutex<Call>>>,
    current: Option<TrackHandle>,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>, source: Arc<dyn AudioSource>) -> Self {
        Self {
            manager,
            source,
            call: None,
            current: None,
        }
    }
}

#[async_trait]
impl VoiceBackend for SongbirdBackend {
    async fn join(
        &mut self,
        guild_id: GuildId,
        channel_id: ChannelId,
        epoch: u64,
        events: SessionEvents,
    ) -> Result<(), SessionError> {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        {
            let mut handler = call.lock().await;
            handler.remove_all_global_events();

            if !handler.is_deaf() {
                if let Err(e) = handler.deafen(true).await {
                    warn!("No se pudo ensordecer el bot: {:?}", e);
                }
            }

            handler.add_global_event(
                Event::Core(CoreEvent::DriverDisconnect),
                DisconnectForwarder { epoch, events },
            );
        }

        self.call = Some(call);
        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
        Ok(())
    }

    async fn leave(&mut self, guild_id: GuildId) -> Result<(), SessionError> {
        self.current = None;

        if let Some(call) = self.call.take() {
            let mut handler = call.lock().await;
            handler.remove_all_global_events();
            handler.stop();
        }

        if self.manager.get(guild_id).is_some() {
            self.manager
                .remove(guild_id)
                .await
                .map_err(|e| SessionError::Connection(e.to_string()))?;
        }

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        Ok(())
    }

    async fn load(
        &mut self,
        track: &Track,
        generation: u64,
        events: SessionEvents,
    ) -> Result<(), PlaybackError> {
        let call = self.call.clone().ok_or(PlaybackError::NotConnected)?;
        let input = self.source.open(track)?;

        let handle = {
            let mut handler = call.lock().await;
            handler.stop();
            handler.play_input(input)
        };

        for (event, signal) in [
            (TrackEvent::Playable, TrackSignal::Playable),
            (TrackEvent::Play, TrackSignal::Play),
            (TrackEvent::End, TrackSignal::End),
            (TrackEvent::Error, TrackSignal::Error),
        ] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEventForwarder {
                        generation,
                        signal,
                        events: events.clone(),
                    },
                )
                .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        }

        debug!("🎵 Track cargado (generación {}): {}", generation, track.title());
        self.current = Some(handle);
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlaybackError> {
        let track = self.current.as_ref().ok_or(PlaybackError::NothingLoaded)?;
        track
            .pause()
            .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        info!("⏸️ Reproducción pausada");
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), PlaybackError> {
        let track = self.current.as_ref().ok_or(PlaybackError::NothingLoaded)?;
        track
            .play()
            .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        info!("▶️ Reproducción reanudada");
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(track) = self.current.take() {
            let _ = track.stop();
            info!("⏹️ Reproducción detenida");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::audio::session::PlayerEvent;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    /// Everything the fake backend was asked to do.
    #[derive(Default)]
    pub struct FakeState {
        pub joins: Vec<(GuildId, ChannelId)>,
        pub leaves: Vec<GuildId>,
        pub loads: Vec<Track>,
        pub stops: usize,
        pub paused: bool,
        pub loaded: bool,
        pub fail_join: bool,
        pub unplayable: HashSet<String>,
        generation: u64,
        epoch: u64,
        events: Option<SessionEvents>,
    }

    /// In-memory backend that records calls and lets tests emit player events.
    #[derive(Clone, Default)]
    pub struct FakeBackend {
        pub state: Arc<StdMutex<FakeState>>,
    }

    impl FakeBackend {
        pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.state.lock().unwrap()
        }

        pub fn mark_unplayable(&self, url: &str) {
            self.state().unplayable.insert(url.to_string());
        }

        /// Emits a player event for the most recent load.
        pub fn emit(&self, event: PlayerEvent) {
            let state = self.state();
            let events = state.events.as_ref().expect("nothing joined or loaded yet");
            events.player(state.generation, event);
        }

        /// Emits a player event tagged with an explicit generation.
        pub fn emit_for(&self, generation: u64, event: PlayerEvent) {
            let state = self.state();
            let events = state.events.as_ref().expect("nothing joined or loaded yet");
            events.player(generation, event);
        }

        pub fn generation(&self) -> u64 {
            self.state().generation
        }

        /// Simulates the voice driver dropping the current connection.
        pub fn drop_connection(&self) {
            let state = self.state();
            let events = state.events.as_ref().expect("nothing joined yet");
            events.disconnected(state.epoch);
        }

        /// Delivers a disconnect notice for an explicit connection epoch.
        pub fn drop_connection_for(&self, epoch: u64) {
            let state = self.state();
            let events = state.events.as_ref().expect("nothing joined yet");
            events.disconnected(epoch);
        }

        pub fn load_titles(&self) -> Vec<String> {
            self.state()
                .loads
                .iter()
                .map(|track| track.title().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl VoiceBackend for FakeBackend {
        async fn join(
            &mut self,
            guild_id: GuildId,
            channel_id: ChannelId,
            epoch: u64,
            events: SessionEvents,
        ) -> Result<(), SessionError> {
            let mut state = self.state();
            if state.fail_join {
                return Err(SessionError::Connection("join refused".into()));
            }
            state.joins.push((guild_id, channel_id));
            state.epoch = epoch;
            state.events = Some(events);
            Ok(())
        }

        async fn leave(&mut self, guild_id: GuildId) -> Result<(), SessionError> {
            let mut state = self.state();
            state.leaves.push(guild_id);
            state.loaded = false;
            Ok(())
        }

        async fn load(
            &mut self,
            track: &Track,
            generation: u64,
            events: SessionEvents,
        ) -> Result<(), PlaybackError> {
            let mut state = self.state();
            state.loads.push(track.clone());
            if state.unplayable.contains(track.url()) {
                state.loaded = false;
                return Err(PlaybackError::InvalidSource(track.url().to_string()));
            }
            state.generation = generation;
            state.events = Some(events);
            state.loaded = true;
            state.paused = false;
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), PlaybackError> {
            let mut state = self.state();
            if !state.loaded {
                return Err(PlaybackError::NothingLoaded);
            }
            state.paused = true;
            Ok(())
        }

        async fn resume(&mut self) -> Result<(), PlaybackError> {
            let mut state = self.state();
            if !state.loaded {
                return Err(PlaybackError::NothingLoaded);
            }
            state.paused = false;
            Ok(())
        }

        async fn stop(&mut self) {
            let mut state = self.state();
            state.stops += 1;
            state.loaded = false;
            state.paused = false;
        }
    }
}
