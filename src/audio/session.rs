use serenity::model::id::{ChannelId, GuildId};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    audio::{
        events::{classify_failure, FailureClass},
        player::VoiceBackend,
        queue::{QueueEntry, TrackQueue},
    },
    error::SessionError,
    sources::Track,
    ui::{messages, Notifier},
};

/// Tunables for idle teardown and playback retries.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(120),
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    ConnectedIdle,
    ConnectedPlaying,
    ConnectedPaused,
}

/// Read-only snapshot returned by [`PlaybackSession::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub now_playing: Option<Track>,
    pub queue: Vec<Track>,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Joined,
    AlreadyHere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A user asked the bot to leave.
    Requested,
    /// Nothing was requested during the idle window.
    IdleTimeout,
    /// The voice connection went away underneath us.
    ConnectionLost,
}

/// Player lifecycle changes reported by the voice backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Playing,
    Idle,
    Error(String),
}

enum Inbox {
    Connect {
        guild_id: GuildId,
        channel_id: ChannelId,
        reply_to: ChannelId,
        respond: oneshot::Sender<Result<ConnectOutcome, SessionError>>,
    },
    Enqueue {
        entry: QueueEntry,
        respond: oneshot::Sender<usize>,
    },
    InsertNext {
        entry: QueueEntry,
        respond: oneshot::Sender<()>,
    },
    Skip {
        reply_to: ChannelId,
        respond: oneshot::Sender<()>,
    },
    Pause {
        reply_to: ChannelId,
        respond: oneshot::Sender<bool>,
    },
    Unpause {
        respond: oneshot::Sender<bool>,
    },
    Status {
        respond: oneshot::Sender<SessionStatus>,
    },
    Stop {
        reason: StopReason,
        respond: oneshot::Sender<()>,
    },
    VoiceMoved {
        guild_id: GuildId,
        from: ChannelId,
        to: Option<ChannelId>,
    },
    Player {
        generation: u64,
        event: PlayerEvent,
    },
    Disconnected {
        epoch: u64,
    },
    IdleElapsed {
        epoch: u64,
    },
    RetryDue {
        generation: u64,
    },
}

/// Handle for feeding asynchronous events back into a session.
///
/// Holds a weak reference to the inbox: once every [`PlaybackSession`] is
/// dropped, events are discarded.
#[derive(Clone)]
pub struct SessionEvents {
    inbox: mpsc::WeakUnboundedSender<Inbox>,
}

impl SessionEvents {
    pub fn player(&self, generation: u64, event: PlayerEvent) {
        self.send(Inbox::Player { generation, event });
    }

    pub fn disconnected(&self, epoch: u64) {
        self.send(Inbox::Disconnected { epoch });
    }

    fn idle_elapsed(&self, epoch: u64) {
        self.send(Inbox::IdleElapsed { epoch });
    }

    fn retry_due(&self, generation: u64) {
        self.send(Inbox::RetryDue { generation });
    }

    fn send(&self, message: Inbox) {
        let delivered = self
            .inbox
            .upgrade()
            .is_some_and(|inbox| inbox.send(message).is_ok());

        if !delivered {
            debug!("📭 Sesión cerrada, evento descartado");
        }
    }
}

/// The single playback session: one player, at most one voice connection,
/// one queue.
///
/// All state lives in a dedicated task; this handle only posts requests to it,
/// so commands and player callbacks are applied one at a time.
#[derive(Clone)]
pub struct PlaybackSession {
    inbox: mpsc::UnboundedSender<Inbox>,
}

impl PlaybackSession {
    /// Starts the session task.
    ///
    /// # Arguments
    /// * `backend` - Voice connection and player driven by the session
    /// * `notifier` - Where user-facing notices are sent
    /// * `settings` - Idle window and retry policy
    pub fn spawn<B: VoiceBackend>(
        backend: B,
        notifier: Arc<dyn Notifier>,
        settings: SessionSettings,
    ) -> Self {
        let (inbox, mailbox) = mpsc::unbounded_channel();
        let actor = SessionActor {
            backend,
            notifier,
            settings,
            events: SessionEvents {
                inbox: inbox.downgrade(),
            },
            queue: TrackQueue::default(),
            now_playing: None,
            connection: None,
            retry_count: 0,
            generation: 0,
            connection_epoch: 0,
            idle: IdleTimer::default(),
            paused: false,
            announce_to: None,
        };

        tokio::spawn(actor.run(mailbox));
        Self { inbox }
    }

    /// Binds the session to a voice channel.
    ///
    /// Asking for the channel already bound is a successful no-op; any other
    /// channel is rejected while a connection exists.
    pub async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        reply_to: ChannelId,
    ) -> Result<ConnectOutcome, SessionError> {
        self.request(|respond| Inbox::Connect {
            guild_id,
            channel_id,
            reply_to,
            respond,
        })
        .await?
    }

    /// Appends a track and returns its 1-based queue position.
    pub async fn enqueue(&self, track: Track, reply_to: ChannelId) -> Result<usize, SessionError> {
        self.request(|respond| Inbox::Enqueue {
            entry: QueueEntry::new(track, reply_to),
            respond,
        })
        .await
    }

    /// Puts a track at the head of the queue without starting playback.
    pub async fn insert_next(&self, track: Track, reply_to: ChannelId) -> Result<(), SessionError> {
        self.request(|respond| Inbox::InsertNext {
            entry: QueueEntry::new(track, reply_to),
            respond,
        })
        .await
    }

    pub async fn skip(&self, reply_to: ChannelId) -> Result<(), SessionError> {
        self.request(|respond| Inbox::Skip { reply_to, respond })
            .await
    }

    /// Returns whether the player was paused.
    pub async fn pause(&self, reply_to: ChannelId) -> Result<bool, SessionError> {
        self.request(|respond| Inbox::Pause { reply_to, respond })
            .await
    }

    /// Returns whether the player was resumed.
    pub async fn unpause(&self) -> Result<bool, SessionError> {
        self.request(|respond| Inbox::Unpause { respond }).await
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        self.request(|respond| Inbox::Status { respond }).await
    }

    /// Stops playback, leaves the voice channel and clears the queue.
    pub async fn completely_stop(&self, reason: StopReason) -> Result<(), SessionError> {
        self.request(|respond| Inbox::Stop { reason, respond })
            .await
    }

    /// Gateway notice that the bot was moved out of `from`, either into `to`
    /// or out of voice entirely.
    pub fn voice_state_changed(&self, guild_id: GuildId, from: ChannelId, to: Option<ChannelId>) {
        if self
            .inbox
            .send(Inbox::VoiceMoved { guild_id, from, to })
            .is_err()
        {
            debug!("📭 Sesión cerrada, aviso de voz descartado");
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Inbox,
    ) -> Result<T, SessionError> {
        let (respond, response) = oneshot::channel();
        self.inbox
            .send(build(respond))
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }
}

struct Connection {
    guild_id: GuildId,
    channel_id: ChannelId,
    epoch: u64,
}

/// Auto-teardown timer. Every disarm bumps the epoch so a wake-up that was
/// already in flight is recognised as stale.
#[derive(Default)]
struct IdleTimer {
    epoch: u64,
    armed: bool,
    task: Option<JoinHandle<()>>,
}

impl IdleTimer {
    fn arm(&mut self, window: Duration, events: SessionEvents) {
        self.disarm();
        self.armed = true;

        let epoch = self.epoch;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            events.idle_elapsed(epoch);
        }));
    }

    fn disarm(&mut self) {
        self.epoch += 1;
        self.armed = false;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.armed && self.epoch == epoch
    }
}

struct SessionActor<B> {
    backend: B,
    notifier: Arc<dyn Notifier>,
    settings: SessionSettings,
    events: SessionEvents,
    queue: TrackQueue,
    now_playing: Option<QueueEntry>,
    connection: Option<Connection>,
    retry_count: u32,
    /// Bumped on every load and every abandon; player events carry it.
    generation: u64,
    connection_epoch: u64,
    idle: IdleTimer,
    paused: bool,
    /// Reply target of the most recently loaded entry.
    announce_to: Option<ChannelId>,
}

impl<B: VoiceBackend> SessionActor<B> {
    async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<Inbox>) {
        debug!("🎛️ Sesión de reproducción iniciada");

        while let Some(message) = mailbox.recv().await {
            self.handle(message).await;
        }

        self.idle.disarm();
        debug!("🎛️ Sesión de reproducción finalizada");
    }

    async fn handle(&mut self, message: Inbox) {
        match message {
            Inbox::Connect {
                guild_id,
                channel_id,
                reply_to,
                respond,
            } => {
                let outcome = self.connect(guild_id, channel_id, reply_to).await;
                let _ = respond.send(outcome);
            }
            Inbox::Enqueue { entry, respond } => {
                let position = self.enqueue(entry).await;
                let _ = respond.send(position);
            }
            Inbox::InsertNext { entry, respond } => {
                self.queue.push_front(entry);
                let _ = respond.send(());
            }
            Inbox::Skip { reply_to, respond } => {
                self.skip(reply_to).await;
                let _ = respond.send(());
            }
            Inbox::Pause { reply_to, respond } => {
                let paused = self.pause(reply_to).await;
                let _ = respond.send(paused);
            }
            Inbox::Unpause { respond } => {
                let resumed = self.unpause().await;
                let _ = respond.send(resumed);
            }
            Inbox::Status { respond } => {
                let _ = respond.send(self.status());
            }
            Inbox::Stop { reason, respond } => {
                self.completely_stop(reason).await;
                let _ = respond.send(());
            }
            Inbox::VoiceMoved { guild_id, from, to } => {
                let Some(connection) = self
                    .connection
                    .as_mut()
                    .filter(|c| c.guild_id == guild_id && c.channel_id == from)
                else {
                    return;
                };

                match to {
                    Some(channel_id) => {
                        info!("🔀 Bot movido del canal de voz {} a {}", from, channel_id);
                        connection.channel_id = channel_id;
                    }
                    None => {
                        warn!("🔌 El bot fue retirado del canal de voz {}", from);
                        self.completely_stop(StopReason::ConnectionLost).await;
                    }
                }
            }
            Inbox::Player { generation, event } => {
                if generation != self.generation {
                    debug!(
                        "Evento {:?} obsoleto ignorado (generación {}, actual {})",
                        event, generation, self.generation
                    );
                    return;
                }
                self.on_player_event(event).await;
            }
            Inbox::Disconnected { epoch } => {
                if self.connection.as_ref().is_some_and(|c| c.epoch == epoch) {
                    self.completely_stop(StopReason::ConnectionLost).await;
                } else {
                    debug!("Desconexión obsoleta ignorada (época {})", epoch);
                }
            }
            Inbox::IdleElapsed { epoch } => {
                if self.idle.is_current(epoch)
                    && self.now_playing.is_none()
                    && self.queue.is_empty()
                {
                    info!("💤 Sin actividad, cerrando la sesión");
                    self.completely_stop(StopReason::IdleTimeout).await;
                }
            }
            Inbox::RetryDue { generation } => {
                if generation != self.generation {
                    return;
                }
                let Some(entry) = self.now_playing.clone() else {
                    return;
                };

                info!(
                    "🔁 Reintentando {} ({}/{})",
                    entry.track.title(),
                    self.retry_count,
                    self.settings.max_retries
                );
                let reply_to = entry.reply_to;
                if !self.load(entry, false).await {
                    self.play_next(Some(reply_to)).await;
                }
            }
        }
    }

    async fn connect(
        &mut self,
        guild_id: GuildId,
        channel_id: ChannelId,
        reply_to: ChannelId,
    ) -> Result<ConnectOutcome, SessionError> {
        if let Some(connection) = &self.connection {
            if connection.guild_id == guild_id && connection.channel_id == channel_id {
                return Ok(ConnectOutcome::AlreadyHere);
            }
            warn!(
                "Conexión rechazada a {}: ya conectado a {}",
                channel_id, connection.channel_id
            );
            return Err(SessionError::AlreadyConnectedElsewhere);
        }

        self.connection_epoch += 1;
        self.backend
            .join(guild_id, channel_id, self.connection_epoch, self.events.clone())
            .await?;

        self.connection = Some(Connection {
            guild_id,
            channel_id,
            epoch: self.connection_epoch,
        });
        self.announce_to = Some(reply_to);

        if self.now_playing.is_none() && !self.queue.is_empty() {
            self.play_next(Some(reply_to)).await;
        }

        Ok(ConnectOutcome::Joined)
    }

    async fn enqueue(&mut self, entry: QueueEntry) -> usize {
        let title = entry.track.title().to_string();
        let reply_to = entry.reply_to;
        let position = self.queue.push_back(entry);
        self.notifier
            .notify(reply_to, messages::queued(&title, position));

        if self.now_playing.is_none() && self.connection.is_some() {
            self.play_next(Some(reply_to)).await;
        }

        position
    }

    async fn skip(&mut self, reply_to: ChannelId) {
        if let Some(entry) = self.now_playing.take() {
            info!("⏭️ Saltando: {}", entry.track.title());
            self.generation += 1;
            self.backend.stop().await;
        }

        self.retry_count = 0;
        self.paused = false;
        self.play_next(Some(reply_to)).await;
    }

    /// Loads queue entries until one starts or the queue runs dry.
    async fn play_next(&mut self, notice_to: Option<ChannelId>) {
        let notice_to = notice_to.or(self.announce_to);

        if self.connection.is_none() {
            if let Some(channel_id) = notice_to {
                let notice = if self.queue.is_empty() {
                    messages::queue_empty()
                } else {
                    messages::not_connected()
                };
                self.notifier.notify(channel_id, notice);
            }
            return;
        }

        while let Some(entry) = self.queue.pop_front() {
            self.retry_count = 0;
            if self.load(entry, true).await {
                return;
            }
        }

        self.now_playing = None;
        if let Some(channel_id) = notice_to {
            self.notifier.notify(channel_id, messages::queue_empty());
        }
        self.idle.arm(self.settings.idle_timeout, self.events.clone());
        debug!("⏳ Cola vacía, temporizador de inactividad armado");
    }

    /// Hands `entry` to the player. Returns `false` when the player refused it.
    async fn load(&mut self, entry: QueueEntry, announce: bool) -> bool {
        self.idle.disarm();
        self.generation += 1;
        self.paused = false;
        self.announce_to = Some(entry.reply_to);

        match self
            .backend
            .load(&entry.track, self.generation, self.events.clone())
            .await
        {
            Ok(()) => {
                info!("🎵 Reproduciendo: {}", entry.track.title());
                if announce {
                    self.notifier
                        .notify(entry.reply_to, messages::now_playing(entry.track.title()));
                }
                self.now_playing = Some(entry);
                true
            }
            Err(why) => {
                warn!("No se pudo reproducir {}: {}", entry.track.url(), why);
                self.notifier
                    .notify(entry.reply_to, messages::cannot_play(entry.track.title()));
                self.now_playing = None;
                false
            }
        }
    }

    async fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Playing => {
                self.retry_count = 0;
                self.paused = false;
                self.idle.disarm();
            }
            PlayerEvent::Idle => {
                if let Some(entry) = self.now_playing.take() {
                    debug!("✅ Terminó: {}", entry.track.title());
                }
                self.paused = false;

                if !self.queue.is_empty() {
                    self.play_next(None).await;
                } else if self.connection.is_some() {
                    self.idle.arm(self.settings.idle_timeout, self.events.clone());
                    debug!("⏳ Temporizador de inactividad armado");
                }
            }
            PlayerEvent::Error(message) => {
                let Some(entry) = self.now_playing.clone() else {
                    return;
                };
                let title = entry.track.title().to_string();

                self.generation += 1;
                self.paused = false;
                self.backend.stop().await;

                match classify_failure(&message) {
                    FailureClass::Transient if self.retry_count < self.settings.max_retries => {
                        self.retry_count += 1;
                        warn!(
                            "⚠️ Fallo transitorio en {} ({}/{}): {}",
                            title, self.retry_count, self.settings.max_retries, message
                        );
                        self.notifier.notify(
                            entry.reply_to,
                            messages::retrying(&title, self.retry_count, self.settings.max_retries),
                        );
                        self.schedule_retry();
                    }
                    FailureClass::Transient => {
                        warn!("❌ Reintentos agotados para {}", title);
                        self.retry_count = 0;
                        self.now_playing = None;
                        self.notifier
                            .notify(entry.reply_to, messages::giving_up(&title));
                        self.play_next(Some(entry.reply_to)).await;
                    }
                    FailureClass::Fatal => {
                        warn!("❌ Error de reproducción en {}: {}", title, message);
                        self.retry_count = 0;
                        self.now_playing = None;
                        self.notifier
                            .notify(entry.reply_to, messages::cannot_play(&title));
                        self.play_next(Some(entry.reply_to)).await;
                    }
                }
            }
        }
    }

    fn schedule_retry(&self) {
        let generation = self.generation;
        let delay = self.settings.retry_delay;
        let events = self.events.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.retry_due(generation);
        });
    }

    async fn pause(&mut self, reply_to: ChannelId) -> bool {
        if self.now_playing.is_none() || self.paused {
            self.notifier.notify(reply_to, messages::cannot_pause());
            return false;
        }

        match self.backend.pause().await {
            Ok(()) => {
                self.paused = true;
                true
            }
            Err(why) => {
                warn!("No se pudo pausar: {}", why);
                self.notifier.notify(reply_to, messages::cannot_pause());
                false
            }
        }
    }

    async fn unpause(&mut self) -> bool {
        if !self.paused {
            return false;
        }

        match self.backend.resume().await {
            Ok(()) => {
                self.paused = false;
                true
            }
            Err(why) => {
                warn!("No se pudo reanudar: {}", why);
                false
            }
        }
    }

    fn phase(&self) -> SessionPhase {
        match (&self.connection, &self.now_playing) {
            (None, _) => SessionPhase::Disconnected,
            (Some(_), None) => SessionPhase::ConnectedIdle,
            (Some(_), Some(_)) if self.paused => SessionPhase::ConnectedPaused,
            (Some(_), Some(_)) => SessionPhase::ConnectedPlaying,
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase(),
            now_playing: self.now_playing.as_ref().map(|entry| entry.track.clone()),
            queue: self.queue.tracks(),
            retry_count: self.retry_count,
        }
    }

    async fn completely_stop(&mut self, reason: StopReason) {
        let was_active =
            self.connection.is_some() || self.now_playing.is_some() || !self.queue.is_empty();

        self.idle.disarm();
        self.generation += 1;

        if !was_active {
            debug!("Sesión ya detenida ({:?})", reason);
            return;
        }

        self.backend.stop().await;
        self.now_playing = None;
        self.paused = false;
        self.retry_count = 0;
        let dropped = self.queue.clear();

        if let Some(connection) = self.connection.take() {
            if let Err(why) = self.backend.leave(connection.guild_id).await {
                warn!("Error al salir del canal de voz: {}", why);
            }
        }

        info!(
            "🛑 Sesión detenida ({:?}), {} tracks descartados de la cola",
            reason, dropped
        );

        if let (Some(text), Some(channel_id)) = (messages::teardown(reason), self.announce_to) {
            self.notifier.notify(channel_id, text);
        }
    }
}
