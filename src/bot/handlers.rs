use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    audio::session::{PlaybackSession, StopReason},
    bot::{
        commands::{self, CommandKind},
        parser::{self, ParseOutcome, ParsedCommand},
    },
    error::CommandError,
    sources::TrackResolver,
    ui::{messages, Notifier},
};

/// Where a chat message came from.
#[derive(Debug, Clone, Copy)]
pub struct MessageOrigin {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    /// Voice channel the author is sitting in, if any.
    pub voice_channel: Option<ChannelId>,
}

/// Routes parsed commands to the playback session and replies in the
/// originating channel.
pub struct Dispatcher {
    prefix: String,
    session: PlaybackSession,
    resolver: Arc<dyn TrackResolver>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        prefix: impl Into<String>,
        session: PlaybackSession,
        resolver: Arc<dyn TrackResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            session,
            resolver,
            notifier,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Handles one chat line. Lines without the prefix are ignored; any
    /// handler error becomes a single reply.
    pub async fn dispatch(&self, content: &str, origin: &MessageOrigin) {
        let outcome = match parser::parse(&self.prefix, content) {
            ParseOutcome::NotACommand => return,
            ParseOutcome::Malformed(why) => Err(CommandError::from(why)),
            ParseOutcome::Command(command) => self.run(&command, origin).await,
        };

        match outcome {
            Ok(Some(reply)) => self.notifier.notify(origin.channel_id, reply),
            Ok(None) => {}
            Err(why) => {
                warn!("⚠️ Comando fallido en canal {}: {}", origin.channel_id, why);
                self.notifier
                    .notify(origin.channel_id, messages::command_error(&why));
            }
        }
    }

    async fn run(
        &self,
        command: &ParsedCommand,
        origin: &MessageOrigin,
    ) -> Result<Option<String>, CommandError> {
        let spec = commands::lookup(&command.name)
            .ok_or_else(|| CommandError::UnknownCommand(command.name.clone()))?;

        info!(
            "📝 Comando {}{} en canal {}",
            self.prefix, spec.name, origin.channel_id
        );

        let reply_to = origin.channel_id;
        match spec.kind {
            CommandKind::Play => match command.args.first() {
                None => self.resume().await,
                Some(url) => self.play(url, origin).await,
            },
            CommandKind::AddNext => {
                let url = command
                    .args
                    .first()
                    .ok_or(CommandError::MissingArgument("url"))?;
                let track = self.resolver.resolve(url).await?;
                let reply = messages::queued_next(track.title());
                self.session.insert_next(track, reply_to).await?;
                Ok(Some(reply))
            }
            CommandKind::Pause => {
                let paused = self.session.pause(reply_to).await?;
                Ok(paused.then(messages::paused))
            }
            CommandKind::Unpause => self.resume().await,
            CommandKind::Next => {
                self.session.skip(reply_to).await?;
                Ok(None)
            }
            CommandKind::Status => {
                let status = self.session.status().await?;
                Ok(Some(messages::status(&status)))
            }
            CommandKind::Help => Ok(Some(messages::help(&self.prefix, &commands::sorted()))),
            CommandKind::Kick => {
                self.session.completely_stop(StopReason::Requested).await?;
                Ok(Some(messages::kicked()))
            }
        }
    }

    async fn play(&self, url: &str, origin: &MessageOrigin) -> Result<Option<String>, CommandError> {
        let guild_id = origin.guild_id.ok_or(CommandError::NotInGuild)?;
        let track = self.resolver.resolve(url).await?;
        let voice_channel = origin
            .voice_channel
            .ok_or(CommandError::NotInVoiceChannel)?;

        self.session
            .connect(guild_id, voice_channel, origin.channel_id)
            .await?;
        self.session.enqueue(track, origin.channel_id).await?;

        Ok(None)
    }

    async fn resume(&self) -> Result<Option<String>, CommandError> {
        let resumed = self.session.unpause().await?;
        Ok(resumed.then(messages::resumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{
            player::testing::FakeBackend,
            session::{SessionPhase, SessionSettings},
        },
        error::ResolveError,
        sources::{MockTrackResolver, Track},
        ui::notifier::testing::RecordingNotifier,
    };
    use pretty_assertions::assert_eq;

    const SONG: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn in_voice() -> MessageOrigin {
        MessageOrigin {
            guild_id: Some(GuildId::new(1)),
            channel_id: ChannelId::new(20),
            voice_channel: Some(ChannelId::new(10)),
        }
    }

    struct Fixture {
        dispatcher: Dispatcher,
        backend: FakeBackend,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(resolver: MockTrackResolver) -> Fixture {
        let backend = FakeBackend::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let session = PlaybackSession::spawn(
            backend.clone(),
            notifier.clone(),
            SessionSettings::default(),
        );
        let dispatcher = Dispatcher::new("!", session, Arc::new(resolver), notifier.clone());

        Fixture {
            dispatcher,
            backend,
            notifier,
        }
    }

    fn resolving(title: &'static str) -> MockTrackResolver {
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .returning(move |url| Ok(Track::new(url, title)));
        resolver
    }

    #[tokio::test]
    async fn play_connects_and_enqueues() {
        let fx = fixture(resolving("Never Gonna Give You Up"));

        fx.dispatcher
            .dispatch(&format!("!play {SONG}"), &in_voice())
            .await;

        assert_eq!(
            fx.backend.state().joins,
            vec![(GuildId::new(1), ChannelId::new(10))]
        );
        assert_eq!(fx.backend.load_titles(), vec!["Never Gonna Give You Up"]);
        assert!(fx.notifier.contains("Position **1**"));
        assert!(fx.notifier.contains("Now playing"));
    }

    #[tokio::test]
    async fn play_requires_a_voice_channel() {
        let fx = fixture(resolving("Song"));
        let origin = MessageOrigin {
            voice_channel: None,
            ..in_voice()
        };

        fx.dispatcher.dispatch(&format!("!play {SONG}"), &origin).await;

        assert_eq!(
            fx.notifier.messages(),
            vec!["⚠️ user is not in a voice channel"]
        );
        assert!(fx.backend.state().joins.is_empty());
    }

    #[tokio::test]
    async fn play_outside_a_server_is_rejected() {
        let fx = fixture(MockTrackResolver::new());
        let origin = MessageOrigin {
            guild_id: None,
            ..in_voice()
        };

        fx.dispatcher.dispatch(&format!("!play {SONG}"), &origin).await;

        assert!(fx.notifier.contains("only works inside a server"));
    }

    #[tokio::test]
    async fn unresolvable_links_never_reach_the_queue() {
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(ResolveError::MissingVideoId));
        let fx = fixture(resolver);

        fx.dispatcher
            .dispatch("!play https://www.youtube.com/", &in_voice())
            .await;

        assert_eq!(
            fx.notifier.messages(),
            vec!["⚠️ unable to get video title (video ID not found in URL)"]
        );
        let status = fx.dispatcher.session().status().await.unwrap();
        assert_eq!(status.phase, SessionPhase::Disconnected);
        assert!(status.queue.is_empty());
    }

    #[tokio::test]
    async fn play_without_link_resumes() {
        let fx = fixture(resolving("Song"));
        fx.dispatcher
            .dispatch(&format!("!play {SONG}"), &in_voice())
            .await;
        fx.dispatcher.dispatch("!pause", &in_voice()).await;
        assert!(fx.notifier.contains(&messages::paused()));

        fx.notifier.clear();
        fx.dispatcher.dispatch("!play", &in_voice()).await;

        assert_eq!(fx.notifier.messages(), vec![messages::resumed()]);
        assert!(!fx.backend.state().paused);
    }

    #[tokio::test]
    async fn add_next_needs_a_link() {
        let fx = fixture(MockTrackResolver::new());

        fx.dispatcher.dispatch("!pn", &in_voice()).await;

        assert_eq!(
            fx.notifier.messages(),
            vec!["⚠️ missing required argument: url"]
        );
    }

    #[tokio::test]
    async fn add_next_jumps_the_queue() {
        let fx = fixture(resolving("Song"));
        fx.dispatcher
            .dispatch(&format!("!play {SONG}"), &in_voice())
            .await;
        fx.dispatcher
            .dispatch("!play https://youtu.be/aaaaaaaaaaa", &in_voice())
            .await;

        fx.dispatcher
            .dispatch("!insertNext https://youtu.be/bbbbbbbbbbb", &in_voice())
            .await;

        let status = fx.dispatcher.session().status().await.unwrap();
        let urls: Vec<_> = status.queue.iter().map(|t| t.url().to_string()).collect();
        assert_eq!(
            urls,
            vec!["https://youtu.be/bbbbbbbbbbb", "https://youtu.be/aaaaaaaaaaa"]
        );
        assert!(fx.notifier.contains("Coming up right after this one"));
    }

    #[tokio::test]
    async fn status_and_help_reply_in_channel() {
        let fx = fixture(MockTrackResolver::new());

        fx.dispatcher.dispatch("!queue", &in_voice()).await;
        fx.dispatcher.dispatch("!help", &in_voice()).await;

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(channel, _)| *channel == ChannelId::new(20)));
        assert!(sent[0].1.contains("**Queue is empty**"));
        assert!(sent[1].1.contains("addNext - "));
        assert!(sent[1].1.find("help - ") < sent[1].1.find("play - "));
    }

    #[tokio::test]
    async fn kick_leaves_the_channel() {
        let fx = fixture(resolving("Song"));
        fx.dispatcher
            .dispatch(&format!("!play {SONG}"), &in_voice())
            .await;
        fx.notifier.clear();

        fx.dispatcher.dispatch("!stop", &in_voice()).await;

        assert_eq!(fx.notifier.messages(), vec![messages::kicked()]);
        assert_eq!(fx.backend.state().leaves, vec![GuildId::new(1)]);
    }

    #[tokio::test]
    async fn unknown_and_malformed_commands_are_reported() {
        let fx = fixture(MockTrackResolver::new());

        fx.dispatcher.dispatch("!volume 11", &in_voice()).await;
        fx.dispatcher.dispatch("!", &in_voice()).await;
        fx.dispatcher.dispatch("just chatting", &in_voice()).await;

        assert_eq!(
            fx.notifier.messages(),
            vec!["⚠️ unknown command `volume`", "⚠️ empty command"]
        );
    }
}
