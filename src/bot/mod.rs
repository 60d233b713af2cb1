//! # Bot Module
//!
//! Gateway side of the jukebox: turns Discord events into calls on the
//! [`Dispatcher`] and the playback session.
//!
//! - [`parser`] splits prefixed chat lines into a name and arguments
//! - [`commands`] is the table of recognised commands and aliases
//! - [`handlers`] runs a command against the session and renders the reply

use serenity::{
    all::{Context, EventHandler, Message, Ready, VoiceState},
    async_trait,
};
use tracing::{debug, info};

pub mod commands;
pub mod handlers;
pub mod parser;

use handlers::{Dispatcher, MessageOrigin};

/// Serenity event handler for the jukebox.
pub struct JukeboxBot {
    dispatcher: Dispatcher,
}

impl JukeboxBot {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Collects the guild, text channel and the author's voice channel.
    fn origin(ctx: &Context, msg: &Message) -> MessageOrigin {
        let voice_channel = msg.guild(&ctx.cache).and_then(|guild| {
            guild
                .voice_states
                .get(&msg.author.id)
                .and_then(|state| state.channel_id)
        });

        MessageOrigin {
            guild_id: msg.guild_id,
            channel_id: msg.channel_id,
            voice_channel,
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!(
            "⌨️ Prefijo de comandos: {}",
            self.dispatcher.prefix()
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !msg.content.starts_with(self.dispatcher.prefix()) {
            return;
        }

        let origin = Self::origin(&ctx, &msg);
        debug!(
            "💬 Mensaje de {} en canal {}: {}",
            msg.author.name, msg.channel_id, msg.content
        );

        self.dispatcher.dispatch(&msg.content, &origin).await;
    }

    /// Keeps the session's channel binding in sync when someone moves the
    /// bot or disconnects it from voice by hand.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if new.user_id != ctx.cache.current_user().id {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };
        let Some(from) = old.and_then(|state| state.channel_id) else {
            return;
        };
        if new.channel_id == Some(from) {
            return;
        }

        match new.channel_id {
            Some(to) => info!("🔀 Bot movido del canal {} a {} en guild {}", from, to, guild_id),
            None => info!("🔌 Bot desconectado del canal {} en guild {}", from, guild_id),
        }
        self.dispatcher
            .session()
            .voice_state_changed(guild_id, from, new.channel_id);
    }
}
