use anyhow::Result;
use serenity::{http::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{
    player::SongbirdBackend,
    session::{PlaybackSession, StopReason},
};
use crate::bot::{handlers::Dispatcher, JukeboxBot};
use crate::config::Config;
use crate::sources::{YouTubeAPIv3Client, YtDlpSource};
use crate::ui::ChannelNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Jukebox v{}", env!("CARGO_PKG_VERSION"));

    // Manejar health check antes de exigir credenciales
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("⚙️ {}", config.summary());

    // Notificaciones al canal de texto
    let http = Arc::new(Http::new(&config.discord_token));
    let notifier = Arc::new(ChannelNotifier::spawn(http));

    // Sesión de reproducción única
    let songbird = Songbird::serenity();
    let source = Arc::new(YtDlpSource::new(reqwest::Client::new()));
    let backend = SongbirdBackend::new(songbird.clone(), source);
    let session = PlaybackSession::spawn(backend, notifier.clone(), config.session_settings());

    let resolver = Arc::new(YouTubeAPIv3Client::new(
        config.youtube_api_key.clone(),
        config.api_timeout,
    )?);
    let dispatcher = Dispatcher::new(
        config.command_prefix.clone(),
        session.clone(),
        resolver,
        notifier,
    );

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(JukeboxBot::new(dispatcher))
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", why);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");

        if let Err(why) = session.completely_stop(StopReason::Requested).await {
            warn!("No se pudo detener la sesión: {}", why);
        }
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    // yt-dlp alimenta todos los streams de audio
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    if yt_dlp.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes: yt-dlp");
    }
}
