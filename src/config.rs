use anyhow::{Context, Result};
use std::time::Duration;

use crate::audio::session::SessionSettings;

#[derive(Debug, Clone)]
pub struct Config {
    // Credenciales
    pub discord_token: String,
    pub youtube_api_key: String,

    // Comandos
    pub command_prefix: String,

    // Reproducción
    pub idle_timeout: Duration,
    pub max_playback_retries: u32,
    pub retry_delay: Duration,

    // APIs
    pub api_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?,
            youtube_api_key: std::env::var("YOUTUBE_API_KEY")
                .context("YOUTUBE_API_KEY is not set")?,

            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),

            idle_timeout: duration_var("IDLE_TIMEOUT", "2m")?,
            max_playback_retries: std::env::var("MAX_PLAYBACK_RETRIES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_PLAYBACK_RETRIES must be a non-negative integer")?,
            retry_delay: duration_var("RETRY_DELAY", "2s")?,

            api_timeout: duration_var("API_TIMEOUT", "5s")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token and API key must not be empty
    /// - The command prefix must be non-empty and contain no whitespace
    /// - Idle window, retry delay and API timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("Discord token must not be empty");
        }

        if self.youtube_api_key.trim().is_empty() {
            anyhow::bail!("YouTube API key must not be empty");
        }

        if self.command_prefix.is_empty() {
            anyhow::bail!("Command prefix must not be empty");
        }

        if self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "Command prefix must not contain whitespace, got: {:?}",
                self.command_prefix
            );
        }

        if self.idle_timeout.is_zero() {
            anyhow::bail!("Idle timeout must be greater than 0");
        }

        if self.retry_delay.is_zero() {
            anyhow::bail!("Retry delay must be greater than 0");
        }

        if self.api_timeout.is_zero() {
            anyhow::bail!("API timeout must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Credentials are never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix {:?}\n  \
            Playback: idle {}, {} retries every {}\n  \
            APIs: timeout {}",
            self.command_prefix,
            humantime::format_duration(self.idle_timeout),
            self.max_playback_retries,
            humantime::format_duration(self.retry_delay),
            humantime::format_duration(self.api_timeout),
        )
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            idle_timeout: self.idle_timeout,
            max_retries: self.max_playback_retries,
            retry_delay: self.retry_delay,
        }
    }
}

fn duration_var(name: &str, default: &str) -> Result<Duration> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    humantime::parse_duration(&raw).with_context(|| format!("{name} is not a valid duration: {raw:?}"))
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Credenciales (sin valores por defecto)
            discord_token: String::new(),
            youtube_api_key: String::new(),

            command_prefix: "!".to_string(),

            idle_timeout: Duration::from_secs(120),
            max_playback_retries: 5,
            retry_delay: Duration::from_secs(2),

            api_timeout: Duration::from_secs(5),
        }
    }
}
