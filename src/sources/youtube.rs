use regex::Regex;
use songbird::input::{Input, YoutubeDl};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

use super::{AudioSource, Track};
use crate::error::{PlaybackError, ResolveError};

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video ID pattern is valid"));

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Checks whether `url` points at a single YouTube video.
pub fn is_youtube_url(url: &str) -> bool {
    video_id(url).is_ok()
}

/// Extracts the video ID from a YouTube URL.
///
/// Supports `watch?v=`, `youtu.be/`, `shorts/` and `embed/` forms on the
/// desktop, mobile and music hosts.
pub fn video_id(url: &str) -> Result<String, ResolveError> {
    let parsed = Url::parse(url).map_err(|_| ResolveError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ResolveError::InvalidUrl(url.to_string()));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ResolveError::InvalidUrl(url.to_string()))?;

    let candidate = if host == "youtu.be" {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host) {
        let mut segments = parsed.path_segments().into_iter().flatten();
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts") | Some("embed") | Some("v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        return Err(ResolveError::InvalidUrl(url.to_string()));
    };

    candidate
        .filter(|id| VIDEO_ID.is_match(id))
        .ok_or(ResolveError::MissingVideoId)
}

/// Audio source backed by songbird's yt-dlp input.
pub struct YtDlpSource {
    client: reqwest::Client,
}

impl YtDlpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AudioSource for YtDlpSource {
    fn open(&self, track: &Track) -> Result<Input, PlaybackError> {
        if !is_youtube_url(track.url()) {
            warn!("❌ URL de YouTube inválida: {}", track.url());
            return Err(PlaybackError::InvalidSource(track.url().to_string()));
        }

        debug!("🎵 Creando input yt-dlp para: {}", track.title());
        let source = YoutubeDl::new(self.client.clone(), track.url().to_string());

        Ok(source.into())
    }
}
