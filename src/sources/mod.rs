pub mod youtube;
pub mod youtube_api_v3;

use async_trait::async_trait;
use songbird::input::Input;

use crate::error::{PlaybackError, ResolveError};

pub use youtube::YtDlpSource;
pub use youtube_api_v3::YouTubeAPIv3Client;

/// Resolves a user supplied URL into a playable [`Track`].
///
/// Failures are reported to the requester and never retried here; retries
/// only apply once a track is loaded in the player.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<Track, ResolveError>;
}

/// Opens the audio stream of a track for the voice driver.
///
/// The returned input is consumed lazily by songbird; nothing is downloaded
/// until the driver starts pulling bytes.
pub trait AudioSource: Send + Sync {
    fn open(&self, track: &Track) -> Result<Input, PlaybackError>;
}

/// A playable request: the source URL plus a human readable title.
///
/// Two tracks with the same URL are the same request, but duplicates are
/// allowed to coexist in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    url: String,
    title: String,
}

impl Track {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
