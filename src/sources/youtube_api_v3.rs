use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{youtube, Track, TrackResolver};
use crate::error::ResolveError;

const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[allow(dead_code)]
    channel_title: Option<String>,
}

/// Title lookup through the YouTube Data API v3 `videos` endpoint.
pub struct YouTubeAPIv3Client {
    api_key: String,
    client: reqwest::Client,
}

impl YouTubeAPIv3Client {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { api_key, client })
    }

    /// Fetches the snippet title for a single video ID.
    pub async fn video_title(&self, video_id: &str) -> Result<String, ResolveError> {
        debug!("🔍 Consultando YouTube API v3 para video {}", video_id);

        let response = self
            .client
            .get(VIDEOS_ENDPOINT)
            .query(&[("part", "snippet"), ("id", video_id), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ YouTube API error: {} - {}", status, body);
            return Err(ResolveError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let listing: VideoListResponse = response.json().await?;
        first_title(listing).ok_or_else(|| ResolveError::NotFound(video_id.to_string()))
    }
}

fn first_title(listing: VideoListResponse) -> Option<String> {
    listing
        .items
        .into_iter()
        .next()
        .map(|item| item.snippet.title)
}

#[async_trait]
impl TrackResolver for YouTubeAPIv3Client {
    async fn resolve(&self, url: &str) -> Result<Track, ResolveError> {
        let video_id = youtube::video_id(url)?;
        let title = self.video_title(&video_id).await?;

        info!("✅ Título resuelto: {}", title);
        Ok(Track::new(url, title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_item_title() {
        let listing: VideoListResponse = serde_json::from_str(
            r#"{
                "kind": "youtube#videoListResponse",
                "items": [
                    {"id": "dQw4w9WgXcQ", "snippet": {"title": "Never Gonna Give You Up", "channelTitle": "Rick Astley"}},
                    {"id": "other", "snippet": {"title": "Second"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(first_title(listing).as_deref(), Some("Never Gonna Give You Up"));
    }

    #[test]
    fn empty_listing_has_no_title() {
        let listing: VideoListResponse =
            serde_json::from_str(r#"{"kind": "youtube#videoListResponse", "items": []}"#).unwrap();
        assert_eq!(first_title(listing), None);

        let listing: VideoListResponse = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert_eq!(first_title(listing), None);
    }

    #[tokio::test]
    async fn resolve_rejects_urls_without_video_id() {
        let client = YouTubeAPIv3Client::new("key".into(), Duration::from_secs(1)).unwrap();

        let result = client.resolve("https://www.youtube.com/watch?list=PL1").await;
        assert!(matches!(result, Err(ResolveError::MissingVideoId)));
    }
}
