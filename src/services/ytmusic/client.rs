use std::num::NonZeroU32;

use color_eyre::eyre::{Result, WrapErr};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};

use crate::ports::destination::{DestinationClient, DestinationTrack, SearchCategory};
use crate::ytmusic_rs::auth::BrowserHeaders;
use crate::ytmusic_rs::client::YtMusicClient;
use crate::ytmusic_rs::parse::YtMusicTrack;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Destination adapter over YouTube Music.
///
/// Every request waits on the adapter's own rate limiter first.
pub struct YtMusicHttpAdapter {
    client: YtMusicClient,
    rate_limiter: DirectRateLimiter,
}

impl YtMusicHttpAdapter {
    pub fn new(headers: BrowserHeaders, requests_per_second: NonZeroU32) -> Self {
        Self {
            client: YtMusicClient::new(headers),
            rate_limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        }
    }

    async fn throttle(&self) {
        self.rate_limiter.until_ready().await;
    }
}

impl From<YtMusicTrack> for DestinationTrack {
    fn from(track: YtMusicTrack) -> Self {
        Self {
            id: track.video_id,
            title: track.title,
            artists: track.artists,
        }
    }
}

#[async_trait::async_trait]
impl DestinationClient for YtMusicHttpAdapter {
    async fn search(&self, query: &str, category: SearchCategory) -> Result<Vec<DestinationTrack>> {
        self.throttle().await;
        let results = match category {
            SearchCategory::Songs => self.client.search_songs(query).await,
        }
        .wrap_err_with(|| format!("YouTube Music search failed for {query:?}"))?;

        Ok(results.into_iter().map(DestinationTrack::from).collect())
    }

    async fn fetch_liked(&self, limit: u32) -> Result<Vec<DestinationTrack>> {
        self.throttle().await;
        let liked = self
            .client
            .liked_songs(limit)
            .await
            .wrap_err("Failed to get liked songs from YouTube Music")?;

        Ok(liked.into_iter().map(DestinationTrack::from).collect())
    }

    async fn like(&self, id: &str) -> Result<()> {
        self.throttle().await;
        self.client
            .like_song(id)
            .await
            .wrap_err_with(|| format!("Failed to like {id} on YouTube Music"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_becomes_destination_track() {
        let track = DestinationTrack::from(YtMusicTrack {
            video_id: Some("dQw4w9WgXcQ".into()),
            title: Some("Never Gonna Give You Up".into()),
            artists: vec!["Rick Astley".into()],
        });

        assert_eq!(track.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(track.artists, vec!["Rick Astley"]);
    }
}
