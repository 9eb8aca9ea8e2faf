use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde_json::{Value, json};

use crate::ytmusic_rs::auth::BrowserHeaders;
use crate::ytmusic_rs::parse::{YtMusicTrack, find_continuation, parse_tracks};

const YTM_BASE_API: &str = "https://music.youtube.com/youtubei/v1/";

/// `params` restricting a search to the songs category.
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";

/// Browse id of the automatic "Liked Music" playlist.
const LIKED_MUSIC_BROWSE_ID: &str = "VLLM";

/// YouTube Music InnerTube client authenticated with browser headers.
pub struct YtMusicClient {
    client: reqwest::Client,
    headers: BrowserHeaders,
}

impl YtMusicClient {
    pub fn new(headers: BrowserHeaders) -> Self {
        Self {
            client: reqwest::Client::new(),
            headers,
        }
    }

    fn context() -> Value {
        let client_version = format!("1.{}.01.00", chrono::Utc::now().format("%Y%m%d"));
        json!({
            "client": {
                "clientName": "WEB_REMIX",
                "clientVersion": client_version,
                "hl": "en"
            },
            "user": {}
        })
    }

    async fn post(&self, endpoint: &str, mut body: Value) -> Result<Value> {
        body["context"] = Self::context();
        let headers = self
            .headers
            .to_header_map(chrono::Utc::now().timestamp())?;

        tracing::debug!("POST {}{}", YTM_BASE_API, endpoint);
        let response = self
            .client
            .post(format!("{YTM_BASE_API}{endpoint}"))
            .query(&[("alt", "json"), ("prettyPrint", "false")])
            .headers(headers)
            .json(&body)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .wrap_err_with(|| format!("Failed to send YouTube Music request to {endpoint}"))?
            .error_for_status()
            .wrap_err_with(|| format!("YouTube Music rejected request to {endpoint}"))?;

        response
            .json::<Value>()
            .await
            .wrap_err_with(|| format!("Failed to parse YouTube Music response from {endpoint}"))
    }

    /// Search restricted to songs, in YouTube Music's ranking order.
    pub async fn search_songs(&self, query: &str) -> Result<Vec<YtMusicTrack>> {
        let response = self
            .post(
                "search",
                json!({ "query": query, "params": SONGS_FILTER_PARAMS }),
            )
            .await?;
        Ok(parse_tracks(&response))
    }

    /// Rows of the "Liked Music" playlist, following continuations until
    /// `limit` rows are collected or the playlist ends.
    pub async fn liked_songs(&self, limit: u32) -> Result<Vec<YtMusicTrack>> {
        let limit = limit as usize;
        let response = self
            .post("browse", json!({ "browseId": LIKED_MUSIC_BROWSE_ID }))
            .await?;
        let mut tracks = parse_tracks(&response);
        let mut continuation = find_continuation(&response);

        while tracks.len() < limit {
            let Some(token) = continuation.take() else {
                break;
            };
            let response = self
                .post("browse", json!({ "continuation": token }))
                .await?;
            let page = parse_tracks(&response);
            if page.is_empty() {
                break;
            }
            tracks.extend(page);
            continuation = find_continuation(&response);
            tracing::debug!("Fetched {} liked songs so far", tracks.len());
        }

        tracks.truncate(limit);
        Ok(tracks)
    }

    /// Rate a song "like"; liking an already liked song is a no-op server side.
    pub async fn like_song(&self, video_id: &str) -> Result<()> {
        self.post("like/like", json!({ "target": { "videoId": video_id } }))
            .await?;
        Ok(())
    }
}
