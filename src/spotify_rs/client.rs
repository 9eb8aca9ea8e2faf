use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use crate::spotify_rs::types::{SpotifySavedTracksPage, SpotifyUser};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Largest page the saved tracks endpoint accepts.
pub const MAX_SAVED_TRACKS_PAGE: u32 = 50;

/// Spotify API client
pub struct SpotifyClient {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser> {
        let response = self
            .client
            .get(format!("{SPOTIFY_API_URL}/me"))
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        let user: SpotifyUser = response.json().await?;
        Ok(user)
    }

    /// Get one page of the current user's saved ("liked") tracks
    pub async fn get_saved_tracks_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<SpotifySavedTracksPage> {
        let limit = limit.clamp(1, MAX_SAVED_TRACKS_PAGE);
        tracing::debug!("Fetching saved tracks (offset: {}, limit: {})", offset, limit);

        let page = self
            .client
            .get(format!("{SPOTIFY_API_URL}/me/tracks"))
            .query(&[("limit", limit), ("offset", offset)])
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json::<SpotifySavedTracksPage>()
            .await
            .wrap_err("Failed to deserialize saved tracks page")?;

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use crate::spotify_rs::types::SpotifySavedTracksPage;

    #[test]
    fn test_saved_tracks_page_tolerates_unavailable_tracks() {
        let body = serde_json::json!({
            "items": [
                {
                    "added_at": "2024-01-01T00:00:00Z",
                    "track": {
                        "id": "4uLU6hMCjMI75M1A2tKUQC",
                        "name": "Never Gonna Give You Up",
                        "artists": [{ "id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley" }],
                        "album": { "id": "6N9PS4QXF1D0OWPk0Sxtb4", "name": "Whenever You Need Somebody", "release_date": "1987-11-12" },
                        "external_urls": { "spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC" }
                    }
                },
                { "added_at": "2024-01-02T00:00:00Z", "track": null }
            ],
            "next": null,
            "total": 2
        });

        let page: SpotifySavedTracksPage = serde_json::from_value(body).unwrap();

        assert_eq!(page.items.len(), 2);
        let track = page.items[0].track.as_ref().unwrap();
        assert_eq!(track.artists[0].name, "Rick Astley");
        assert_eq!(track.album.release_date, "1987-11-12");
        assert!(page.items[1].track.is_none());
    }
}
