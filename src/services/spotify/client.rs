use color_eyre::eyre::{OptionExt, Result, WrapErr};

use crate::ports::source::{SourceClient, SourcePage, SourceTrack};
use crate::spotify_rs::auth::refresh_access_token;
use crate::spotify_rs::client::SpotifyClient;
use crate::spotify_rs::types::{SpotifySavedTracksPage, SpotifyTrack, SpotifyUser};

/// Application credentials plus the user's long-lived refresh token.
#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    refresh_token: Option<String>,
}

impl SpotifyApiCredentials {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            refresh_token,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

/// Source catalog adapter over the Spotify Web API.
///
/// Holds the access token of one authenticated session; nothing is shared
/// between adapters.
pub struct SpotifyHttpAdapter {
    client: SpotifyClient,
}

impl SpotifyHttpAdapter {
    /// Exchange the stored refresh token for a fresh access token.
    pub async fn connect(credentials: &SpotifyApiCredentials) -> Result<Self> {
        let refresh_token = credentials.refresh_token.as_deref().ok_or_eyre(
            "No Spotify refresh token configured. Run `liked-sync auth spotify` first.",
        )?;

        let token = refresh_access_token(
            &credentials.client_id,
            &credentials.client_secret,
            refresh_token,
        )
        .await
        .wrap_err("Failed to refresh Spotify access token")?;
        tracing::debug!("Refreshed Spotify access token (expires in {}s)", token.expires_in);

        Ok(Self {
            client: SpotifyClient::new(token.access_token),
        })
    }

    pub async fn current_user(&self) -> Result<SpotifyUser> {
        self.client
            .get_current_user()
            .await
            .wrap_err("Failed to get Spotify user profile")
    }
}

fn to_source_track(track: SpotifyTrack) -> SourceTrack {
    SourceTrack {
        title: track.name,
        artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        album: track.album.name,
        release_date: track.album.release_date,
        external_url: track.external_urls.spotify.unwrap_or_default(),
    }
}

fn to_source_page(page: SpotifySavedTracksPage, offset: u32) -> SourcePage {
    let fetched = page.items.len();
    let tracks: Vec<_> = page
        .items
        .into_iter()
        .filter_map(|item| item.track)
        .map(to_source_track)
        .collect();
    if tracks.len() < fetched {
        tracing::warn!(
            "Skipped {} unavailable saved tracks at offset {}",
            fetched - tracks.len(),
            offset
        );
    }

    SourcePage {
        tracks,
        fetched: u32::try_from(fetched).unwrap_or(u32::MAX),
    }
}

#[async_trait::async_trait]
impl SourceClient for SpotifyHttpAdapter {
    async fn fetch_liked_page(&self, offset: u32, limit: u32) -> Result<SourcePage> {
        let page = self.client.get_saved_tracks_page(offset, limit).await?;
        tracing::debug!(
            "Saved tracks page at offset {}: {} items of {} total",
            offset,
            page.items.len(),
            page.total
        );

        Ok(to_source_page(page, offset))
    }
}
