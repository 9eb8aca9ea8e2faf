use color_eyre::eyre::Result;

/// Decoupled representation of a liked track from the source catalog API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTrack {
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub release_date: String,
    pub external_url: String,
}

/// One page of the liked tracks listing.
///
/// `fetched` is the number of entries the source returned, including ones
/// that could not be mapped to a track (e.g. removed from the catalog), so
/// `tracks` may be shorter. Paging advances by `fetched`; a page with
/// `fetched == 0` marks the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePage {
    pub tracks: Vec<SourceTrack>,
    pub fetched: u32,
}

/// Port trait wrapping the source catalog capabilities used by the export.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch one page of the user's liked tracks. The source may return fewer
    /// entries than `limit`.
    async fn fetch_liked_page(&self, offset: u32, limit: u32) -> Result<SourcePage>;
}
