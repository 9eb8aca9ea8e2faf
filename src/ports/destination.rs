use color_eyre::eyre::Result;

/// Result category a destination search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Songs,
}

/// Decoupled representation of a track returned by the destination catalog,
/// either from a search or from the liked tracks listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationTrack {
    pub id: Option<String>,
    pub title: Option<String>,
    pub artists: Vec<String>,
}

/// Port trait wrapping the destination catalog capabilities used by the sync.
///
/// Implementations live in `services::ytmusic::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DestinationClient: Send + Sync {
    /// Ranked search results, best match first.
    async fn search(&self, query: &str, category: SearchCategory) -> Result<Vec<DestinationTrack>>;

    /// The user's currently liked tracks, at most `limit` of them.
    async fn fetch_liked(&self, limit: u32) -> Result<Vec<DestinationTrack>>;

    async fn like(&self, id: &str) -> Result<()>;
}
