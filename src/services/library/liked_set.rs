use std::collections::HashSet;

use super::error::FetchError;
use crate::ports::destination::DestinationClient;

/// Identifiers already liked on the destination when a sync run starts.
///
/// Loaded once per run and never refreshed while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedSet {
    ids: HashSet<String>,
}

impl LikedSet {
    /// Fetch up to `limit` liked tracks and index them by identifier.
    /// Tracks without an identifier are skipped.
    pub async fn load<D>(destination: &D, limit: u32) -> Result<Self, FetchError>
    where
        D: DestinationClient + ?Sized,
    {
        let liked = destination
            .fetch_liked(limit)
            .await
            .map_err(FetchError::LikedTracks)?;

        let fetched = liked.len();
        let set: Self = liked.into_iter().filter_map(|track| track.id).collect();
        tracing::debug!(
            "Indexed {} liked track identifiers out of {} fetched",
            set.len(),
            fetched
        );
        Ok(set)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for LikedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
