use super::TrackRecord;
use super::error::{FetchError, LibraryError};
use super::snapshot::SnapshotStore;
use crate::ports::source::SourceClient;

/// Rebuilds the snapshot from a full fetch of the source library.
pub struct SnapshotExporter<S: SourceClient> {
    source: S,
    page_size: u32,
}

impl<S: SourceClient> SnapshotExporter<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    /// Page through every liked track of the source until a page with no
    /// entries comes back, then replace the snapshot. Returns the number of exported tracks.
    ///
    /// Nothing is written when any page fails.
    pub async fn export(&self, snapshot: &SnapshotStore) -> Result<usize, LibraryError> {
        let tracks = self.fetch_all().await?;
        snapshot.save(&tracks)?;

        tracing::info!(
            "Exported {} liked songs to {}",
            tracks.len(),
            snapshot.path().display()
        );
        Ok(tracks.len())
    }

    async fn fetch_all(&self) -> Result<Vec<TrackRecord>, FetchError> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .source
                .fetch_liked_page(offset, self.page_size)
                .await
                .map_err(|report| FetchError::SourcePage { offset, report })?;
            if page.fetched == 0 {
                break;
            }

            tracks.extend(page.tracks.into_iter().map(TrackRecord::from));
            // The source may cap or shorten a page, so advance by what it returned.
            offset += page.fetched;
            tracing::info!("Fetched {} liked songs so far...", tracks.len());
        }

        Ok(tracks)
    }
}
