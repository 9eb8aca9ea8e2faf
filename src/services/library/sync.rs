use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Instrument, instrument};

use super::error::LibraryError;
use super::liked_set::LikedSet;
use super::matcher::{build_query, match_track};
use super::report::SyncReport;
use super::snapshot::SnapshotStore;
use super::{MatchCandidate, SyncOutcome, TrackRecord};
use crate::ports::destination::DestinationClient;

/// Cooperative stop signal, checked by the engine between tracks.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel on the first interrupt, then wait for a second one.
    ///
    /// Returns `true` once the second interrupt arrives, at which point the
    /// caller should stop without waiting for the in-flight track. Returns
    /// `false` if the signal source fails.
    pub async fn watch_interrupts<F, Fut>(&self, mut next_interrupt: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        if let Err(error) = next_interrupt().await {
            tracing::warn!("Failed to listen for interrupts: {}", error);
            return false;
        }
        tracing::warn!(
            "Interrupt received, stopping after the current track. Interrupt again to exit now"
        );
        self.cancel();

        next_interrupt().await.is_ok()
    }
}

/// Result of the like mutation issued earlier in the same run for an identifier.
type WriteLog = HashMap<String, Result<(), String>>;

/// Converges the destination's liked tracks toward a source snapshot.
///
/// Tracks are processed one at a time, in snapshot order. A like mutation is
/// issued at most once per identifier per run and never for an identifier
/// that was already liked when the run started.
pub struct SyncEngine<D: DestinationClient> {
    destination: D,
    liked_limit: u32,
}

impl<D: DestinationClient> SyncEngine<D> {
    pub fn new(destination: D, liked_limit: u32) -> Self {
        Self {
            destination,
            liked_limit,
        }
    }

    /// Load the snapshot and sync every track in it.
    pub async fn sync(
        &self,
        snapshot: &SnapshotStore,
        cancel: &CancellationFlag,
    ) -> Result<SyncReport, LibraryError> {
        let tracks = snapshot.load()?;
        self.sync_tracks(&tracks, cancel).await
    }

    /// Sync an already loaded list of tracks.
    ///
    /// Only a failure to load the liked tracks aborts the run. Search and
    /// mutation failures become per-track outcomes.
    #[instrument(name = "sync", skip_all, fields(tracks = tracks.len()))]
    pub async fn sync_tracks(
        &self,
        tracks: &[TrackRecord],
        cancel: &CancellationFlag,
    ) -> Result<SyncReport, LibraryError> {
        if tracks.is_empty() {
            tracing::info!("Snapshot is empty, nothing to sync");
            return Ok(SyncReport::default());
        }

        tracing::info!("Getting liked songs from the destination to avoid unnecessary API calls");
        let liked = LikedSet::load(&self.destination, self.liked_limit).await?;
        tracing::info!("{} songs are already liked on the destination", liked.len());

        let total = tracks.len();
        let mut written = WriteLog::new();
        let mut report = SyncReport::with_capacity(total);

        for (index, track) in tracks.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!("Sync cancelled after {} of {} tracks", index, total);
                report.mark_interrupted();
                break;
            }

            let span = tracing::info_span!("track", position = index + 1, title = %track.title);
            let (candidate, outcome) = self
                .process_track(index + 1, total, track, &liked, &mut written)
                .instrument(span)
                .await;
            report.record(track.clone(), candidate, outcome);
        }

        let counts = report.counts();
        tracing::info!("Matched {} out of {} songs.", counts.matched(), total);
        tracing::info!(
            "Sync complete: {} newly liked, {} already liked, {} unmatched, {} failed",
            counts.newly_liked,
            counts.already_liked,
            counts.unmatched,
            counts.write_failed
        );

        Ok(report)
    }

    async fn process_track(
        &self,
        position: usize,
        total: usize,
        track: &TrackRecord,
        liked: &LikedSet,
        written: &mut WriteLog,
    ) -> (Option<MatchCandidate>, SyncOutcome) {
        tracing::info!(
            "[{}/{}] Searching destination for: {}",
            position,
            total,
            build_query(track)
        );

        let candidate = match match_track(&self.destination, track).await {
            Ok(candidate) => candidate,
            Err(error) => {
                tracing::warn!("Search failed for {}: {:#}", track.title, error);
                let outcome = SyncOutcome::Unmatched {
                    search_error: Some(format!("{error:#}")),
                };
                return (None, outcome);
            }
        };

        let Some(id) = candidate
            .as_ref()
            .and_then(|candidate| candidate.destination_id.clone())
        else {
            tracing::warn!(
                "Could not find a match for: {} by {}",
                track.title,
                track.artists.join(", ")
            );
            return (candidate, SyncOutcome::Unmatched { search_error: None });
        };

        let label = describe(candidate.as_ref());
        let outcome = self.like_once(id, &label, liked, written).await;
        (candidate, outcome)
    }

    async fn like_once(
        &self,
        id: String,
        label: &str,
        liked: &LikedSet,
        written: &mut WriteLog,
    ) -> SyncOutcome {
        if liked.contains(&id) {
            tracing::info!("Already liked {}", label);
            return SyncOutcome::AlreadyLiked { id };
        }

        if let Some(previous) = written.get(&id) {
            tracing::info!("{} was already handled earlier in this run", label);
            return match previous {
                Ok(()) => SyncOutcome::AlreadyLiked { id },
                Err(reason) => SyncOutcome::WriteFailed {
                    reason: reason.clone(),
                    id,
                },
            };
        }

        match self.destination.like(&id).await {
            Ok(()) => {
                tracing::info!("Liked on destination: {}", label);
                written.insert(id.clone(), Ok(()));
                SyncOutcome::NewlyLiked { id }
            }
            Err(error) => {
                let reason = format!("{error:#}");
                tracing::warn!("Failed to like {}: {}", label, reason);
                written.insert(id.clone(), Err(reason.clone()));
                SyncOutcome::WriteFailed { id, reason }
            }
        }
    }
}

fn describe(candidate: Option<&MatchCandidate>) -> String {
    let Some(candidate) = candidate else {
        return "<no candidate>".to_string();
    };
    let title = candidate.title.as_deref().unwrap_or("<untitled>");
    if candidate.artists.is_empty() {
        title.to_string()
    } else {
        format!("{} by {}", title, candidate.artists.join(", "))
    }
}
