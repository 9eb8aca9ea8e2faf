//! Liked-track reconciliation between the source and destination catalogs.
//!
//! The flow is: snapshot -> per-track match -> liked-set dedup -> like
//! mutation -> report.

pub mod error;
pub mod export;
pub mod liked_set;
pub mod matcher;
pub mod report;
pub mod snapshot;
pub mod sync;

use serde::{Deserialize, Serialize};

use crate::ports::destination::DestinationTrack;
use crate::ports::source::SourceTrack;

/// One liked track of the source library, as stored in the snapshot file.
///
/// The field names on disk follow the export format (`name`, `spotify_url`)
/// so snapshots written by earlier exports stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(rename = "name")]
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub release_date: String,
    #[serde(rename = "spotify_url")]
    pub source_url: String,
}

impl From<SourceTrack> for TrackRecord {
    fn from(track: SourceTrack) -> Self {
        Self {
            title: track.title,
            artists: track.artists,
            album: track.album,
            release_date: track.release_date,
            source_url: track.external_url,
        }
    }
}

/// The destination search result picked for a source track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCandidate {
    pub title: Option<String>,
    pub artists: Vec<String>,
    /// Absent when the destination returned a result that cannot be liked.
    pub destination_id: Option<String>,
}

impl From<DestinationTrack> for MatchCandidate {
    fn from(track: DestinationTrack) -> Self {
        Self {
            title: track.title,
            artists: track.artists,
            destination_id: track.id,
        }
    }
}

/// A source track paired with its (optional) destination candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub track: TrackRecord,
    pub candidate: Option<MatchCandidate>,
}

impl MatchResult {
    /// The identifier a like mutation would target, if the match is usable.
    pub fn destination_id(&self) -> Option<&str> {
        self.candidate
            .as_ref()
            .and_then(|candidate| candidate.destination_id.as_deref())
    }
}

/// What happened to a single track during a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No usable candidate. `search_error` is set when the search itself failed.
    Unmatched { search_error: Option<String> },
    AlreadyLiked { id: String },
    NewlyLiked { id: String },
    WriteFailed { id: String, reason: String },
}

impl SyncOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            SyncOutcome::Unmatched { .. } => OutcomeKind::Unmatched,
            SyncOutcome::AlreadyLiked { .. } => OutcomeKind::AlreadyLiked,
            SyncOutcome::NewlyLiked { .. } => OutcomeKind::NewlyLiked,
            SyncOutcome::WriteFailed { .. } => OutcomeKind::WriteFailed,
        }
    }

    pub fn destination_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::Unmatched { .. } => None,
            SyncOutcome::AlreadyLiked { id }
            | SyncOutcome::NewlyLiked { id }
            | SyncOutcome::WriteFailed { id, .. } => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Unmatched,
    AlreadyLiked,
    NewlyLiked,
    WriteFailed,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OutcomeKind::Unmatched => "unmatched",
            OutcomeKind::AlreadyLiked => "already liked",
            OutcomeKind::NewlyLiked => "newly liked",
            OutcomeKind::WriteFailed => "write failed",
        };
        f.write_str(label)
    }
}
