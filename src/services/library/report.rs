use super::{MatchCandidate, OutcomeKind, SyncOutcome, TrackRecord};

/// Outcome of one snapshot track, with the candidate it was matched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOutcome {
    pub track: TrackRecord,
    pub candidate: Option<MatchCandidate>,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub unmatched: usize,
    pub already_liked: usize,
    pub newly_liked: usize,
    pub write_failed: usize,
}

impl SyncCounts {
    pub fn get(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Unmatched => self.unmatched,
            OutcomeKind::AlreadyLiked => self.already_liked,
            OutcomeKind::NewlyLiked => self.newly_liked,
            OutcomeKind::WriteFailed => self.write_failed,
        }
    }

    /// Tracks that resolved to a destination identifier.
    pub fn matched(&self) -> usize {
        self.already_liked + self.newly_liked + self.write_failed
    }

    pub fn total(&self) -> usize {
        self.matched() + self.unmatched
    }
}

/// Per-track outcomes of a sync run, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    entries: Vec<TrackOutcome>,
    counts: SyncCounts,
    interrupted: bool,
}

impl SyncReport {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn record(
        &mut self,
        track: TrackRecord,
        candidate: Option<MatchCandidate>,
        outcome: SyncOutcome,
    ) {
        match outcome.kind() {
            OutcomeKind::Unmatched => self.counts.unmatched += 1,
            OutcomeKind::AlreadyLiked => self.counts.already_liked += 1,
            OutcomeKind::NewlyLiked => self.counts.newly_liked += 1,
            OutcomeKind::WriteFailed => self.counts.write_failed += 1,
        }
        self.entries.push(TrackOutcome {
            track,
            candidate,
            outcome,
        });
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Whether the run was cancelled before every track was processed.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn entries(&self) -> &[TrackOutcome] {
        &self.entries
    }

    pub fn counts(&self) -> SyncCounts {
        self.counts
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.entries.iter().map(|entry| &entry.outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
