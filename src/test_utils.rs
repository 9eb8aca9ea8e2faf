use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use color_eyre::eyre::{Result, eyre};

use crate::ports::destination::{DestinationClient, DestinationTrack, SearchCategory};
use crate::services::library::TrackRecord;

pub fn track(title: &str, artists: &[&str]) -> TrackRecord {
    TrackRecord {
        title: title.to_string(),
        artists: artists.iter().map(|artist| artist.to_string()).collect(),
        album: format!("{title} (Album)"),
        release_date: "2020-01-01".to_string(),
        source_url: format!("https://open.spotify.com/track/{}", title.replace(' ', "")),
    }
}

#[derive(Default)]
struct FakeState {
    catalog: HashMap<String, Vec<DestinationTrack>>,
    failing_searches: HashSet<String>,
    failing_likes: HashSet<String>,
    liked: Vec<String>,
    like_calls: Vec<String>,
}

/// In-memory destination whose likes persist across sync runs.
///
/// Clones share state, so a test can keep a handle after giving one to an engine.
#[derive(Clone, Default)]
pub struct FakeDestination {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, query: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .catalog
            .entry(query.to_string())
            .or_default()
            .push(DestinationTrack {
                id: Some(id.to_string()),
                title: Some(query.to_string()),
                artists: vec![],
            });
        self
    }

    pub fn with_no_results(self, query: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .catalog
            .insert(query.to_string(), vec![]);
        self
    }

    pub fn with_liked(self, id: &str) -> Self {
        self.state.lock().unwrap().liked.push(id.to_string());
        self
    }

    pub fn failing_search(self, query: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_searches
            .insert(query.to_string());
        self
    }

    pub fn failing_like(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_likes
            .insert(id.to_string());
        self
    }

    pub fn like_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().like_calls.clone()
    }
}

#[async_trait::async_trait]
impl DestinationClient for FakeDestination {
    async fn search(&self, query: &str, _category: SearchCategory) -> Result<Vec<DestinationTrack>> {
        let state = self.state.lock().unwrap();
        if state.failing_searches.contains(query) {
            return Err(eyre!("search for {query} failed"));
        }
        Ok(state.catalog.get(query).cloned().unwrap_or_default())
    }

    async fn fetch_liked(&self, limit: u32) -> Result<Vec<DestinationTrack>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .liked
            .iter()
            .rev()
            .take(limit as usize)
            .map(|id| DestinationTrack {
                id: Some(id.clone()),
                ..Default::default()
            })
            .collect())
    }

    async fn like(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.like_calls.push(id.to_string());
        if state.failing_likes.contains(id) {
            return Err(eyre!("like for {id} failed"));
        }
        if !state.liked.iter().any(|liked| liked == id) {
            state.liked.push(id.to_string());
        }
        Ok(())
    }
}
