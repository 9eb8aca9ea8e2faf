use color_eyre::eyre::Result;

use super::{MatchCandidate, TrackRecord};
use crate::ports::destination::{DestinationClient, SearchCategory};

/// Free-text query for a track: the title followed by every artist, in
/// source order, separated by single spaces.
pub fn build_query(track: &TrackRecord) -> String {
    std::iter::once(track.title.as_str())
        .chain(track.artists.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a source track to the destination's top-ranked song result.
///
/// The first result wins; there is no scoring against the source metadata.
/// An empty result list yields `None`, search faults are returned as-is.
pub async fn match_track<D>(destination: &D, track: &TrackRecord) -> Result<Option<MatchCandidate>>
where
    D: DestinationClient + ?Sized,
{
    let query = build_query(track);
    let results = destination.search(&query, SearchCategory::Songs).await?;

    Ok(results.into_iter().next().map(MatchCandidate::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::{DestinationTrack, MockDestinationClient};
    use crate::test_utils::track;
    use mockall::predicate::eq;

    fn result(id: Option<&str>, title: Option<&str>) -> DestinationTrack {
        DestinationTrack {
            id: id.map(String::from),
            title: title.map(String::from),
            artists: vec![],
        }
    }

    #[test]
    fn test_build_query_joins_artists_in_order() {
        let track = track("Song A", &["Artist X", "Artist Y", "Artist X"]);
        assert_eq!(build_query(&track), "Song A Artist X Artist Y Artist X");
    }

    #[test]
    fn test_build_query_without_artists_is_title_only() {
        let track = track("Song A", &[]);
        assert_eq!(build_query(&track), "Song A");
    }

    #[tokio::test]
    async fn test_first_result_wins() {
        let mut destination = MockDestinationClient::new();
        destination
            .expect_search()
            .with(eq("Song A Artist X"), eq(SearchCategory::Songs))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    result(Some("v1"), Some("Song A")),
                    result(Some("v2"), Some("Song A (Live)")),
                ])
            });

        let candidate = match_track(&destination, &track("Song A", &["Artist X"]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.destination_id.as_deref(), Some("v1"));
        assert_eq!(candidate.title.as_deref(), Some("Song A"));
    }

    #[tokio::test]
    async fn test_no_results_is_no_candidate() {
        let mut destination = MockDestinationClient::new();
        destination.expect_search().returning(|_, _| Ok(vec![]));

        let candidate = match_track(&destination, &track("Song B", &["Artist Y"]))
            .await
            .unwrap();

        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn test_candidate_without_display_fields_still_matches() {
        let mut destination = MockDestinationClient::new();
        destination
            .expect_search()
            .returning(|_, _| Ok(vec![result(Some("v9"), None)]));

        let candidate = match_track(&destination, &track("Song C", &["Artist Z"]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.destination_id.as_deref(), Some("v9"));
        assert!(candidate.title.is_none());
    }

    #[tokio::test]
    async fn test_search_fault_propagates() {
        let mut destination = MockDestinationClient::new();
        destination
            .expect_search()
            .times(1)
            .returning(|_, _| Err(color_eyre::eyre::eyre!("connection reset")));

        let error = match_track(&destination, &track("Song A", &["Artist X"]))
            .await
            .unwrap_err();

        assert!(error.to_string().contains("connection reset"));
    }
}
