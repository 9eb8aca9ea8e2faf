//! Extraction of song rows from InnerTube JSON responses.
//!
//! YouTube Music wraps rows in deeply nested renderer objects whose nesting
//! changes between endpoints (search, playlist browse, continuations). Rows are
//! therefore located by renderer key anywhere in the response, in document
//! order, instead of by a fixed path.

use serde_json::Value;

const ROW_RENDERER: &str = "musicResponsiveListItemRenderer";
const ARTIST_PAGE_TYPE: &str = "MUSIC_PAGE_TYPE_ARTIST";
const SEPARATOR: &str = " • ";
const ARTIST_JOINERS: [&str; 3] = [" & ", ", ", " and "];

/// A song row as shown by YouTube Music.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YtMusicTrack {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub artists: Vec<String>,
}

/// Every song row of a response, in the order they are displayed.
pub fn parse_tracks(response: &Value) -> Vec<YtMusicTrack> {
    let mut rows = Vec::new();
    collect_by_key(response, ROW_RENDERER, &mut rows);
    rows.into_iter().map(parse_track_row).collect()
}

/// Token for the next page of a paginated response, if there is one.
pub fn find_continuation(response: &Value) -> Option<String> {
    let mut commands = Vec::new();
    collect_by_key(response, "continuationCommand", &mut commands);
    if let Some(token) = commands.iter().find_map(|command| command["token"].as_str()) {
        return Some(token.to_string());
    }

    let mut legacy = Vec::new();
    collect_by_key(response, "nextContinuationData", &mut legacy);
    legacy
        .iter()
        .find_map(|data| data["continuation"].as_str())
        .map(String::from)
}

fn collect_by_key<'a>(value: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                if name == key {
                    found.push(child);
                } else {
                    collect_by_key(child, key, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_by_key(item, key, found);
            }
        }
        _ => {}
    }
}

fn flex_column_runs(renderer: &Value, column: usize) -> &[Value] {
    renderer["flexColumns"][column]["musicResponsiveListItemFlexColumnRenderer"]["text"]["runs"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn video_id(renderer: &Value) -> Option<String> {
    renderer["playlistItemData"]["videoId"]
        .as_str()
        .or_else(|| {
            renderer["overlay"]["musicItemThumbnailOverlayRenderer"]["content"]
                ["musicPlayButtonRenderer"]["playNavigationEndpoint"]["watchEndpoint"]["videoId"]
                .as_str()
        })
        .or_else(|| {
            flex_column_runs(renderer, 0)
                .first()
                .and_then(|run| run["navigationEndpoint"]["watchEndpoint"]["videoId"].as_str())
        })
        .filter(|id| !id.is_empty())
        .map(String::from)
}

fn is_artist_run(run: &Value) -> bool {
    run["navigationEndpoint"]["browseEndpoint"]["browseEndpointContextSupportedConfigs"]
        ["browseEndpointContextMusicConfig"]["pageType"]
        .as_str()
        == Some(ARTIST_PAGE_TYPE)
}

fn artists(renderer: &Value) -> Vec<String> {
    let runs = flex_column_runs(renderer, 1);

    let linked: Vec<String> = runs
        .iter()
        .filter(|run| is_artist_run(run))
        .filter_map(|run| run["text"].as_str())
        .map(String::from)
        .collect();
    if !linked.is_empty() {
        return linked;
    }

    // Unlinked artists: everything before the first separator, minus joiners.
    runs.iter()
        .filter_map(|run| run["text"].as_str())
        .take_while(|text| *text != SEPARATOR)
        .filter(|text| !ARTIST_JOINERS.contains(text))
        .map(String::from)
        .collect()
}

pub fn parse_track_row(renderer: &Value) -> YtMusicTrack {
    YtMusicTrack {
        video_id: video_id(renderer),
        title: flex_column_runs(renderer, 0)
            .first()
            .and_then(|run| run["text"].as_str())
            .map(String::from),
        artists: artists(renderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artist_run(name: &str) -> Value {
        json!({
            "text": name,
            "navigationEndpoint": {
                "browseEndpoint": {
                    "browseId": format!("UC{name}"),
                    "browseEndpointContextSupportedConfigs": {
                        "browseEndpointContextMusicConfig": { "pageType": "MUSIC_PAGE_TYPE_ARTIST" }
                    }
                }
            }
        })
    }

    fn row(video_id: &str, title: &str, second_column: Vec<Value>) -> Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": title } ] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": second_column } } }
                ],
                "playlistItemData": { "videoId": video_id }
            }
        })
    }

    #[test]
    fn test_parse_search_response_in_order() {
        let response = json!({
            "contents": {
                "tabbedSearchResultsRenderer": {
                    "tabs": [{
                        "tabRenderer": {
                            "content": {
                                "sectionListRenderer": {
                                    "contents": [{
                                        "musicShelfRenderer": {
                                            "contents": [
                                                row("v1", "Song A", vec![
                                                    artist_run("Artist X"),
                                                    json!({ "text": " & " }),
                                                    artist_run("Artist Y"),
                                                    json!({ "text": " • " }),
                                                    json!({ "text": "Album" }),
                                                ]),
                                                row("v2", "Song A (Live)", vec![artist_run("Artist X")]),
                                            ]
                                        }
                                    }]
                                }
                            }
                        }
                    }]
                }
            }
        });

        let tracks = parse_tracks(&response);

        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0],
            YtMusicTrack {
                video_id: Some("v1".into()),
                title: Some("Song A".into()),
                artists: vec!["Artist X".into(), "Artist Y".into()],
            }
        );
        assert_eq!(tracks[1].video_id.as_deref(), Some("v2"));
    }

    #[test]
    fn test_unlinked_artists_stop_at_separator() {
        let response = row(
            "v3",
            "Song C",
            vec![
                json!({ "text": "Artist P" }),
                json!({ "text": ", " }),
                json!({ "text": "Artist Q" }),
                json!({ "text": " • " }),
                json!({ "text": "3:45" }),
            ],
        );

        let tracks = parse_tracks(&response);

        assert_eq!(tracks[0].artists, vec!["Artist P", "Artist Q"]);
    }

    #[test]
    fn test_video_id_from_play_button_overlay() {
        let renderer = json!({
            "flexColumns": [],
            "overlay": {
                "musicItemThumbnailOverlayRenderer": {
                    "content": {
                        "musicPlayButtonRenderer": {
                            "playNavigationEndpoint": { "watchEndpoint": { "videoId": "v7" } }
                        }
                    }
                }
            }
        });

        let track = parse_track_row(&renderer);

        assert_eq!(track.video_id.as_deref(), Some("v7"));
        assert!(track.title.is_none());
        assert!(track.artists.is_empty());
    }

    #[test]
    fn test_unplayable_row_has_no_video_id() {
        let tracks = parse_tracks(&row("", "Gone", vec![]));
        assert!(tracks[0].video_id.is_none());
        assert_eq!(tracks[0].title.as_deref(), Some("Gone"));

        let renderer = json!({ "flexColumns": [
            { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [ { "text": "Gone" } ] } } }
        ]});
        assert!(parse_track_row(&renderer).video_id.is_none());
    }

    #[test]
    fn test_find_continuation_token() {
        let response = json!({
            "onResponseReceivedActions": [{
                "appendContinuationItemsAction": {
                    "continuationItems": [
                        row("v1", "Song", vec![]),
                        { "continuationItemRenderer": { "continuationEndpoint": { "continuationCommand": { "token": "NEXT" } } } }
                    ]
                }
            }]
        });

        assert_eq!(find_continuation(&response).as_deref(), Some("NEXT"));
    }

    #[test]
    fn test_find_legacy_continuation() {
        let response = json!({
            "continuationContents": {
                "musicPlaylistShelfContinuation": {
                    "continuations": [{ "nextContinuationData": { "continuation": "OLD" } }]
                }
            }
        });

        assert_eq!(find_continuation(&response).as_deref(), Some("OLD"));
        assert!(find_continuation(&json!({ "contents": [] })).is_none());
    }
}
