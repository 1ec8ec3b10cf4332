use rspotify::model::{FullPlaylist, FullTrack, PlayableItem, PlaylistItem};
use rspotify::prelude::*;

use crate::models::{Platform, Playlist, Track};

pub fn playlist_from_full(playlist: &FullPlaylist) -> Playlist {
    Playlist {
        id: playlist.id.id().to_string(),
        title: playlist.name.clone(),
        platform: Platform::Spotify,
        track_count: playlist.tracks.total as usize,
    }
}

/// Local files have no catalog id; they keep `id: None` and are still
/// searched by title and artist.
pub fn track_from_full(track: &FullTrack) -> Track {
    Track {
        id: track.id.as_ref().map(|id| id.uri()),
        title: track.name.clone(),
        artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        album: track.album.name.clone(),
        duration_ms: u64::try_from(track.duration.num_milliseconds()).ok(),
    }
}

/// Episodes and empty slots are skipped.
pub fn track_from_item(item: &PlaylistItem) -> Option<Track> {
    match &item.track {
        Some(PlayableItem::Track(track)) => Some(track_from_full(track)),
        _ => None,
    }
}

/// A search candidate is only usable when it can be added to a playlist.
pub fn candidate_from_full(track: &FullTrack) -> Option<Track> {
    track.id.as_ref()?;
    Some(track_from_full(track))
}

/// Fielded search query for the catalog search endpoint.
pub fn search_query(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(artist) => format!("track:{} artist:{}", title, artist),
        None => format!("track:{}", title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist_item(track_id: Option<&str>, name: &str, artist: &str) -> PlaylistItem {
        serde_json::from_value(serde_json::json!({
            "added_at": null,
            "added_by": null,
            "is_local": track_id.is_none(),
            "track": {
                "album": {
                    "album_type": null,
                    "artists": [],
                    "available_markets": [],
                    "external_urls": {},
                    "href": null,
                    "id": null,
                    "images": [],
                    "name": "Home Recordings",
                    "release_date": null,
                    "release_date_precision": null
                },
                "artists": [{
                    "external_urls": {},
                    "href": null,
                    "id": null,
                    "name": artist
                }],
                "available_markets": [],
                "disc_number": 0,
                "duration_ms": 354000,
                "explicit": false,
                "external_ids": {},
                "external_urls": {},
                "href": null,
                "id": track_id,
                "is_local": track_id.is_none(),
                "name": name,
                "popularity": 0,
                "preview_url": null,
                "track_number": 0,
                "type": "track"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_local_source_track_is_kept_without_id() {
        let item = playlist_item(None, "Bohemian Rhapsody", "Local Artist");

        let track = track_from_item(&item).expect("local tracks are still converted");
        assert_eq!(track.id, None);
        assert_eq!(track.title, "Bohemian Rhapsody");
        assert_eq!(track.primary_artist(), Some("Local Artist"));
        assert_eq!(track.duration_ms, Some(354000));
    }

    #[test]
    fn test_catalog_track_carries_its_uri() {
        let item = playlist_item(Some("4u7EnebtmKWzUH433cf5Qv"), "Bohemian Rhapsody", "Queen");

        let track = track_from_item(&item).unwrap();
        assert_eq!(track.id.as_deref(), Some("spotify:track:4u7EnebtmKWzUH433cf5Qv"));
    }

    #[test]
    fn test_local_track_is_not_a_search_candidate() {
        let local = playlist_item(None, "Demo", "Me");
        let Some(PlayableItem::Track(track)) = &local.track else {
            panic!("expected a track item");
        };
        assert_eq!(candidate_from_full(track), None);
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query("Heroes", Some("David Bowie")),
            "track:Heroes artist:David Bowie"
        );
        assert_eq!(search_query("Heroes", None), "track:Heroes");
    }
}
