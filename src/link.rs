use url::Url;

use crate::error::{AppError, Result};
use crate::models::Platform;

const SPOTIFY_HOSTS: &[&str] = &["open.spotify.com"];
const YOUTUBE_HOSTS: &[&str] = &["music.youtube.com", "www.youtube.com", "youtube.com"];

/// A playlist reference extracted from a user-supplied link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistLink {
    pub platform: Platform,
    pub id: String,
}

/// Parse a playlist link and work out which platform it belongs to.
/// Supports formats:
/// - https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH?si=...
/// - spotify:playlist:37i9dQZF1E8NC99vGqLsaH
/// - https://music.youtube.com/playlist?list=PLxxxx (also www.youtube.com, youtube.com)
pub fn parse_playlist_url(url_str: &str) -> Result<PlaylistLink> {
    let url_str = url_str.trim();
    if url_str.is_empty() {
        return Err(AppError::Validation("A playlist url is required".into()));
    }

    if let Some(id) = url_str.strip_prefix("spotify:playlist:") {
        return non_empty_id(Platform::Spotify, id);
    }

    let url = Url::parse(url_str)
        .map_err(|e| AppError::Validation(format!("Invalid playlist url: {}", e)))?;

    let host = url.host_str().unwrap_or_default().to_lowercase();

    if SPOTIFY_HOSTS.contains(&host.as_str()) {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        // Expect /playlist/{id}
        return match segments.as_slice() {
            ["playlist", id, ..] => non_empty_id(Platform::Spotify, id),
            _ => Err(AppError::Validation("Invalid Spotify playlist url".into())),
        };
    }

    if YOUTUBE_HOSTS.contains(&host.as_str()) {
        if url.path().trim_end_matches('/') != "/playlist" {
            return Err(AppError::Validation(
                "Invalid YouTube Music playlist url".into(),
            ));
        }

        return url
            .query_pairs()
            .find(|(key, _)| key == "list")
            .map(|(_, id)| id.into_owned())
            .ok_or_else(|| AppError::Validation("Invalid YouTube Music playlist url".into()))
            .and_then(|id| non_empty_id(Platform::Youtube, &id));
    }

    Err(AppError::Validation(
        "Invalid or unsupported playlist url".into(),
    ))
}

fn non_empty_id(platform: Platform, id: &str) -> Result<PlaylistLink> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation(format!(
            "Invalid {} playlist url",
            platform.display_name()
        )));
    }

    Ok(PlaylistLink {
        platform,
        id: id.to_string(),
    })
}

/// Every supported platform except the source.
pub fn conversion_targets(source: Platform) -> Vec<Platform> {
    Platform::ALL
        .into_iter()
        .filter(|platform| *platform != source)
        .collect()
}
