use serde::{Deserialize, Serialize};

use crate::models::{Platform, Playlist, Track};

/// Envelope of every `list` call in the Data API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResource {
    pub id: String,
    pub snippet: PlaylistSnippet,
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistContentDetails {
    pub item_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemResource {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: String,
    /// Absent for deleted and private videos.
    pub video_owner_channel_title: Option<String>,
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResource {
    pub id: ResourceId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub title: String,
    pub channel_title: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedResource {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct NewPlaylist {
    pub snippet: NewPlaylistSnippet,
    pub status: NewPlaylistStatus,
}

#[derive(Debug, Serialize)]
pub struct NewPlaylistSnippet {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylistStatus {
    pub privacy_status: String,
}

impl NewPlaylist {
    pub fn private(title: &str) -> Self {
        Self {
            snippet: NewPlaylistSnippet {
                title: title.to_string(),
                description: String::new(),
            },
            status: NewPlaylistStatus {
                privacy_status: "private".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewPlaylistItem {
    pub snippet: NewPlaylistItemSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylistItemSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}

impl NewPlaylistItem {
    pub fn video(playlist_id: &str, video_id: &str) -> Self {
        Self {
            snippet: NewPlaylistItemSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".to_string(),
                    video_id: Some(video_id.to_string()),
                },
            },
        }
    }
}

impl PlaylistResource {
    pub fn into_playlist(self) -> Playlist {
        Playlist {
            id: self.id,
            title: self.snippet.title,
            platform: Platform::Youtube,
            track_count: self
                .content_details
                .map(|d| d.item_count as usize)
                .unwrap_or(0),
        }
    }
}

impl PlaylistItemResource {
    /// `None` for deleted or private videos.
    pub fn into_track(self) -> Option<Track> {
        let snippet = self.snippet;
        let channel = snippet.video_owner_channel_title?;
        let video_id = snippet.resource_id.video_id?;

        Some(Track {
            id: Some(video_id),
            title: snippet.title,
            artists: vec![artist_from_channel(&channel)],
            album: String::new(),
            duration_ms: None,
        })
    }
}

impl SearchResource {
    pub fn into_track(self) -> Option<Track> {
        let video_id = self.id.video_id?;

        Some(Track {
            id: Some(video_id),
            title: unescape_html(&self.snippet.title),
            artists: vec![artist_from_channel(&unescape_html(&self.snippet.channel_title))],
            album: String::new(),
            duration_ms: None,
        })
    }
}

/// Auto-generated artist channels are named "<artist> - Topic".
pub fn artist_from_channel(channel_title: &str) -> String {
    channel_title
        .strip_suffix(" - Topic")
        .unwrap_or(channel_title)
        .trim()
        .to_string()
}

/// Search snippets come back HTML-escaped.
pub fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn search_query(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(artist) => format!("{} - {}", title, artist),
        None => title.to_string(),
    }
}
