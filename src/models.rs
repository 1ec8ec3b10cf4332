use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Spotify,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Spotify, Platform::Youtube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::Youtube => "youtube",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::Youtube => "YouTube Music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "youtube" | "youtube-music" | "ytmusic" => Ok(Platform::Youtube),
            other => Err(AppError::Validation(format!("unsupported platform: {}", other))),
        }
    }
}

/// A track as normalized from a platform response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Platform reference used when adding the track to a playlist
    /// (Spotify track URI, YouTube video id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: Option<u64>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists
            .first()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub platform: Platform,
    /// Count declared by the platform at lookup time; the number of tracks
    /// actually converted can be lower once the track cap applies.
    pub track_count: usize,
}

#[cfg(test)]
impl Track {
    pub fn mock(title: &str, artist: &str) -> Self {
        Self {
            id: Some(format!("mock:{}", title.to_lowercase().replace(' ', "-"))),
            title: title.to_string(),
            artists: vec![artist.to_string()],
            album: "Mock Album".to_string(),
            duration_ms: Some(180000),
        }
    }
}
