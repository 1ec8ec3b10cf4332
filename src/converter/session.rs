use serde::Serialize;
use std::fmt;

use crate::error::{AppError, Result};
use crate::link::conversion_targets;
use crate::models::{Platform, Playlist};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Idle,
    Verifying,
    Verified,
    CreatingDestination,
    MatchingAndAdding,
    Completed,
    Aborted,
}

impl ConversionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionStage::Completed | ConversionStage::Aborted)
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionStage::Idle => "idle",
            ConversionStage::Verifying => "verifying",
            ConversionStage::Verified => "verified",
            ConversionStage::CreatingDestination => "creating destination",
            ConversionStage::MatchingAndAdding => "matching and adding",
            ConversionStage::Completed => "completed",
            ConversionStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// State carried from verification to conversion.
///
/// Owned by whoever verified the playlist. Nothing stops two conversions
/// from running against the same session id at once.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSession {
    pub session_id: String,
    pub playlist: Option<Playlist>,
    pub playlist_url: Option<String>,
    pub destination: Option<Platform>,
}

impl ConversionSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            playlist: None,
            playlist_url: None,
            destination: None,
        }
    }

    pub fn verified(session_id: impl Into<String>, playlist: Playlist, playlist_url: String) -> Self {
        Self {
            playlist: Some(playlist),
            playlist_url: Some(playlist_url),
            ..Self::new(session_id)
        }
    }

    /// `Idle` until a playlist has been verified.
    pub fn stage(&self) -> ConversionStage {
        if self.playlist.is_some() {
            ConversionStage::Verified
        } else {
            ConversionStage::Idle
        }
    }

    pub fn source_platform(&self) -> Option<Platform> {
        self.playlist.as_ref().map(|p| p.platform)
    }

    pub fn choose_destination(&mut self, destination: Platform) -> Result<()> {
        let source = self.source_platform().ok_or_else(|| {
            AppError::Validation("invalid session: no verified playlist".into())
        })?;

        if !conversion_targets(source).contains(&destination) {
            return Err(AppError::Validation(format!(
                "playlist conversion from {} to {} not supported",
                source.display_name(),
                destination.display_name()
            )));
        }

        self.destination = Some(destination);
        Ok(())
    }

    /// Forget the verified playlist and destination.
    pub fn clear(&mut self) {
        self.playlist = None;
        self.playlist_url = None;
        self.destination = None;
    }
}

/// Outcome of verifying a playlist link.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub valid: bool,
    pub playlist: Playlist,
    pub supported_destinations: Vec<Platform>,
    #[serde(skip)]
    pub session: ConversionSession,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPreview {
    pub playlist_url: String,
    pub playlist_name: String,
    pub track_count: usize,
    pub source_platform: Platform,
    pub destination_platform: Platform,
}
