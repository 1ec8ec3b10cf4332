use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{Platform, Track};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationPlaylist {
    pub id: String,
    pub url: String,
    pub platform: Platform,
}

/// Counts carried by the terminal `done` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub tracks_found: usize,
    pub tracks_not_found: usize,
    pub conversion_successful: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub tracks_found: usize,
    pub tracks_not_found: usize,
    pub conversion_successful: bool,
    pub destination: Option<DestinationPlaylist>,
    pub unmatched: Vec<Track>,
    /// Why the pipeline aborted, if it did.
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn total_tracks(&self) -> usize {
        self.tracks_found + self.tracks_not_found
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_tracks();
        if total > 0 {
            (self.tracks_found as f64 / total as f64) * 100.0
        } else {
            100.0
        }
    }

    pub fn summary(&self) -> ConversionSummary {
        ConversionSummary {
            tracks_found: self.tracks_found,
            tracks_not_found: self.tracks_not_found,
            conversion_successful: self.conversion_successful,
        }
    }
}

/// Write the result as pretty JSON under `dir`, one timestamped file per run.
pub fn save_conversion_result(result: &ConversionResult, dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    fs::create_dir_all(dir)?;

    let filename = dir.join(format!("conversion_result_{}.json", timestamp));
    let json = serde_json::to_string_pretty(result)?;

    fs::write(&filename, json)?;

    info!("Conversion result saved to: {}", filename.display());

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(found: usize, not_found: usize) -> ConversionResult {
        ConversionResult {
            tracks_found: found,
            tracks_not_found: not_found,
            conversion_successful: not_found == 0,
            destination: None,
            unmatched: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(result(3, 1).success_rate(), 75.0);
        assert_eq!(result(0, 0).success_rate(), 100.0);
        assert_eq!(result(0, 2).success_rate(), 0.0);
    }

    #[test]
    fn test_save_conversion_result() {
        let dir = std::env::temp_dir().join(format!("conversion-results-{}", std::process::id()));
        let mut saved = result(2, 1);
        saved.unmatched.push(Track::mock("Lost", "Someone"));

        let path = save_conversion_result(&saved, &dir).unwrap();
        let loaded: ConversionResult =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, saved);

        fs::remove_dir_all(&dir).ok();
    }
}
