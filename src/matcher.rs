use strsim::jaro_winkler;
use tracing::{debug, warn};

use crate::adapter::PlatformAdapter;
use crate::error::AppError;
use crate::models::Track;

/// Accepted candidates scoring below this are logged as suspicious.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;

#[derive(Debug)]
pub enum MatchOutcome {
    Found(Track),
    NotFound,
    /// The search itself failed; counted like a miss.
    Failed(AppError),
}

/// Title plus primary artist, the only inputs the destination search gets.
pub fn search_terms(track: &Track) -> (&str, Option<&str>) {
    (track.title.trim(), track.primary_artist())
}

/// Ask the destination for its top result and accept it as-is.
///
/// There is no similarity gate: a candidate with the right title but the
/// wrong artist is still accepted. The score below only feeds the logs.
pub async fn find_match(destination: &dyn PlatformAdapter, track: &Track) -> MatchOutcome {
    let (title, artist) = search_terms(track);

    match destination.search_track(title, artist).await {
        Ok(Some(candidate)) => {
            let score = calculate_similarity(track, &candidate);
            if score < LOW_CONFIDENCE_THRESHOLD {
                warn!(
                    "Accepted low-confidence match for '{}': '{}' ({:.2})",
                    track.title, candidate.title, score
                );
            } else {
                debug!("Matched '{}' with score {:.2}", track.title, score);
            }
            MatchOutcome::Found(candidate)
        }
        Ok(None) => {
            debug!("No match found for track: {}", track.title);
            MatchOutcome::NotFound
        }
        Err(e) => {
            warn!("Search failed for track '{}': {}", track.title, e);
            MatchOutcome::Failed(e)
        }
    }
}

/// Calculate similarity score between a source track and a candidate.
/// Weighted: 40% title + 40% artist + 10% album + 10% duration. Missing
/// album or duration data on either side scores neutral (0.5).
pub fn calculate_similarity(source: &Track, candidate: &Track) -> f64 {
    let title_score = jaro_winkler(
        &source.title.to_lowercase(),
        &candidate.title.to_lowercase(),
    );

    let artist_score = match (source.primary_artist(), candidate.primary_artist()) {
        (Some(s_artist), Some(c_artist)) => {
            jaro_winkler(&s_artist.to_lowercase(), &c_artist.to_lowercase())
        }
        _ => 0.0,
    };

    let album_score = if source.album.is_empty() || candidate.album.is_empty() {
        0.5
    } else {
        jaro_winkler(&source.album.to_lowercase(), &candidate.album.to_lowercase())
    };

    // within 5s = 100%, within 15s = 80%, else 50%
    let duration_score = match (source.duration_ms, candidate.duration_ms) {
        (Some(s), Some(c)) => {
            let diff_secs = (s as i64 - c as i64).abs() / 1000;
            match diff_secs {
                0..=5 => 1.0,
                6..=15 => 0.8,
                _ => 0.5,
            }
        }
        _ => 0.5,
    };

    title_score * 0.4 + artist_score * 0.4 + album_score * 0.1 + duration_score * 0.1
}
