use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Platform, Playlist, Track};

/// Normalized operations the converter needs from one streaming platform.
///
/// Implementations own their credentials: they read them from the shared
/// credential cache and refresh lazily when a read comes back stale.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Whether playlist creation has to be scoped to a resolved user id.
    fn requires_user_id(&self) -> bool {
        false
    }

    fn playlist_url(&self, playlist_id: &str) -> String;

    /// `Ok(None)` when the playlist does not exist.
    async fn find_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>>;

    async fn list_tracks(&self, playlist_id: &str, max_items: Option<usize>) -> Result<Vec<Track>>;

    /// Top search result only; `Ok(None)` when nothing matched.
    async fn search_track(&self, title: &str, artist: Option<&str>) -> Result<Option<Track>>;

    async fn resolve_user_id(&self, _session_id: &str) -> Result<String> {
        Err(AppError::Validation(format!(
            "{} playlists are not scoped to a user id",
            self.platform().display_name()
        )))
    }

    async fn create_playlist(
        &self,
        title: &str,
        user_id: Option<&str>,
        session_id: &str,
    ) -> Result<String>;

    async fn add_tracks(&self, playlist_id: &str, tracks: &[Track], session_id: &str)
        -> Result<()>;
}
