use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rspotify::{
    http::HttpError,
    model::{PlayableId, PlaylistId, SearchResult, SearchType, TrackId, UserId},
    prelude::*,
    AuthCodeSpotify, ClientCredsSpotify, ClientError, Token,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::PlatformAdapter;
use crate::config::Config;
use crate::credentials::oauth::{app_credential, user_credential};
use crate::credentials::{Credential, CredentialCache, CredentialKey, TokenEndpoint};
use crate::error::{AppError, Result};
use crate::models::{Platform, Playlist, Track};
use crate::spotify::models::{
    candidate_from_full, playlist_from_full, search_query, track_from_item,
};

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const PAGE_LIMIT: u32 = 100;
const ADD_BATCH_SIZE: usize = 100;

/// Spotify Web API through rspotify.
///
/// Reads use an app token (client credentials); playlist creation and
/// track adds use the session's user token. Both live in the shared cache
/// and are refreshed here when stale.
pub struct SpotifyAdapter {
    credentials: Arc<CredentialCache>,
    token_endpoint: TokenEndpoint,
}

impl SpotifyAdapter {
    pub fn new(config: &Config, credentials: Arc<CredentialCache>) -> Self {
        let token_endpoint = TokenEndpoint::new(
            reqwest::Client::new(),
            TOKEN_URL,
            &config.spotify_client_id,
            &config.spotify_client_secret,
        );
        Self::with_token_endpoint(credentials, token_endpoint)
    }

    pub fn with_token_endpoint(
        credentials: Arc<CredentialCache>,
        token_endpoint: TokenEndpoint,
    ) -> Self {
        Self {
            credentials,
            token_endpoint,
        }
    }

    async fn app_client(&self) -> Result<ClientCredsSpotify> {
        let credential = app_credential(
            &self.credentials,
            &self.token_endpoint,
            CredentialKey::app(Platform::Spotify),
        )
        .await?;
        Ok(ClientCredsSpotify::from_token(rspotify_token(&credential)))
    }

    async fn user_client(&self, session_id: &str) -> Result<AuthCodeSpotify> {
        let credential = user_credential(
            &self.credentials,
            &self.token_endpoint,
            CredentialKey::user(Platform::Spotify, session_id),
        )
        .await?;
        Ok(AuthCodeSpotify::from_token(rspotify_token(&credential)))
    }
}

/// rspotify token for an already refreshed credential. A missing expiry is
/// pushed an hour out so rspotify never tries to refresh on its own.
fn rspotify_token(credential: &Credential) -> Token {
    let expires_at = credential
        .expires_at
        .unwrap_or_else(|| Utc::now() + TimeDelta::hours(1));

    Token {
        access_token: credential.access_token.clone(),
        expires_at: Some(expires_at),
        refresh_token: credential.refresh_token.clone(),
        ..Default::default()
    }
}

/// Spotify answers unknown or malformed ids with 404 or 400.
fn is_missing(err: &ClientError) -> bool {
    match err {
        ClientError::Http(http) => matches!(
            &**http,
            HttpError::StatusCode(response) if matches!(response.status().as_u16(), 400 | 404)
        ),
        _ => false,
    }
}

fn parse_playlist_id(playlist_id: &str) -> Result<PlaylistId<'_>> {
    PlaylistId::from_id(playlist_id)
        .map_err(|e| AppError::Validation(format!("Invalid Spotify playlist ID: {}", e)))
}

#[async_trait]
impl PlatformAdapter for SpotifyAdapter {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn requires_user_id(&self) -> bool {
        true
    }

    fn playlist_url(&self, playlist_id: &str) -> String {
        format!("https://open.spotify.com/playlist/{}", playlist_id)
    }

    async fn find_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>> {
        let Ok(id) = PlaylistId::from_id(playlist_id) else {
            debug!("Not a Spotify playlist id: {}", playlist_id);
            return Ok(None);
        };

        let client = self.app_client().await?;
        match client.playlist(id, None, None).await {
            Ok(playlist) => Ok(Some(playlist_from_full(&playlist))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_tracks(&self, playlist_id: &str, max_items: Option<usize>) -> Result<Vec<Track>> {
        let id = parse_playlist_id(playlist_id)?;
        let client = self.app_client().await?;

        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page = client
                .playlist_items_manual(id.clone_static(), None, None, Some(PAGE_LIMIT), Some(offset))
                .await?;

            tracks.extend(page.items.iter().filter_map(track_from_item));

            if max_items.is_some_and(|max| tracks.len() >= max) || page.next.is_none() {
                break;
            }
            offset += PAGE_LIMIT;
        }

        if let Some(max) = max_items {
            tracks.truncate(max);
        }

        info!("Fetched {} tracks from Spotify playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    async fn search_track(&self, title: &str, artist: Option<&str>) -> Result<Option<Track>> {
        let client = self.app_client().await?;
        let query = search_query(title, artist);

        let result = client
            .search(&query, SearchType::Track, None, None, Some(1), None)
            .await?;

        match result {
            SearchResult::Tracks(page) => Ok(page.items.first().and_then(candidate_from_full)),
            _ => Ok(None),
        }
    }

    async fn resolve_user_id(&self, session_id: &str) -> Result<String> {
        let client = self.user_client(session_id).await?;
        let user = client.current_user().await?;
        debug!("Resolved Spotify user {}", user.id.id());
        Ok(user.id.id().to_string())
    }

    async fn create_playlist(
        &self,
        title: &str,
        user_id: Option<&str>,
        session_id: &str,
    ) -> Result<String> {
        let user_id = user_id.ok_or_else(|| {
            AppError::Validation("Spotify playlists need the owner's user id".into())
        })?;
        let user_id = UserId::from_id(user_id)
            .map_err(|e| AppError::Validation(format!("Invalid Spotify user ID: {}", e)))?;

        let client = self.user_client(session_id).await?;
        let playlist = client
            .user_playlist_create(user_id, title, Some(false), Some(false), None)
            .await?;

        info!("Created Spotify playlist '{}' ({})", title, playlist.id.id());
        Ok(playlist.id.id().to_string())
    }

    async fn add_tracks(&self, playlist_id: &str, tracks: &[Track], session_id: &str) -> Result<()> {
        let playlist_id = parse_playlist_id(playlist_id)?;

        let mut items = Vec::with_capacity(tracks.len());
        for track in tracks {
            let uri = track.id.as_deref().ok_or_else(|| {
                AppError::Validation(format!("Track '{}' has no Spotify id", track.title))
            })?;
            let id = TrackId::from_uri(uri)
                .or_else(|_| TrackId::from_id(uri))
                .map_err(|e| AppError::Validation(format!("Invalid Spotify track ID: {}", e)))?;
            items.push(PlayableId::Track(id.into_static()));
        }

        if items.is_empty() {
            return Ok(());
        }

        let client = self.user_client(session_id).await?;
        for chunk in items.chunks(ADD_BATCH_SIZE) {
            client
                .playlist_add_items(playlist_id.clone_static(), chunk.to_vec(), None)
                .await?;
            debug!("Added batch of {} tracks", chunk.len());
        }

        info!("Added {} tracks to Spotify playlist {}", items.len(), playlist_id.id());
        Ok(())
    }
}
