use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::PlatformAdapter;
use crate::config::Config;
use crate::credentials::oauth::{api_key, user_credential};
use crate::credentials::{Credential, CredentialCache, CredentialKey, TokenEndpoint};
use crate::error::{AppError, Result};
use crate::models::{Platform, Playlist, Track};
use crate::youtube::models::{
    CreatedResource, ListResponse, NewPlaylist, NewPlaylistItem, PlaylistItemResource,
    PlaylistResource, SearchResource, search_query,
};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const PAGE_SIZE: usize = 50;
/// The "Music" video category.
const MUSIC_CATEGORY_ID: &str = "10";

/// YouTube Data API v3 over plain HTTP.
///
/// Reads are authorized with the API key kept in the credential cache;
/// writes use the session's OAuth token.
pub struct YoutubeAdapter {
    http_client: Client,
    api_base: String,
    credentials: Arc<CredentialCache>,
    token_endpoint: TokenEndpoint,
}

impl YoutubeAdapter {
    /// Also stores the configured API key in the cache.
    pub fn new(config: &Config, credentials: Arc<CredentialCache>) -> Self {
        credentials.put(
            CredentialKey::api_key(Platform::Youtube),
            Credential::non_expiring(&config.youtube_api_key),
        );

        let http_client = Client::new();
        let token_endpoint = TokenEndpoint::new(
            http_client.clone(),
            TOKEN_URL,
            &config.youtube_client_id,
            &config.youtube_client_secret,
        );

        Self::with_endpoints(http_client, YOUTUBE_API_BASE, credentials, token_endpoint)
    }

    pub fn with_endpoints(
        http_client: Client,
        api_base: impl Into<String>,
        credentials: Arc<CredentialCache>,
        token_endpoint: TokenEndpoint,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
            credentials,
            token_endpoint,
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.api_base, resource)
    }

    async fn user_token(&self, session_id: &str) -> Result<String> {
        let credential = user_credential(
            &self.credentials,
            &self.token_endpoint,
            CredentialKey::user(Platform::Youtube, session_id),
        )
        .await?;
        Ok(credential.access_token)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<ListResponse<T>> {
        let key = api_key(&self.credentials, &CredentialKey::api_key(Platform::Youtube))?;

        let request = self
            .http_client
            .get(self.url(resource))
            .query(query)
            .query(&[("key", key.as_str())]);

        send(request).await
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: &str,
        part: &str,
        body: &B,
        token: &str,
    ) -> Result<T> {
        let request = self
            .http_client
            .post(self.url(resource))
            .query(&[("part", part)])
            .bearer_auth(token)
            .json(body);

        send(request).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "YouTube API error ({}): {}",
            status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse YouTube response: {}", e)))
}

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn playlist_url(&self, playlist_id: &str) -> String {
        format!(
            "https://music.youtube.com/playlist?list={}",
            urlencoding::encode(playlist_id)
        )
    }

    async fn find_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>> {
        let page: ListResponse<PlaylistResource> = self
            .list(
                "playlists",
                &[
                    ("part", "id,snippet,contentDetails"),
                    ("id", playlist_id),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .find(|p| p.id == playlist_id)
            .map(PlaylistResource::into_playlist))
    }

    async fn list_tracks(&self, playlist_id: &str, max_items: Option<usize>) -> Result<Vec<Track>> {
        let page_size = PAGE_SIZE.to_string();
        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: ListResponse<PlaylistItemResource> = {
                let mut query = vec![
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", page_size.as_str()),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                self.list("playlistItems", &query).await?
            };
            tracks.extend(page.items.into_iter().filter_map(PlaylistItemResource::into_track));

            page_token = page.next_page_token;
            if max_items.is_some_and(|max| tracks.len() >= max) || page_token.is_none() {
                break;
            }
        }

        if let Some(max) = max_items {
            tracks.truncate(max);
        }

        info!("Fetched {} tracks from YouTube playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    async fn search_track(&self, title: &str, artist: Option<&str>) -> Result<Option<Track>> {
        let q = search_query(title, artist);
        let page: ListResponse<SearchResource> = self
            .list(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                    ("maxResults", "1"),
                    ("q", q.as_str()),
                ],
            )
            .await?;

        Ok(page.items.into_iter().find_map(SearchResource::into_track))
    }

    async fn create_playlist(
        &self,
        title: &str,
        _user_id: Option<&str>,
        session_id: &str,
    ) -> Result<String> {
        let token = self.user_token(session_id).await?;

        let created: CreatedResource = self
            .insert("playlists", "snippet,status", &NewPlaylist::private(title), &token)
            .await?;

        info!("Created YouTube playlist '{}' ({})", title, created.id);
        Ok(created.id)
    }

    async fn add_tracks(&self, playlist_id: &str, tracks: &[Track], session_id: &str) -> Result<()> {
        if tracks.is_empty() {
            return Ok(());
        }

        let token = self.user_token(session_id).await?;
        let mut failed = 0;

        for track in tracks {
            let Some(video_id) = track.id.as_deref() else {
                warn!("Track '{}' has no video id, skipping", track.title);
                failed += 1;
                continue;
            };

            let body = NewPlaylistItem::video(playlist_id, video_id);
            match self
                .insert::<_, CreatedResource>("playlistItems", "snippet", &body, &token)
                .await
            {
                Ok(_) => debug!("Added '{}' to {}", track.title, playlist_id),
                Err(e) => {
                    warn!("Failed to add '{}' to playlist: {}", track.title, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(AppError::Upstream(format!(
                "{} of {} tracks could not be added to the YouTube playlist",
                failed,
                tracks.len()
            )));
        }

        info!("Added {} tracks to YouTube playlist {}", tracks.len(), playlist_id);
        Ok(())
    }
}
