use crate::error::{AppError, Result};
use crate::models::Platform;

const DEFAULT_MAX_TRACKS: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_refresh_token: Option<String>,
    pub youtube_client_id: String,
    pub youtube_client_secret: String,
    pub youtube_api_key: String,
    pub youtube_refresh_token: Option<String>,
    /// Cap on tracks fetched per conversion. `None` means no cap.
    pub max_tracks: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        let max_tracks = match optional("ALLOWED_NUMBER_OF_CONVERSIONS") {
            None => Some(DEFAULT_MAX_TRACKS),
            Some(raw) => {
                let parsed: usize = raw.trim().parse().map_err(|_| {
                    AppError::Config(format!(
                        "ALLOWED_NUMBER_OF_CONVERSIONS must be a non-negative integer, got {:?}",
                        raw
                    ))
                })?;
                // 0 converts every track
                (parsed > 0).then_some(parsed)
            }
        };

        Ok(Self {
            spotify_client_id: var("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
            spotify_refresh_token: optional("SPOTIFY_REFRESH_TOKEN"),
            youtube_client_id: var("YOUTUBE_CLIENT_ID").unwrap_or_default(),
            youtube_client_secret: var("YOUTUBE_CLIENT_SECRET").unwrap_or_default(),
            youtube_api_key: var("YOUTUBE_API_KEY").unwrap_or_default(),
            youtube_refresh_token: optional("YOUTUBE_REFRESH_TOKEN"),
            max_tracks,
        })
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = self.missing_for(Platform::Spotify);
        missing.extend(self.missing_for(Platform::Youtube));
        missing
    }

    pub fn missing_for(&self, platform: Platform) -> Vec<String> {
        let required: Vec<(&str, &String)> = match platform {
            Platform::Spotify => vec![
                ("SPOTIFY_CLIENT_ID", &self.spotify_client_id),
                ("SPOTIFY_CLIENT_SECRET", &self.spotify_client_secret),
            ],
            Platform::Youtube => vec![
                ("YOUTUBE_CLIENT_ID", &self.youtube_client_id),
                ("YOUTUBE_CLIENT_SECRET", &self.youtube_client_secret),
                ("YOUTUBE_API_KEY", &self.youtube_api_key),
            ],
        };

        required
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn refresh_token_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Spotify => self.spotify_refresh_token.as_deref(),
            Platform::Youtube => self.youtube_refresh_token.as_deref(),
        }
    }
}
