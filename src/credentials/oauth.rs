use chrono::{TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::credentials::store::{Credential, CredentialCache, CredentialKey, Lookup};
use crate::error::{AppError, Result};

/// Tokens this close to expiry are refreshed instead of used.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// OAuth token endpoint of one platform, used for the client-credentials and
/// refresh-token grants.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http_client: Client,
    url: String,
    client_id: String,
    client_secret: String,
}

impl TokenEndpoint {
    pub fn new(
        http_client: Client,
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub async fn client_credentials(&self) -> Result<Credential> {
        self.request(&[("grant_type", "client_credentials")]).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        self.request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request(&self, grant: &[(&str, &str)]) -> Result<Credential> {
        let mut form: Vec<(&str, &str)> = grant.to_vec();
        form.push(("client_id", self.client_id.as_str()));
        form.push(("client_secret", self.client_secret.as_str()));

        let response = self
            .http_client
            .post(&self.url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Credential(format!(
                "Token request failed ({}): {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Credential(format!("Failed to parse token response: {}", e)))?;

        let expires_at = token
            .expires_in
            .and_then(TimeDelta::try_seconds)
            .map(|lifetime| Utc::now() + lifetime);

        Ok(Credential::new(token.access_token, expires_at).with_refresh_token(token.refresh_token))
    }
}

fn lookup_fresh(cache: &CredentialCache, key: &CredentialKey) -> Lookup {
    cache.get_at(key, Utc::now() + TimeDelta::seconds(EXPIRY_MARGIN_SECS))
}

/// Valid app credential from the cache, or a new one fetched and stored.
pub async fn app_credential(
    cache: &CredentialCache,
    endpoint: &TokenEndpoint,
    key: CredentialKey,
) -> Result<Credential> {
    if let Lookup::Valid(credential) = lookup_fresh(cache, &key) {
        return Ok(credential);
    }

    debug!("Fetching {} app token", key.platform);
    let credential = endpoint.client_credentials().await?;
    cache.put(key, credential.clone());
    Ok(credential)
}

/// Valid user credential from the cache, refreshed through the stale entry's
/// refresh token when needed.
pub async fn user_credential(
    cache: &CredentialCache,
    endpoint: &TokenEndpoint,
    key: CredentialKey,
) -> Result<Credential> {
    let stale = match lookup_fresh(cache, &key) {
        Lookup::Valid(credential) => return Ok(credential),
        Lookup::Stale(credential) => credential,
        Lookup::Absent => {
            return Err(AppError::Credential(format!(
                "No {} account is connected for this session",
                key.platform.display_name()
            )));
        }
    };

    let refresh_token = stale.refresh_token.ok_or_else(|| {
        AppError::Credential(format!(
            "{} token expired and cannot be refreshed",
            key.platform.display_name()
        ))
    })?;

    let mut credential = endpoint.refresh(&refresh_token).await?;
    if credential.refresh_token.is_none() {
        credential.refresh_token = Some(refresh_token);
    }

    info!("Refreshed {} user token", key.platform.display_name());
    cache.put(key, credential.clone());
    Ok(credential)
}

/// A non-expiring key (YouTube Data API key) stored in the cache.
pub fn api_key(cache: &CredentialCache, key: &CredentialKey) -> Result<String> {
    match cache.get(key) {
        Lookup::Valid(credential) if !credential.access_token.is_empty() => {
            Ok(credential.access_token)
        }
        _ => Err(AppError::Credential(format!(
            "No API key configured for {}",
            key.platform.display_name()
        ))),
    }
}
