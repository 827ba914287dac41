//! Spotify adapter (track search and lookup).
//!
//! Uses the Web API with the client-credentials flow; no user login involved.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};

use stb_core::{domain::Track, errors::Error, ports::MusicCatalog, Result};

const API_BASE: &str = "https://api.spotify.com/v1";
const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Refresh the token this long before Spotify says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    client_id: String,
    client_secret: String,
    api_base: String,
    accounts_base: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: API_BASE.to_string(),
            accounts_base: ACCOUNTS_BASE.to_string(),
            http,
            token: Mutex::new(None),
        })
    }

    /// Point the client at other hosts (mock servers in tests).
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        accounts_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.accounts_base = accounts_base.into();
        self
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref() {
            if Instant::now() < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        let resp = self
            .http
            .post(format!("{}/api/token", self.accounts_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("token request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "token request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("token json error: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        tracing::debug!(expires_in = token.expires_in, "fetched Spotify access token");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// GET an API path; `Ok(None)` on 404.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("request error: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "{path} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| Error::Upstream(format!("json error: {e}")))
    }
}

#[async_trait]
impl MusicCatalog for SpotifyClient {
    async fn search_track(&self, query: &str) -> Result<Option<Track>> {
        let found: Option<SearchResponse> = self
            .get_json("/search", &[("q", query), ("type", "track"), ("limit", "1")])
            .await?;
        Ok(found
            .and_then(|r| r.tracks.items.into_iter().next())
            .map(Track::from))
    }

    async fn get_track(&self, track_id: &str) -> Result<Option<Track>> {
        let found: Option<TrackObject> = self.get_json(&format!("/tracks/{track_id}"), &[]).await?;
        Ok(found.map(Track::from))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Paging,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<TrackObject>,
}

#[derive(Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<Named>,
    album: Named,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl From<TrackObject> for Track {
    fn from(t: TrackObject) -> Self {
        Track {
            id: t.id,
            title: t.name,
            artist: t
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            album: t.album.name,
            external_url: t.external_urls.spotify,
        }
    }
}
