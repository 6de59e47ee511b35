//! Spotify Web API track client
//!
//! Resolves a Spotify track id through `GET {base_url}/tracks/{id}` with a
//! bearer token. Requests are rate limited, and transient failures (429,
//! 5xx, network) are retried with exponential backoff before the lookup
//! is reported as unreachable.

use crate::models::MetadataRecord;
use crate::services::metadata_source::{MetadataSource, SourceOutcome};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tunescout_common::config::MetadataSettings;
use tunescout_common::rate_limit::RateLimiter;

const USER_AGENT: &str = "TuneScout/0.1.0";
/// First retry delay; doubles on every further attempt
const RETRY_BASE_DELAY_MS: u64 = 500;
/// Upper bound for a server-requested Retry-After wait
const MAX_RETRY_AFTER_SECS: u64 = 30;
/// Upper bound for a computed backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: Option<Duration> },

    #[error("Access token rejected")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl SpotifyError {
    /// Whether another attempt could succeed
    fn is_transient(&self) -> bool {
        match self {
            SpotifyError::NetworkError(_) | SpotifyError::RateLimitExceeded { .. } => true,
            SpotifyError::ApiError(status, _) => *status >= 500,
            _ => false,
        }
    }
}

/// Spotify track object (subset)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyTrack {
    /// Spotify track id
    pub id: Option<String>,
    /// Track name
    pub name: String,
    /// Credited artists, in credit order
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    /// Album the track appears on
    pub album: Option<SpotifyAlbum>,
    /// Track length in milliseconds
    pub duration_ms: Option<u64>,
}

/// Simplified Spotify artist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyArtist {
    pub name: String,
}

/// Simplified Spotify album object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyAlbum {
    pub name: String,
    /// Cover images, widest first
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// Spotify image object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl SpotifyTrack {
    /// Convert to a normalized record; `None` when no title or artist survives
    pub fn into_record(self) -> Option<MetadataRecord> {
        let mut record = MetadataRecord::new(self.name, self.artists.into_iter().map(|a| a.name));

        if let Some(album) = self.album {
            record.art_url = album.images.into_iter().next().map(|image| image.url);
            record.album = Some(album.name);
        }
        record.duration_ms = self.duration_ms;

        record.normalized()
    }
}

/// Client settings, usually derived from `MetadataSettings`
#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    pub base_url: String,
    pub access_token: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub rate_limit: Duration,
    pub retry_base_delay: Duration,
}

impl SpotifyClientConfig {
    pub fn from_settings(settings: &MetadataSettings, access_token: String) -> Self {
        Self {
            base_url: settings.api_base_url.clone(),
            access_token,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            max_retries: settings.max_retries,
            rate_limit: Duration::from_millis(settings.rate_limit_ms),
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }
}

/// Whether `track_id` has the shape of a Spotify id (base62)
///
/// Anything else cannot name a track and must never reach the URL path.
pub fn is_spotify_id(track_id: &str) -> bool {
    !track_id.is_empty() && track_id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Exponential backoff for the given zero-based retry attempt, capped
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_BACKOFF)
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: Url,
    config: SpotifyClientConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyClientConfig) -> Result<Self, SpotifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SpotifyError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SpotifyError::InvalidBaseUrl(config.base_url.clone()));
        }

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(config.rate_limit),
            base_url,
            config,
        })
    }

    /// `{base_url}/tracks/{track_id}` with the id as one encoded segment
    fn track_url(&self, track_id: &str) -> Result<Url, SpotifyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SpotifyError::InvalidBaseUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .push("tracks")
            .push(track_id);
        Ok(url)
    }

    /// Single lookup attempt, no retries
    ///
    /// Ids that are not base62 are answered with `TrackNotFound` without
    /// any request.
    pub async fn lookup_track(&self, track_id: &str) -> Result<SpotifyTrack, SpotifyError> {
        if !is_spotify_id(track_id) {
            tracing::debug!(track_id = ?track_id, "Not a Spotify track id, skipping request");
            return Err(SpotifyError::TrackNotFound(track_id.to_string()));
        }

        let url = self.track_url(track_id)?;
        self.rate_limiter.wait().await;

        tracing::debug!(track_id = %track_id, url = %url, "Querying Spotify API");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let status = response.status();

        // 400 is what Spotify answers for ids that are not valid base62
        if status == 404 || status == 400 {
            return Err(SpotifyError::TrackNotFound(track_id.to_string()));
        }

        if status == 401 || status == 403 {
            return Err(SpotifyError::Unauthorized);
        }

        if status == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)));
            return Err(SpotifyError::RateLimitExceeded { retry_after });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::ApiError(status.as_u16(), error_text));
        }

        let track: SpotifyTrack = response
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

        tracing::info!(
            track_id = %track_id,
            title = %track.name,
            artist = %track.artists.first().map(|a| a.name.as_str()).unwrap_or("Unknown"),
            "Retrieved track from Spotify"
        );

        Ok(track)
    }

    /// Lookup with the configured retry policy applied
    pub async fn lookup_track_with_retry(&self, track_id: &str) -> Result<SpotifyTrack, SpotifyError> {
        let mut attempt: u32 = 0;

        loop {
            match self.lookup_track(track_id).await {
                Ok(track) => return Ok(track),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = match &e {
                        SpotifyError::RateLimitExceeded {
                            retry_after: Some(retry_after),
                        } => *retry_after,
                        _ => backoff_delay(self.config.retry_base_delay, attempt),
                    };
                    attempt += 1;

                    tracing::warn!(
                        track_id = %track_id,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Spotify lookup failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl MetadataSource for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    async fn fetch(&self, track_id: &str) -> SourceOutcome {
        match self.lookup_track_with_retry(track_id).await {
            Ok(track) => match track.into_record() {
                Some(record) => SourceOutcome::Found(record),
                None => {
                    tracing::warn!(track_id = %track_id, "Spotify track has no usable title or artists");
                    SourceOutcome::NotFound
                }
            },
            Err(SpotifyError::TrackNotFound(_)) => SourceOutcome::NotFound,
            Err(SpotifyError::Unauthorized) => {
                tracing::error!("Spotify rejected the access token; check TUNESCOUT_SPOTIFY_TOKEN");
                SourceOutcome::Unreachable(SpotifyError::Unauthorized.to_string())
            }
            Err(e) => SourceOutcome::Unreachable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> SpotifyClientConfig {
        SpotifyClientConfig {
            base_url: base_url.to_string(),
            access_token: "test-token".to_string(),
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            rate_limit: Duration::from_millis(0),
            retry_base_delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = SpotifyClient::new(test_config("https://api.spotify.com/v1"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = SpotifyClient::new(test_config("not a url"));
        assert!(matches!(result, Err(SpotifyError::InvalidBaseUrl(_))));

        let result = SpotifyClient::new(test_config("mailto:someone@example.com"));
        assert!(matches!(result, Err(SpotifyError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_track_url_keeps_id_in_one_segment() {
        let client = SpotifyClient::new(test_config("https://api.spotify.com/v1/")).unwrap();

        let url = client.track_url("0VjIjW4GlUZAMYd2vXMi3b").unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/tracks/0VjIjW4GlUZAMYd2vXMi3b");

        let url = client.track_url("../albums/x?y#z").unwrap();
        assert_eq!(url.path(), "/v1/tracks/..%2Falbums%2Fx%3Fy%23z");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_spotify_id_shape() {
        assert!(is_spotify_id("0VjIjW4GlUZAMYd2vXMi3b"));
        assert!(!is_spotify_id(""));
        assert!(!is_spotify_id("../albums/4yP0hdKOZPNshxUOjY0cZj"));
        assert!(!is_spotify_id("abc?market=US"));
        assert!(!is_spotify_id("abc def"));
        assert!(!is_spotify_id("caf\u{e9}"));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let base = Duration::from_millis(500);

        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 20), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, 64), MAX_BACKOFF);
    }

    #[test]
    fn test_transient_classification() {
        assert!(SpotifyError::NetworkError("reset".into()).is_transient());
        assert!(SpotifyError::RateLimitExceeded { retry_after: None }.is_transient());
        assert!(SpotifyError::ApiError(503, String::new()).is_transient());
        assert!(!SpotifyError::ApiError(418, String::new()).is_transient());
        assert!(!SpotifyError::TrackNotFound("x".into()).is_transient());
        assert!(!SpotifyError::Unauthorized.is_transient());
    }

    #[test]
    fn test_track_payload_maps_to_record() {
        let payload = r#"{
            "id": "0VjIjW4GlUZAMYd2vXMi3b",
            "name": "Blinding Lights",
            "duration_ms": 200040,
            "artists": [{"name": "The Weeknd", "id": "1Xyo4u8uXC1ZmMpatF05PJ"}],
            "album": {
                "name": "After Hours",
                "images": [
                    {"url": "https://i.scdn.co/image/large", "width": 640, "height": 640},
                    {"url": "https://i.scdn.co/image/small", "width": 64, "height": 64}
                ]
            },
            "popularity": 90
        }"#;

        let track: SpotifyTrack = serde_json::from_str(payload).unwrap();
        let record = track.into_record().unwrap();

        assert_eq!(record.title, "Blinding Lights");
        assert_eq!(record.artists, vec!["The Weeknd"]);
        assert_eq!(record.album.as_deref(), Some("After Hours"));
        assert_eq!(record.duration_ms, Some(200_040));
        assert_eq!(record.art_url.as_deref(), Some("https://i.scdn.co/image/large"));
    }

    #[test]
    fn test_track_payload_without_artists_is_unusable() {
        let payload = r#"{"name": "Mystery", "artists": []}"#;
        let track: SpotifyTrack = serde_json::from_str(payload).unwrap();

        assert!(track.into_record().is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = MetadataSettings::default();
        let config = SpotifyClientConfig::from_settings(&settings, "tok".to_string());

        assert_eq!(config.base_url, settings.api_base_url);
        assert_eq!(config.max_retries, settings.max_retries);
        assert_eq!(config.rate_limit, Duration::from_millis(settings.rate_limit_ms));
    }
}
