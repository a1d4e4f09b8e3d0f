//! ACRCloud identification client
//!
//! Sends one segment per request to the ACRCloud identify v1 endpoint and maps
//! the JSON answer onto a [`RecognitionOutcome`].
//!
//! Requests are signed with HMAC-SHA1 over
//! `POST\n/v1/identify\n{access_key}\naudio\n1\n{timestamp}` using the access
//! secret, base64-encoded. Consecutive requests are spaced by a minimum
//! interval to stay under the account's rate limit.

use crate::models::{RecognitionOutcome, Segment, FATAL_STATUS_CODES};
use crate::types::Recognizer;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const IDENTIFY_PATH: &str = "/v1/identify";
const DATA_TYPE: &str = "audio";
const SIGNATURE_VERSION: &str = "1";
const USER_AGENT: &str = concat!("mixid/", env!("CARGO_PKG_VERSION"));

pub const STATUS_SUCCESS: i32 = 0;
/// Fingerprint matched nothing
pub const STATUS_NO_RESULT: i32 = 1001;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 200;

type HmacSha1 = Hmac<Sha1>;

/// ACRCloud client errors
#[derive(Debug, Error)]
pub enum AcrCloudError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}: {1}")]
    Http(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to read segment audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("Signing error: {0}")]
    Signing(String),
}

/// Connection settings for one ACRCloud project
#[derive(Debug, Clone)]
pub struct AcrCloudConfig {
    /// Project host, e.g. `identify-eu-west-1.acrcloud.com`
    pub host: String,
    pub access_key: String,
    pub access_secret: String,
    pub timeout: Duration,
    /// Minimum spacing between two identify requests
    pub min_interval: Duration,
}

impl AcrCloudConfig {
    pub fn new(
        host: impl Into<String>,
        access_key: impl Into<String>,
        access_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            access_key: access_key.into(),
            access_secret: access_secret.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            min_interval: Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
        }
    }

    /// Full identify URL; a bare host gets `https://`
    pub fn identify_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{}", host, IDENTIFY_PATH)
        } else {
            format!("https://{}{}", host, IDENTIFY_PATH)
        }
    }
}

/// Identify response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcrCloudResponse {
    pub status: AcrCloudStatus,
    #[serde(default)]
    pub metadata: Option<AcrCloudMetadata>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcrCloudStatus {
    pub code: i32,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AcrCloudMetadata {
    #[serde(default)]
    pub music: Vec<AcrCloudMusic>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcrCloudMusic {
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<AcrCloudArtist>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcrCloudArtist {
    pub name: Option<String>,
}

/// Spaces consecutive requests by at least `min_interval`
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("ACRCloud rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// ACRCloud identify client
pub struct AcrCloudClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    config: AcrCloudConfig,
}

impl AcrCloudClient {
    pub fn new(config: AcrCloudConfig) -> Result<Self, AcrCloudError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AcrCloudError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(config.min_interval)),
            config,
        })
    }

    /// Submit one audio sample and return the raw response
    pub async fn identify(&self, sample: Vec<u8>) -> Result<AcrCloudResponse, AcrCloudError> {
        self.rate_limiter.wait().await;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &self.config.access_secret,
            &string_to_sign(&self.config.access_key, &timestamp),
        )?;

        let sample_bytes = sample.len().to_string();
        let form = reqwest::multipart::Form::new()
            .text("access_key", self.config.access_key.clone())
            .text("sample_bytes", sample_bytes)
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("data_type", DATA_TYPE)
            .text("signature_version", SIGNATURE_VERSION)
            .part(
                "sample",
                reqwest::multipart::Part::bytes(sample).file_name("sample.wav"),
            );

        let response = self
            .http_client
            .post(self.config.identify_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AcrCloudError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AcrCloudError::Http(status.as_u16(), error_text));
        }

        response
            .json::<AcrCloudResponse>()
            .await
            .map_err(|e| AcrCloudError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Recognizer for AcrCloudClient {
    async fn recognize(&self, segment: &Segment) -> RecognitionOutcome {
        let result = async {
            let sample = tokio::fs::read(&segment.media).await?;
            self.identify(sample).await
        }
        .await;

        match result {
            Ok(response) => {
                tracing::debug!(
                    segment = segment.index,
                    code = response.status.code,
                    msg = %response.status.msg,
                    "ACRCloud response"
                );
                map_response(response)
            }
            Err(e) => RecognitionOutcome::Error {
                message: e.to_string(),
                code: None,
            },
        }
    }
}

/// Map an identify response onto a recognition outcome
pub fn map_response(response: AcrCloudResponse) -> RecognitionOutcome {
    let AcrCloudStatus { code, msg } = response.status;

    match code {
        STATUS_SUCCESS => best_match(response.metadata.unwrap_or_default()),
        STATUS_NO_RESULT => RecognitionOutcome::NotFound,
        c if FATAL_STATUS_CODES.contains(&c) => RecognitionOutcome::FatalError {
            message: msg,
            code: Some(c),
        },
        c => RecognitionOutcome::Error {
            message: msg,
            code: Some(c),
        },
    }
}

/// First music entry with its first artist; incomplete metadata is a miss
fn best_match(metadata: AcrCloudMetadata) -> RecognitionOutcome {
    let Some(top) = metadata.music.into_iter().next() else {
        return RecognitionOutcome::NotFound;
    };
    let artist = top.artists.into_iter().next().and_then(|a| a.name);

    match (artist, top.title) {
        (Some(artist), Some(title)) => RecognitionOutcome::Identified { artist, title },
        _ => RecognitionOutcome::NotFound,
    }
}

fn string_to_sign(access_key: &str, timestamp: &str) -> String {
    format!(
        "POST\n{}\n{}\n{}\n{}\n{}",
        IDENTIFY_PATH, access_key, DATA_TYPE, SIGNATURE_VERSION, timestamp
    )
}

/// Base64 HMAC-SHA1 of `message` keyed by `secret`
fn sign(secret: &str, message: &str) -> Result<String, AcrCloudError> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| AcrCloudError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
