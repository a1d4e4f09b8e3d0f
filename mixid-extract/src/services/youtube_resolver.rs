//! YouTube link resolver
//!
//! Two lookup modes:
//! - **Scrape** (default): fetch the public search results page and pull the
//!   first video id out of the HTML
//! - **Data API v3**: used instead when an API key is configured
//!
//! Never fails the run: any problem ends as "no link".

use crate::types::LinkResolver;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_URL: &str = "https://www.youtube.com/results";
const API_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""videoId":"([^"]+)""#).expect("valid videoId regex"));
static WATCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"/watch\?v=([^&"]+)"#).expect("valid watch regex"));

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    items: Vec<ApiSearchItem>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchItem {
    id: ApiItemId,
}

#[derive(Debug, Deserialize)]
struct ApiItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// Resolves `artist title` to a YouTube watch URL
pub struct YouTubeResolver {
    http_client: reqwest::Client,
    api_key: Option<String>,
    max_retries: u32,
}

impl YouTubeResolver {
    pub fn new(api_key: Option<String>, max_retries: u32) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_retries: max_retries.max(1),
        })
    }

    /// Scrape the search page, retrying transport failures
    async fn search_page(&self, query: &str) -> Option<String> {
        for attempt in 1..=self.max_retries {
            let result = self
                .http_client
                .get(SEARCH_URL)
                .query(&[("search_query", query)])
                .send()
                .await
                .and_then(|r| r.error_for_status());

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(attempt, query = %query, error = %e, "YouTube search attempt failed");
                    if attempt < self.max_retries {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    continue;
                }
            };

            return match response.text().await {
                Ok(html) => extract_video_id(&html).map(watch_url),
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Failed to read YouTube search page");
                    None
                }
            };
        }
        None
    }

    async fn search_api(&self, query: &str, api_key: &str) -> Option<String> {
        let result = async {
            self.http_client
                .get(API_SEARCH_URL)
                .query(&[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("maxResults", "1"),
                    ("key", api_key),
                ])
                .send()
                .await?
                .error_for_status()?
                .json::<ApiSearchResponse>()
                .await
        }
        .await;

        match result {
            Ok(body) => body
                .items
                .into_iter()
                .next()
                .and_then(|item| item.id.video_id)
                .map(watch_url),
            Err(e) => {
                tracing::error!(query = %query, error = %e, "YouTube API search failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl LinkResolver for YouTubeResolver {
    async fn resolve(&self, artist: &str, title: &str) -> Option<String> {
        if artist.trim().is_empty() || title.trim().is_empty() {
            return None;
        }
        let query = format!("{} {}", artist, title).trim().to_string();

        let link = match &self.api_key {
            Some(key) => self.search_api(&query, key).await,
            None => self.search_page(&query).await,
        };

        match &link {
            Some(url) => tracing::info!("Found YouTube video for {} - {}: {}", artist, title, url),
            None => tracing::warn!("Could not find YouTube video for {} - {}", artist, title),
        }
        link
    }
}

/// First video id in a search results page
pub fn extract_video_id(html: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(html)
        .or_else(|| WATCH_RE.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn watch_url(video_id: String) -> String {
    format!("{}{}", WATCH_URL, video_id)
}
