//! YouTube Data API v3 client.
//!
//! A search is two upstream calls: `search.list` for matching ids, then
//! `videos.list` to fill in duration and statistics. Every upstream failure
//! surfaces as [`LearnGenError::ExternalApi`]; nothing is swallowed here.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use learngen_shared::{LearnGenError, Result, VideoConfig, VideoResult};

use crate::duration::{format_duration, parse_iso8601};
use crate::links;

/// User-Agent string for video API requests.
const USER_AGENT: &str = concat!("LearnGen/", env!("CARGO_PKG_VERSION"));

/// `maxResults` bounds accepted by `search.list`.
const MIN_RESULTS: u32 = 1;
const MAX_RESULTS: u32 = 50;

/// The "Education" video category.
const EDUCATION_CATEGORY_ID: &str = "27";

// ---------------------------------------------------------------------------
// Search options
// ---------------------------------------------------------------------------

/// Filters applied to a video search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    /// Restrict to embeddable, safe-search-strict videos in the Education
    /// category.
    pub educational_only: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            educational_only: true,
        }
    }
}

impl SearchOptions {
    pub fn any() -> Self {
        Self {
            educational_only: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
    channel_id: String,
    published_at: Option<DateTime<Utc>>,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// Counts arrive as decimal strings; hidden counts are omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

impl VideoItem {
    fn into_result(self) -> VideoResult {
        let duration = self
            .content_details
            .and_then(|d| d.duration)
            .as_deref()
            .and_then(parse_iso8601)
            .unwrap_or(0);
        let stats = self.statistics.unwrap_or_default();
        let count = |raw: Option<String>| raw.and_then(|c| c.parse::<u64>().ok());

        VideoResult {
            url: links::watch_url(&self.id),
            embed_url: links::embed_url(&self.id),
            thumbnails: links::thumbnails(&self.id),
            title: self.snippet.title,
            description: self.snippet.description,
            channel_title: self.snippet.channel_title,
            channel_id: self.snippet.channel_id,
            published_at: self.snippet.published_at,
            duration,
            duration_formatted: format_duration(duration),
            view_count: count(stats.view_count).unwrap_or(0),
            like_count: count(stats.like_count),
            comment_count: count(stats.comment_count),
            tags: self.snippet.tags,
            video_id: self.id,
        }
    }
}

// ---------------------------------------------------------------------------
// YouTubeClient
// ---------------------------------------------------------------------------

/// Uncached access to the video search API.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(config: &VideoConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LearnGenError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Search for up to `limit` videos matching `query`, in relevance order.
    ///
    /// `limit` is clamped to the 1..=50 range the API accepts.
    #[instrument(skip_all, fields(query = %query, limit))]
    pub async fn search_videos(
        &self,
        query: &str,
        limit: u32,
        options: &SearchOptions,
    ) -> Result<Vec<VideoResult>> {
        let max_results = limit.clamp(MIN_RESULTS, MAX_RESULTS).to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("maxResults", max_results.as_str()),
        ];
        if options.educational_only {
            params.extend([
                ("videoCategoryId", EDUCATION_CATEGORY_ID),
                ("safeSearch", "strict"),
                ("videoEmbeddable", "true"),
            ]);
        }

        let found: ListResponse<SearchItem> = self.get("search", &params).await?;
        let ids: Vec<String> = found
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        debug!(hits = ids.len(), "search returned ids");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.fetch_videos(&ids).await
    }

    /// Full details for one video.
    #[instrument(skip_all, fields(video_id = %video_id))]
    pub async fn video_details(&self, video_id: &str) -> Result<VideoResult> {
        self.fetch_videos(&[video_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LearnGenError::youtube(Some(404), format!("video not found: {video_id}")))
    }

    /// `videos.list` for `ids`, returned in the order of `ids`.
    async fn fetch_videos(&self, ids: &[String]) -> Result<Vec<VideoResult>> {
        let joined = ids.join(",");
        let params = [("part", "snippet,contentDetails,statistics"), ("id", joined.as_str())];

        let listed: ListResponse<VideoItem> = self.get("videos", &params).await?;
        let mut by_id: HashMap<String, VideoResult> = listed
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item.into_result()))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{resource}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| LearnGenError::youtube(None, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            LearnGenError::youtube(Some(status.as_u16()), format!("failed to read body: {e}"))
        })?;

        if !status.is_success() {
            return Err(LearnGenError::youtube(
                Some(status.as_u16()),
                upstream_error_message(&body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            LearnGenError::youtube(
                Some(status.as_u16()),
                format!("unexpected {resource} response: {e}"),
            )
        })
    }
}

/// `reason: message` from a Data API error body, e.g.
/// `quotaExceeded: The request cannot be completed...`.
fn upstream_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let message = error.and_then(|e| e.get("message")).and_then(Value::as_str);
    let reason = error
        .and_then(|e| e.get("errors"))
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("reason"))
        .and_then(Value::as_str);

    match (reason, message) {
        (Some(reason), Some(message)) => format!("{reason}: {message}"),
        (None, Some(message)) => message.to_string(),
        (Some(reason), None) => reason.to_string(),
        (None, None) if body.trim().is_empty() => "empty error body".to_string(),
        (None, None) => body.chars().take(500).collect(),
    }
}
