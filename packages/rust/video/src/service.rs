//! Cached video lookups.
//!
//! Two independent TTL caches sit in front of [`YouTubeClient`]: search
//! results keyed by normalized query, limit, and filters, and video details
//! keyed by raw video id. Search hits also seed the details cache.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use learngen_shared::{LearnGenError, Result, VideoConfig, VideoResult};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::client::{SearchOptions, YouTubeClient};

/// Search cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SearchKey {
    query: String,
    limit: u32,
    options: SearchOptions,
}

/// Read-only snapshot of both caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCacheStats {
    pub video_cache_size: usize,
    pub search_cache_size: usize,
    pub cache_duration_hours: u64,
}

/// Case-folded, trimmed, whitespace-collapsed query text.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Video search and details with TTL caching. Cheap to clone; clones share
/// caches.
#[derive(Debug, Clone)]
pub struct VideoService {
    client: YouTubeClient,
    videos: Arc<TtlCache<String, VideoResult>>,
    searches: Arc<TtlCache<SearchKey, Vec<VideoResult>>>,
}

impl VideoService {
    /// Build a service on the wall clock.
    pub fn new(config: &VideoConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a service whose caches read time from `clock`.
    pub fn with_clock(config: &VideoConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            client: YouTubeClient::new(config)?,
            videos: Arc::new(TtlCache::new(config.cache_ttl_hours, clock.clone())),
            searches: Arc::new(TtlCache::new(config.cache_ttl_hours, clock)),
        })
    }

    /// Search for videos, serving repeated normalized queries from cache.
    ///
    /// Upstream failures are returned, never cached.
    #[instrument(skip_all, fields(query = %query, limit))]
    pub async fn search_videos(
        &self,
        query: &str,
        limit: u32,
        options: &SearchOptions,
    ) -> Result<Vec<VideoResult>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Err(LearnGenError::validation("search query is empty"));
        }

        let key = SearchKey {
            query: normalized,
            limit,
            options: options.clone(),
        };
        if let Some(hit) = self.searches.get(&key) {
            debug!(results = hit.len(), "search cache hit");
            return Ok(hit);
        }
        debug!("search cache miss");

        let videos = self.client.search_videos(query.trim(), limit, options).await?;

        for video in &videos {
            self.videos.put(video.video_id.clone(), video.clone());
        }
        self.searches.put(key, videos.clone());

        Ok(videos)
    }

    /// Full details for one video, cached by id.
    #[instrument(skip_all, fields(video_id = %video_id))]
    pub async fn get_video_details(&self, video_id: &str) -> Result<VideoResult> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(LearnGenError::validation("video id is empty"));
        }

        if let Some(hit) = self.videos.get(&video_id.to_string()) {
            debug!("video cache hit");
            return Ok(hit);
        }
        debug!("video cache miss");

        let video = self.client.video_details(video_id).await?;
        self.videos.put(video_id.to_string(), video.clone());
        Ok(video)
    }

    pub fn cache_stats(&self) -> VideoCacheStats {
        VideoCacheStats {
            video_cache_size: self.videos.len(),
            search_cache_size: self.searches.len(),
            cache_duration_hours: self.searches.ttl_hours(),
        }
    }

    /// Empty both caches.
    pub fn clear_cache(&self) {
        self.videos.clear();
        self.searches.clear();
        debug!("video caches cleared");
    }
}
