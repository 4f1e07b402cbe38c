//! Educational video search for LearnGen lessons.
//!
//! - [`client`]: uncached YouTube Data API access
//! - [`links`]: video id extraction, watch/embed/thumbnail URLs
//! - [`duration`]: ISO-8601 duration parsing and display
//! - [`cache`]: TTL cache with an injectable clock
//! - [`service`]: cached search and details
//! - [`enricher`]: bounded-concurrency search across a course's lessons

pub mod cache;
pub mod client;
pub mod duration;
pub mod enricher;
pub mod links;
pub mod service;

pub use cache::{CacheEntry, CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use client::{SearchOptions, YouTubeClient};
pub use enricher::{CourseVideos, LessonQuery, VideoEnricher};
pub use links::{ThumbnailQuality, extract_video_id, thumbnail_url};
pub use service::{VideoCacheStats, VideoService};
