//! Bulk per-lesson video enrichment with bounded concurrency.
//!
//! Lessons are looked up on spawned tasks gated by a semaphore sized from
//! config. The tasks are owned by the call, so dropping its future cancels
//! every lookup still in flight. Results are collected in input order regardless of completion
//! order. A failed or timed-out lesson degrades to an empty bundle; the rest
//! of the batch is unaffected.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::ser::SerializeMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use learngen_shared::{Lesson, LessonVideoBundle, VideoConfig};

use crate::client::SearchOptions;
use crate::service::VideoService;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One lesson to enrich: the key it is reported under and the keywords its
/// search query is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonQuery {
    pub key: String,
    pub keywords: Vec<String>,
}

impl LessonQuery {
    pub fn new(key: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            key: key.into(),
            keywords,
        }
    }

    /// Keywords joined with spaces, or the key when there are none.
    pub fn search_text(&self) -> String {
        let joined = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            self.key.clone()
        } else {
            joined
        }
    }
}

/// A bare keyword string is both the key and the query.
impl From<&str> for LessonQuery {
    fn from(text: &str) -> Self {
        Self::new(text, vec![text.to_string()])
    }
}

/// Keyed by lesson title, searched by the lesson's keywords.
impl From<&Lesson> for LessonQuery {
    fn from(lesson: &Lesson) -> Self {
        Self::new(lesson.title.clone(), lesson.search_keywords.clone())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Lesson key to bundle, in the order the lessons were supplied.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseVideos {
    entries: Vec<(String, LessonVideoBundle)>,
}

impl CourseVideos {
    /// Key finished bundles by lesson title. Later duplicates are ignored.
    pub fn from_bundles(bundles: impl IntoIterator<Item = LessonVideoBundle>) -> Self {
        let mut entries: Vec<(String, LessonVideoBundle)> = Vec::new();
        for bundle in bundles {
            if entries.iter().all(|(k, _)| *k != bundle.lesson_title) {
                entries.push((bundle.lesson_title.clone(), bundle));
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&LessonVideoBundle> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, b)| b)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LessonVideoBundle)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the bundle for `key`.
    pub fn take(&mut self, key: &str) -> Option<LessonVideoBundle> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }
}

impl IntoIterator for CourseVideos {
    type Item = (String, LessonVideoBundle);
    type IntoIter = std::vec::IntoIter<(String, LessonVideoBundle)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for CourseVideos {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, bundle) in &self.entries {
            map.serialize_entry(key, bundle)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// VideoEnricher
// ---------------------------------------------------------------------------

/// Finds recommended videos for every lesson of a course.
#[derive(Debug, Clone)]
pub struct VideoEnricher {
    service: VideoService,
    videos_per_lesson: u32,
    concurrency: usize,
    lesson_timeout: Duration,
    options: SearchOptions,
}

impl VideoEnricher {
    pub fn new(service: VideoService, config: &VideoConfig) -> Self {
        Self {
            service,
            videos_per_lesson: config.videos_per_lesson,
            concurrency: usize::try_from(config.concurrency).unwrap_or(usize::MAX).max(1),
            lesson_timeout: Duration::from_secs(config.lesson_timeout_secs),
            options: SearchOptions::default(),
        }
    }

    /// Override the per-lesson lookup deadline.
    pub fn with_lesson_timeout(mut self, timeout: Duration) -> Self {
        self.lesson_timeout = timeout;
        self
    }

    /// Override the maximum number of lookups in flight.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn service(&self) -> &VideoService {
        &self.service
    }

    /// Search videos for each lesson, at most `concurrency` at a time.
    ///
    /// The result holds one entry per distinct lesson key, in input order.
    /// Duplicate keys keep their first occurrence.
    #[instrument(skip_all, fields(lessons = lessons.len(), concurrency = self.concurrency))]
    pub async fn bulk_search_for_course(&self, lessons: &[LessonQuery]) -> CourseVideos {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut seen = HashSet::new();
        let mut keys: Vec<String> = Vec::with_capacity(lessons.len());
        // Dropping the set aborts every task still in flight.
        let mut tasks = JoinSet::new();

        for lesson in lessons {
            if !seen.insert(lesson.key.clone()) {
                debug!(key = %lesson.key, "duplicate lesson key, skipping");
                continue;
            }

            let index = keys.len();
            keys.push(lesson.key.clone());

            let service = self.service.clone();
            let sem = semaphore.clone();
            let key = lesson.key.clone();
            let query = lesson.search_text();
            let limit = self.videos_per_lesson;
            let options = self.options.clone();
            let deadline = self.lesson_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return (index, LessonVideoBundle::empty(key));
                };

                let lookup = service.search_videos(&query, limit, &options);
                let bundle = match tokio::time::timeout(deadline, lookup).await {
                    Ok(Ok(videos)) => {
                        debug!(key = %key, videos = videos.len(), "lesson enriched");
                        LessonVideoBundle::new(key, videos)
                    }
                    Ok(Err(e)) => {
                        warn!(key = %key, error = %e, "lesson video search failed");
                        LessonVideoBundle::empty(key)
                    }
                    Err(_) => {
                        warn!(key = %key, timeout_secs = deadline.as_secs_f64(), "lesson video search timed out");
                        LessonVideoBundle::empty(key)
                    }
                };
                (index, bundle)
            });
        }

        let mut slots: Vec<Option<LessonVideoBundle>> = vec![None; keys.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, bundle)) => slots[index] = Some(bundle),
                Err(e) => warn!(error = %e, "lesson task failed"),
            }
        }

        let mut failed = 0usize;
        let entries: Vec<(String, LessonVideoBundle)> = keys
            .into_iter()
            .zip(slots)
            .map(|(key, slot)| {
                let bundle = slot.unwrap_or_else(|| LessonVideoBundle::empty(key.clone()));
                if bundle.primary_video.is_none() {
                    failed += 1;
                }
                (key, bundle)
            })
            .collect();

        info!(lessons = entries.len(), without_videos = failed, "bulk video search complete");
        CourseVideos { entries }
    }
}
