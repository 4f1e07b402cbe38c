//! End-to-end course build: topic → outline → per-lesson videos → course.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use learngen_generation::{GeminiClient, generate_course};
use learngen_shared::{EnrichedCourse, LearnGenError, Result};
use learngen_video::{CourseVideos, LessonQuery, VideoEnricher};

use crate::assembler;

/// Options for [`build_course`].
#[derive(Debug, Clone, Default)]
pub struct BuildCourseConfig {
    /// Subject the course should teach.
    pub topic: String,
    /// Also write the finished course here as JSON.
    pub output: Option<PathBuf>,
}

/// Result of [`build_course`].
#[derive(Debug)]
pub struct BuildCourseResult {
    pub course: EnrichedCourse,
    /// The model could not produce a usable outline.
    pub used_fallback: bool,
    /// Lessons that ended up with at least one video.
    pub lessons_with_videos: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the outline is known.
    fn outline_ready(&self, title: &str, lessons: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildCourseResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn outline_ready(&self, _title: &str, _lessons: usize) {}
    fn done(&self, _result: &BuildCourseResult) {}
}

/// Run the full course build.
///
/// 1. Generate the outline (fallback on any failure but rate limiting)
/// 2. Search videos for every lesson, if an enricher is given
/// 3. Assemble the course and optionally write it to disk
///
/// Enrichment is skipped for the fallback outline, which has no lessons.
#[instrument(skip_all, fields(topic = %config.topic))]
pub async fn build_course(
    config: &BuildCourseConfig,
    model: &GeminiClient,
    enricher: Option<&VideoEnricher>,
    progress: &dyn ProgressReporter,
) -> Result<BuildCourseResult> {
    let start = Instant::now();

    let topic = config.topic.trim();
    if topic.is_empty() {
        return Err(LearnGenError::validation("course topic is empty"));
    }

    // --- Phase 1: Outline ---
    progress.phase("Generating course outline");
    let spec = generate_course(model, topic).await?;
    let used_fallback = spec.is_fallback();
    if used_fallback {
        warn!("model produced no usable outline, continuing with fallback course");
    }
    progress.outline_ready(&spec.title, spec.lessons.len());

    // --- Phase 2: Videos ---
    let videos = match enricher {
        Some(enricher) if !spec.lessons.is_empty() => {
            progress.phase("Finding lesson videos");
            let queries: Vec<LessonQuery> = spec.lessons.iter().map(LessonQuery::from).collect();
            enricher.bulk_search_for_course(&queries).await
        }
        _ => CourseVideos::default(),
    };

    // --- Phase 3: Assemble ---
    progress.phase("Assembling course");
    let course = assembler::assemble_course(spec, &videos);

    if let Some(path) = &config.output {
        progress.phase("Writing course file");
        assembler::write_course(path, &course)?;
    }

    let lessons_with_videos = course
        .lessons
        .iter()
        .filter(|l| l.primary_video.is_some())
        .count();

    let result = BuildCourseResult {
        course,
        used_fallback,
        lessons_with_videos,
        elapsed: start.elapsed(),
    };

    info!(
        course_id = %result.course.id,
        lessons = result.course.lessons.len(),
        lessons_with_videos,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "course build complete"
    );

    progress.done(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use learngen_shared::{GenerationConfig, VideoConfig};
    use learngen_video::VideoService;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_client(uri: &str) -> GeminiClient {
        GeminiClient::new(&GenerationConfig {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url: uri.into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn video_config(uri: &str) -> VideoConfig {
        VideoConfig {
            api_key: "yt-key".into(),
            base_url: uri.into(),
            timeout_secs: 5,
            videos_per_lesson: 3,
            cache_ttl_hours: 24,
            concurrency: 2,
            lesson_timeout_secs: 5,
        }
    }

    fn enricher(uri: &str) -> VideoEnricher {
        let config = video_config(uri);
        VideoEnricher::new(VideoService::new(&config).unwrap(), &config)
    }

    fn course_payload() -> Value {
        let lessons: Vec<Value> = ["Ownership", "Borrowing", "Traits", "Generics"]
            .iter()
            .map(|t| {
                json!({
                    "title": t,
                    "description": format!("Learn {t}"),
                    "objectives": [format!("Use {t}")],
                    "searchKeywords": [format!("rust {}", t.to_lowercase())]
                })
            })
            .collect();
        json!({
            "title": "Rust Basics",
            "description": "Start writing Rust",
            "difficulty": "beginner",
            "lessons": lessons
        })
    }

    async fn mount_model(server: &MockServer, status: u16, text: &str) {
        let template = if status == 200 {
            ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            }))
        } else {
            ResponseTemplate::new(status).set_body_string(text)
        };
        Mock::given(method("POST"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    async fn mount_youtube(server: &MockServer, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": { "videoId": "aaaaaaaaaaa" } }]
            })))
            .expect(calls)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "aaaaaaaaaaa",
                    "snippet": { "title": "Intro video", "channelTitle": "Chan" },
                    "contentDetails": { "duration": "PT10M" },
                    "statistics": { "viewCount": "42" }
                }]
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn outline_ready(&self, title: &str, lessons: usize) {
            self.phases.lock().unwrap().push(format!("outline:{title}:{lessons}"));
        }
        fn done(&self, result: &BuildCourseResult) {
            self.phases
                .lock()
                .unwrap()
                .push(format!("done:{}", result.lessons_with_videos));
        }
    }

    fn config(topic: &str) -> BuildCourseConfig {
        BuildCourseConfig {
            topic: topic.into(),
            output: None,
        }
    }

    #[tokio::test]
    async fn builds_enriched_course() {
        let model = MockServer::start().await;
        mount_model(&model, 200, &course_payload().to_string()).await;
        let youtube = MockServer::start().await;
        mount_youtube(&youtube, 4).await;

        let progress = RecordingProgress::default();
        let result = build_course(
            &config("Rust"),
            &model_client(&model.uri()),
            Some(&enricher(&youtube.uri())),
            &progress,
        )
        .await
        .unwrap();

        assert!(!result.used_fallback);
        assert_eq!(result.lessons_with_videos, 4);
        let course = &result.course;
        assert_eq!(course.title, "Rust Basics");
        assert_eq!(course.lessons[0].lesson.title, "Ownership");
        let primary = course.lessons[0].primary_video.as_ref().unwrap();
        assert_eq!(primary.duration_formatted, "10:00");

        let phases = progress.phases.lock().unwrap().clone();
        assert_eq!(phases.first().map(String::as_str), Some("Generating course outline"));
        assert!(phases.contains(&"outline:Rust Basics:4".to_string()));
        assert_eq!(phases.last().map(String::as_str), Some("done:4"));
    }

    #[tokio::test]
    async fn fallback_course_skips_enrichment() {
        let model = MockServer::start().await;
        mount_model(&model, 200, r#"{"title":"no lessons here"}"#).await;
        let youtube = MockServer::start().await;
        mount_youtube(&youtube, 0).await;

        let result = build_course(
            &config("Rust"),
            &model_client(&model.uri()),
            Some(&enricher(&youtube.uri())),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(result.used_fallback);
        assert!(result.course.lessons.is_empty());
        assert_eq!(result.course.title, "Sample Course");
    }

    #[tokio::test]
    async fn failing_video_search_keeps_the_course() {
        let model = MockServer::start().await;
        mount_model(&model, 200, &course_payload().to_string()).await;
        let youtube = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error":{"message":"quota","errors":[{"reason":"quotaExceeded"}]}}"#,
            ))
            .mount(&youtube)
            .await;

        let result = build_course(
            &config("Rust"),
            &model_client(&model.uri()),
            Some(&enricher(&youtube.uri())),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.course.lessons.len(), 4);
        assert_eq!(result.lessons_with_videos, 0);
    }

    #[tokio::test]
    async fn without_enricher_lessons_have_no_videos() {
        let model = MockServer::start().await;
        mount_model(&model, 200, &course_payload().to_string()).await;

        let result = build_course(&config("Rust"), &model_client(&model.uri()), None, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.course.lessons.len(), 4);
        assert!(result.course.lessons.iter().all(|l| l.recommended_videos.is_empty()));
    }

    #[tokio::test]
    async fn rate_limit_aborts_the_build() {
        let model = MockServer::start().await;
        mount_model(&model, 429, "Too Many Requests").await;

        let err = build_course(&config("Rust"), &model_client(&model.uri()), None, &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn writes_output_file() {
        let model = MockServer::start().await;
        mount_model(&model, 200, &course_payload().to_string()).await;

        let dir = std::env::temp_dir().join(format!("learngen-pipeline-{}", learngen_shared::CourseId::new()));
        let path = dir.join("course.json");
        let config = BuildCourseConfig {
            topic: "Rust".into(),
            output: Some(path.clone()),
        };

        let result = build_course(&config, &model_client(&model.uri()), None, &SilentProgress)
            .await
            .unwrap();
        let saved = assembler::read_course(&path).unwrap();
        assert_eq!(saved.id, result.course.id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn blank_topic_is_rejected() {
        let err = build_course(&config("   "), &model_client("http://127.0.0.1:9"), None, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, LearnGenError::Validation { .. }));
    }
}
