//! Course assembler.
//!
//! Attaches per-lesson video bundles to a generated outline and
//! persists the result as a JSON document.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, instrument};

use learngen_shared::{CourseId, CourseSpec, EnrichedCourse, EnrichedLesson, LearnGenError, Result};
use learngen_video::CourseVideos;

/// Combine an outline with its video bundles.
///
/// Bundles are matched to lessons by title. A lesson with no bundle gets
/// no videos; lessons sharing a title share a bundle.
pub fn assemble_course(spec: CourseSpec, videos: &CourseVideos) -> EnrichedCourse {
    let lessons: Vec<EnrichedLesson> = spec
        .lessons
        .into_iter()
        .map(|lesson| {
            let bundle = videos.get(&lesson.title);
            EnrichedLesson {
                recommended_videos: bundle
                    .map(|b| b.recommended_videos.clone())
                    .unwrap_or_default(),
                primary_video: bundle.and_then(|b| b.primary_video.clone()),
                lesson,
            }
        })
        .collect();

    debug!(lessons = lessons.len(), "course assembled");

    EnrichedCourse {
        id: CourseId::new(),
        title: spec.title,
        description: spec.description,
        difficulty: spec.difficulty,
        lessons,
        created_at: Utc::now(),
    }
}

/// Write `course` to `path` as pretty JSON.
///
/// Writes to a sibling temp file first, then renames over the target.
#[instrument(skip_all, fields(path = %path.display(), course_id = %course.id))]
pub fn write_course(path: &Path, course: &EnrichedCourse) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LearnGenError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(course)
        .map_err(|e| LearnGenError::validation(format!("JSON serialization failed: {e}")))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LearnGenError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| LearnGenError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| LearnGenError::io(path, e))?;

    info!(bytes = json.len(), "course written");
    Ok(())
}

/// Read a course previously written by [`write_course`].
pub fn read_course(path: &Path) -> Result<EnrichedCourse> {
    let content = std::fs::read_to_string(path).map_err(|e| LearnGenError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        LearnGenError::validation(format!("invalid course file {}: {e}", path.display()))
    })
}
