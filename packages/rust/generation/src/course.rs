//! Course outline generation.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use learngen_shared::{CourseSpec, Difficulty, LearnGenError, Lesson, Result};

use crate::client::GeminiClient;
use crate::prompts::{self, MAX_LESSONS, MIN_LESSONS};
use crate::sanitize::{extract_keywords, normalize_keywords, sanitize};
use crate::value_text;

#[derive(Debug, Deserialize)]
struct RawCourse {
    title: Option<Value>,
    description: Option<Value>,
    difficulty: Option<String>,
    lessons: Option<Vec<Value>>,
}

/// Generate a 4–6 lesson course outline for `topic`.
///
/// Any failure other than rate limiting yields [`CourseSpec::fallback`].
#[instrument(skip_all, fields(topic = %topic))]
pub async fn generate_course(client: &GeminiClient, topic: &str) -> Result<CourseSpec> {
    let prompt = prompts::course(topic);

    let Some(value) = crate::request_json(client, &prompt, "generate_course").await? else {
        return Ok(CourseSpec::fallback());
    };

    match course_from_value(value, topic) {
        Ok(course) => {
            info!(title = %course.title, lessons = course.lessons.len(), "course generated");
            Ok(course)
        }
        Err(e) => {
            warn!(error = %e, "invalid course shape, using fallback");
            Ok(CourseSpec::fallback())
        }
    }
}

/// Validate and clean a decoded course payload.
///
/// Malformed lessons are dropped one by one; the lesson minimum applies to
/// the lessons that remain.
fn course_from_value(value: Value, topic: &str) -> Result<CourseSpec> {
    if !value.is_object() {
        return Err(LearnGenError::validation("course payload is not an object"));
    }
    let raw: RawCourse = serde_json::from_value(value)
        .map_err(|e| LearnGenError::validation(format!("unexpected course shape: {e}")))?;

    let raw_lessons = raw
        .lessons
        .ok_or_else(|| LearnGenError::validation("response has no lessons"))?;

    let total = raw_lessons.len();
    let mut lessons: Vec<Lesson> = raw_lessons
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let lesson = build_lesson(item, topic);
            if lesson.is_none() {
                debug!(index, "dropping invalid lesson");
            }
            lesson
        })
        .collect();

    if lessons.len() < MIN_LESSONS {
        return Err(LearnGenError::validation(format!(
            "expected at least {MIN_LESSONS} lessons, got {} of {total}",
            lessons.len()
        )));
    }
    if lessons.len() > MAX_LESSONS {
        debug!(count = lessons.len(), "truncating surplus lessons");
        lessons.truncate(MAX_LESSONS);
    }

    let title = match raw.title.as_ref().and_then(value_text).unwrap_or_default() {
        t if t.is_empty() => sanitize(topic),
        t => t,
    };

    let difficulty = raw
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse_loose)
        .unwrap_or_default();

    Ok(CourseSpec {
        title,
        description: raw.description.as_ref().and_then(value_text).unwrap_or_default(),
        difficulty,
        lessons,
    })
}

/// Clean one lesson. Non-objects and lessons without a title are dropped.
fn build_lesson(item: &Value, topic: &str) -> Option<Lesson> {
    let fields = item.as_object()?;

    let title = fields.get("title").and_then(value_text).unwrap_or_default();
    if title.is_empty() {
        return None;
    }
    let description = fields.get("description").and_then(value_text).unwrap_or_default();

    let mut objectives: Vec<String> = match fields.get("objectives") {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    objectives.retain(|o| !o.is_empty());

    let provided = ["searchKeywords", "search_keywords", "keywords"]
        .iter()
        .find_map(|key| fields.get(*key))
        .map(provided_keywords);
    let search_keywords = lesson_keywords(provided.as_deref(), &description, &title, topic);

    Some(Lesson {
        title,
        description,
        objectives,
        search_keywords,
    })
}

/// Keywords as the model sent them: a list, or one free-text string.
fn provided_keywords(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::String(text) => extract_keywords(text),
        _ => Vec::new(),
    }
}

/// Model keywords if usable, else synthesized from description, title, topic.
/// Never empty for a non-empty title.
fn lesson_keywords(
    provided: Option<&[String]>,
    description: &str,
    title: &str,
    topic: &str,
) -> Vec<String> {
    if let Some(provided) = provided {
        let keywords = normalize_keywords(provided);
        if !keywords.is_empty() {
            return keywords;
        }
    }

    [description, title, topic]
        .iter()
        .map(|text| extract_keywords(text))
        .find(|keywords| !keywords.is_empty())
        .unwrap_or_else(|| vec![title.to_lowercase()])
}
