//! Core domain types for generated courses, assessments, and lesson videos.
//!
//! Field names serialize in camelCase: these structures are handed straight
//! to API consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title of the fallback course.
pub const FALLBACK_COURSE_TITLE: &str = "Sample Course";

/// Placeholder description of the fallback course.
pub const FALLBACK_COURSE_DESCRIPTION: &str = "This is a fallback course description.";

/// Feedback text of the fallback answer evaluation.
pub const FALLBACK_EVALUATION_FEEDBACK: &str =
    "Could not evaluate answer. Please try again later.";

// ---------------------------------------------------------------------------
// CourseId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for generated course identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub Uuid);

impl CourseId {
    /// Generate a new time-sortable course identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CourseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// Course difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Lenient parse of a model-supplied level. Unknown values yield `None`.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "beginner" | "basic" | "introductory" | "easy" => Some(Self::Beginner),
            "intermediate" | "medium" => Some(Self::Intermediate),
            "advanced" | "expert" | "hard" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated course outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSpec {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// 4–6 lessons on success; empty only for the fallback course.
    pub lessons: Vec<Lesson>,
}

impl CourseSpec {
    /// The fixed value returned when a course cannot be generated.
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_COURSE_TITLE.into(),
            description: FALLBACK_COURSE_DESCRIPTION.into(),
            difficulty: Difficulty::Beginner,
            lessons: Vec::new(),
        }
    }

    /// Whether this is the fallback course (no lessons were produced).
    pub fn is_fallback(&self) -> bool {
        self.lessons.is_empty()
    }
}

/// A single lesson inside a [`CourseSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Lower-cased, deduplicated, stopword-filtered. Never empty.
    pub search_keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// Question kinds allowed in a lesson quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizQuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "True/False")]
    TrueFalse,
}

/// A closed-form quiz question with a bounded answer index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(rename = "type")]
    pub kind: QuizQuestionType,
    pub question: String,
    /// MCQ: exactly 4. True/False: exactly `["True", "False"]`.
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct: usize,
}

/// A lesson quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// Question kinds allowed in a course final test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalTestQuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "True/False")]
    TrueFalse,
    #[serde(rename = "Short Answer")]
    ShortAnswer,
    #[serde(rename = "Scenario")]
    Scenario,
}

/// A final-test question. The answer is free text, not an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalTestQuestion {
    #[serde(rename = "type")]
    pub kind: FinalTestQuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer: String,
}

/// A course final test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTest {
    pub questions: Vec<FinalTestQuestion>,
}

/// Result of grading an open-ended answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    /// In `[0, 1]`.
    pub score: f64,
    pub feedback: String,
    pub suggestions: Vec<String>,
}

impl AnswerEvaluation {
    /// The fixed value returned when an answer cannot be graded.
    pub fn fallback() -> Self {
        Self {
            score: 0.0,
            feedback: FALLBACK_EVALUATION_FEEDBACK.into(),
            suggestions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// Thumbnail URLs at the platform's standard sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnails {
    pub default: String,
    pub medium: String,
    pub high: String,
    pub standard: String,
    pub maxres: String,
}

/// A video returned from search or detail lookup. Identity is `video_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Duration in seconds.
    pub duration: u64,
    /// Duration as `m:ss` or `h:mm:ss`.
    pub duration_formatted: String,
    pub view_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub url: String,
    pub embed_url: String,
    pub thumbnails: Thumbnails,
}

/// Recommended videos for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonVideoBundle {
    pub lesson_title: String,
    pub recommended_videos: Vec<VideoResult>,
    /// First recommended video, if any.
    pub primary_video: Option<VideoResult>,
}

impl LessonVideoBundle {
    /// Build a bundle; the primary pick is the first video.
    pub fn new(lesson_title: impl Into<String>, videos: Vec<VideoResult>) -> Self {
        Self {
            lesson_title: lesson_title.into(),
            primary_video: videos.first().cloned(),
            recommended_videos: videos,
        }
    }

    /// A bundle with no videos, used when a lesson lookup fails.
    pub fn empty(lesson_title: impl Into<String>) -> Self {
        Self::new(lesson_title, Vec::new())
    }
}

// ---------------------------------------------------------------------------
// EnrichedCourse
// ---------------------------------------------------------------------------

/// A lesson together with its recommended videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub recommended_videos: Vec<VideoResult>,
    pub primary_video: Option<VideoResult>,
}

/// A generated course with videos attached to each lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCourse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub lessons: Vec<EnrichedLesson>,
    pub created_at: DateTime<Utc>,
}

impl EnrichedCourse {
    /// The outline without video data, e.g. for final-test prompts.
    pub fn spec(&self) -> CourseSpec {
        CourseSpec {
            title: self.title.clone(),
            description: self.description.clone(),
            difficulty: self.difficulty,
            lessons: self.lessons.iter().map(|l| l.lesson.clone()).collect(),
        }
    }
}
