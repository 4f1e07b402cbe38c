//! Shared types, error model, and configuration for LearnGen.
//!
//! This crate is the foundation depended on by all other LearnGen crates.
//! It provides:
//! - [`LearnGenError`] - the unified error type
//! - Domain types ([`CourseSpec`], [`Lesson`], [`QuizQuestion`], [`VideoResult`], ...)
//! - Configuration ([`AppConfig`], [`GenerationConfig`], [`VideoConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, EnrichmentConfig, GeminiConfig, GenerationConfig, VideoConfig,
    YouTubeConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{LearnGenError, Result};
pub use types::{
    AnswerEvaluation, CourseId, CourseSpec, Difficulty, EnrichedCourse, EnrichedLesson,
    FALLBACK_COURSE_DESCRIPTION, FALLBACK_COURSE_TITLE, FALLBACK_EVALUATION_FEEDBACK, FinalTest,
    FinalTestQuestion, FinalTestQuestionType, Lesson, LessonVideoBundle, Quiz, QuizQuestion,
    QuizQuestionType, Thumbnails, VideoResult,
};
