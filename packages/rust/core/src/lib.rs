//! Core pipeline orchestration for LearnGen.
//!
//! Ties outline generation, video enrichment, and course assembly into
//! the end-to-end [`build_course`](pipeline::build_course) workflow.

pub mod assembler;
pub mod pipeline;

pub use assembler::{assemble_course, read_course, write_course};
pub use pipeline::{
    BuildCourseConfig, BuildCourseResult, ProgressReporter, SilentProgress, build_course,
};
