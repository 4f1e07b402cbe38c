//! Prompt builders for each generation operation.
//!
//! User-supplied strings are embedded as JSON string literals so quotes and
//! newlines in them cannot break the instruction text.

use learngen_shared::CourseSpec;

/// Lesson count requested from the model.
pub(crate) const MIN_LESSONS: usize = 4;
pub(crate) const MAX_LESSONS: usize = 6;

fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

pub(crate) fn course(topic: &str) -> String {
    format!(
        "Generate a JSON object for a course on: {topic}. The course should have:\n\
         - title\n\
         - description\n\
         - difficulty (beginner/intermediate/advanced)\n\
         - lessons: array of {MIN_LESSONS}-{MAX_LESSONS} lessons, each with:\n\
         \x20 - title\n\
         \x20 - description\n\
         \x20 - objectives (array of strings)\n\
         \x20 - searchKeywords (array of short search phrases for finding videos)\n\
         Return only valid JSON.",
        topic = quoted(topic),
    )
}

pub(crate) fn quiz(lesson_content: &str, lesson_title: &str) -> String {
    format!(
        "Generate a JSON array of 4-6 quiz questions for the lesson titled {title}. \
         Use the following lesson content:\n\"\"\"\n{lesson_content}\n\"\"\"\n\
         Each question should be one of: MCQ (multiple choice, 4 options) or True/False. \
         For each question, include:\n\
         - type (\"MCQ\" or \"True/False\")\n\
         - question\n\
         - options (array, for MCQ: 4 options; for True/False: [\"True\", \"False\"])\n\
         - correct (the index of the correct option: 0-based for MCQ, 0 for \"True\", 1 for \"False\" in True/False)\n\
         Do NOT include any short answer or open-ended questions. Return only valid JSON.",
        title = quoted(lesson_title),
    )
}

pub(crate) fn final_test(course: &CourseSpec) -> String {
    let course_json = serde_json::to_string(course).unwrap_or_default();
    format!(
        "Generate a JSON array of 10-15 comprehensive test questions for the following course:\n\
         {course_json}\n\
         Mix question types (MCQ, True/False, Short Answer, Scenario). For each question, include:\n\
         - type\n\
         - question\n\
         - options (if MCQ)\n\
         - answer\n\
         Return only valid JSON."
    )
}

pub(crate) fn evaluation(question: &str, user_answer: &str, keywords: &[String]) -> String {
    let keywords_json = serde_json::to_string(keywords).unwrap_or_else(|_| "[]".into());
    format!(
        "Evaluate the following short answer. Question: {question}. \
         User's answer: {answer}. Expected keywords: {keywords_json}.\n\
         Return a JSON object with:\n\
         - score (number between 0 and 1)\n\
         - feedback (string)\n\
         - suggestions (array of strings for improvement)\n\
         Return only valid JSON.",
        question = quoted(question),
        answer = quoted(user_answer),
    )
}
