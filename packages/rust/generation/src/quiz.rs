//! Lesson quiz generation (MCQ and True/False only).

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use learngen_shared::{Quiz, QuizQuestion, QuizQuestionType, Result};

use crate::client::GeminiClient;
use crate::prompts;
use crate::sanitize::sanitize_opt;
use crate::value_text;

/// Options required for a multiple-choice question.
const MCQ_OPTIONS: usize = 4;

const TRUE: &str = "True";
const FALSE: &str = "False";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuizQuestion {
    #[serde(rename = "type")]
    kind: Option<String>,
    question: Option<String>,
    options: Option<Vec<Value>>,
    correct: Option<Value>,
    /// Legacy alias for `correct`.
    answer: Option<Value>,
}

/// Generate 4–6 closed-form questions for a lesson.
///
/// Any failure other than rate limiting yields an empty quiz. Individual
/// malformed questions are dropped without discarding the rest.
#[instrument(skip_all, fields(lesson = %lesson_title))]
pub async fn generate_quiz(
    client: &GeminiClient,
    lesson_content: &str,
    lesson_title: &str,
) -> Result<Quiz> {
    let prompt = prompts::quiz(lesson_content, lesson_title);

    let Some(value) = crate::request_json(client, &prompt, "generate_quiz").await? else {
        return Ok(Quiz::default());
    };

    let Value::Array(items) = value else {
        warn!("quiz payload is not an array, using fallback");
        return Ok(Quiz::default());
    };

    let total = items.len();
    let questions: Vec<QuizQuestion> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match quiz_question(item) {
            Ok(q) => Some(q),
            Err(reason) => {
                debug!(index, reason, "dropping invalid quiz question");
                None
            }
        })
        .collect();

    info!(kept = questions.len(), total, "quiz generated");
    Ok(Quiz { questions })
}

/// Validate and clean one question.
fn quiz_question(item: Value) -> std::result::Result<QuizQuestion, &'static str> {
    if !item.is_object() {
        return Err("not a question object");
    }
    let raw: RawQuizQuestion = serde_json::from_value(item).map_err(|_| "not a question object")?;

    let question = sanitize_opt(raw.question.as_deref());
    if question.is_empty() {
        return Err("empty question text");
    }

    let mut options: Vec<String> = raw
        .options
        .unwrap_or_default()
        .iter()
        .filter_map(value_text)
        .collect();

    let kind = match raw.kind.as_deref().and_then(parse_kind) {
        Some(kind) => kind,
        None if is_true_false(&options) => QuizQuestionType::TrueFalse,
        None if options.len() == MCQ_OPTIONS => QuizQuestionType::Mcq,
        None => return Err("unknown question type"),
    };

    match kind {
        QuizQuestionType::Mcq if options.len() != MCQ_OPTIONS => {
            return Err("MCQ must have exactly 4 options");
        }
        QuizQuestionType::TrueFalse if options.is_empty() || is_true_false(&options) => {
            options = vec![TRUE.to_string(), FALSE.to_string()];
        }
        QuizQuestionType::TrueFalse => return Err("True/False options must be True and False"),
        QuizQuestionType::Mcq => {}
    }

    let correct = correct_index(&raw.correct, &raw.answer, kind)?;
    if correct >= options.len() {
        return Err("correct index out of range");
    }

    Ok(QuizQuestion {
        kind,
        question,
        options,
        correct,
    })
}

fn parse_kind(raw: &str) -> Option<QuizQuestionType> {
    let key: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    match key.as_str() {
        "mcq" | "multiplechoice" | "multiple" => Some(QuizQuestionType::Mcq),
        "truefalse" | "tf" | "boolean" => Some(QuizQuestionType::TrueFalse),
        _ => None,
    }
}

fn is_true_false(options: &[String]) -> bool {
    options.len() == 2
        && options[0].eq_ignore_ascii_case(TRUE)
        && options[1].eq_ignore_ascii_case(FALSE)
}

/// Resolve the correct option index.
///
/// A numeric `correct` decides on its own and must be a non-negative
/// integer. Otherwise a numeric `answer` is used. True/False questions also
/// accept a boolean in either field.
fn correct_index(
    correct: &Option<Value>,
    answer: &Option<Value>,
    kind: QuizQuestionType,
) -> std::result::Result<usize, &'static str> {
    let decides = |v: &Value| {
        v.is_number() || (v.is_boolean() && kind == QuizQuestionType::TrueFalse)
    };
    let as_index = |v: &Value| -> Option<usize> {
        match v {
            Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
            Value::Bool(b) => Some(if *b { 0 } else { 1 }),
            _ => None,
        }
    };

    match (correct.as_ref().filter(|v| decides(v)), answer.as_ref().filter(|v| decides(v))) {
        (Some(value), _) | (None, Some(value)) => {
            as_index(value).ok_or("correct index is not a non-negative integer")
        }
        (None, None) => Err("missing correct index"),
    }
}
