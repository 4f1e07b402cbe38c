//! Course final-test generation (mixed question types, free-text answers).

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use learngen_shared::{CourseSpec, FinalTest, FinalTestQuestion, FinalTestQuestionType, Result};

use crate::client::GeminiClient;
use crate::prompts;
use crate::sanitize::sanitize_opt;
use crate::value_text;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFinalTestQuestion {
    #[serde(rename = "type")]
    kind: Option<String>,
    question: Option<String>,
    options: Option<Vec<Value>>,
    answer: Option<Value>,
}

/// Generate 10–15 mixed questions covering the whole course.
///
/// Any failure other than rate limiting yields an empty test.
#[instrument(skip_all, fields(course = %course.title, lessons = course.lessons.len()))]
pub async fn generate_final_test(client: &GeminiClient, course: &CourseSpec) -> Result<FinalTest> {
    let prompt = prompts::final_test(course);

    let Some(value) = crate::request_json(client, &prompt, "generate_final_test").await? else {
        return Ok(FinalTest::default());
    };

    let Value::Array(items) = value else {
        warn!("final test payload is not an array, using fallback");
        return Ok(FinalTest::default());
    };

    let total = items.len();
    let questions: Vec<FinalTestQuestion> = items
        .into_iter()
        .filter_map(|item| {
            let question = final_test_question(item);
            if question.is_none() {
                debug!("dropping malformed final test question");
            }
            question
        })
        .collect();

    info!(kept = questions.len(), total, "final test generated");
    Ok(FinalTest { questions })
}

fn final_test_question(item: Value) -> Option<FinalTestQuestion> {
    if !item.is_object() {
        return None;
    }
    let raw: RawFinalTestQuestion = serde_json::from_value(item).ok()?;

    let question = sanitize_opt(raw.question.as_deref());
    if question.is_empty() {
        return None;
    }

    let options: Option<Vec<String>> = raw
        .options
        .map(|opts| opts.iter().filter_map(value_text).collect::<Vec<_>>())
        .filter(|opts| !opts.is_empty());

    let kind = raw
        .kind
        .as_deref()
        .and_then(parse_kind)
        .unwrap_or(if options.is_some() {
            FinalTestQuestionType::Mcq
        } else {
            FinalTestQuestionType::ShortAnswer
        });

    let answer = raw.answer.as_ref().and_then(value_text).unwrap_or_default();

    Some(FinalTestQuestion {
        kind,
        question,
        options,
        answer,
    })
}

fn parse_kind(raw: &str) -> Option<FinalTestQuestionType> {
    let key: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    match key.as_str() {
        "mcq" | "multiplechoice" => Some(FinalTestQuestionType::Mcq),
        "truefalse" | "tf" | "boolean" => Some(FinalTestQuestionType::TrueFalse),
        "shortanswer" | "short" | "openended" => Some(FinalTestQuestionType::ShortAnswer),
        k if k.starts_with("scenario") => Some(FinalTestQuestionType::Scenario),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{model_failing, model_replying};
    use learngen_shared::LearnGenError;
    use serde_json::json;

    #[test]
    fn answer_is_free_text() {
        let q = final_test_question(json!({
            "type": "Short Answer",
            "question": "Explain\nownership",
            "answer": "Each value has\n one owner"
        }))
        .unwrap();
        assert_eq!(q.kind, FinalTestQuestionType::ShortAnswer);
        assert_eq!(q.question, "Explain ownership");
        assert_eq!(q.answer, "Each value has one owner");
        assert!(q.options.is_none());
    }

    #[test]
    fn numeric_and_boolean_answers_become_text() {
        let q = final_test_question(json!({
            "type": "MCQ", "question": "q", "options": ["a", "b"], "answer": 1
        }))
        .unwrap();
        assert_eq!(q.answer, "1");
        assert_eq!(q.options, Some(vec!["a".to_string(), "b".to_string()]));

        let q = final_test_question(json!({ "type": "True/False", "question": "q", "answer": true }))
            .unwrap();
        assert_eq!(q.kind, FinalTestQuestionType::TrueFalse);
        assert_eq!(q.answer, "true");
    }

    #[test]
    fn scenario_aliases() {
        assert_eq!(parse_kind("Scenario-based"), Some(FinalTestQuestionType::Scenario));
        assert_eq!(parse_kind("scenario"), Some(FinalTestQuestionType::Scenario));
        assert_eq!(parse_kind("essay"), None);
    }

    #[test]
    fn missing_type_is_inferred() {
        let q = final_test_question(json!({ "question": "q", "options": ["x", "y", "z"] })).unwrap();
        assert_eq!(q.kind, FinalTestQuestionType::Mcq);
        assert_eq!(q.answer, "");

        let q = final_test_question(json!({ "question": "q", "answer": "a" })).unwrap();
        assert_eq!(q.kind, FinalTestQuestionType::ShortAnswer);
    }

    #[test]
    fn questions_without_text_are_dropped() {
        assert!(final_test_question(json!({ "type": "MCQ", "answer": "x" })).is_none());
        assert!(final_test_question(json!("string item")).is_none());
    }

    #[tokio::test]
    async fn generates_mixed_questions() {
        let payload = json!([
            { "type": "MCQ", "question": "q1", "options": ["a", "b", "c", "d"], "answer": "b" },
            { "type": "True/False", "question": "q2", "answer": "False" },
            { "type": "Short Answer", "question": "q3", "answer": "text" },
            { "type": "Scenario", "question": "q4", "answer": "approach" },
        ]);
        let (_server, client) = model_replying(&payload.to_string()).await;

        let test = generate_final_test(&client, &CourseSpec::fallback()).await.unwrap();
        let kinds: Vec<_> = test.questions.iter().map(|q| q.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FinalTestQuestionType::Mcq,
                FinalTestQuestionType::TrueFalse,
                FinalTestQuestionType::ShortAnswer,
                FinalTestQuestionType::Scenario,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_payloads_fall_back() {
        for text in [r#"{"questions": [1]}"#, "", "```json\n{broken\n```"] {
            let (_server, client) = model_replying(text).await;
            let test = generate_final_test(&client, &CourseSpec::fallback()).await.unwrap();
            assert!(test.questions.is_empty(), "payload: {text:?}");
        }
    }

    #[tokio::test]
    async fn rate_limit_is_reraised() {
        let (_server, client) = model_failing(429, "slow down").await;
        let err = generate_final_test(&client, &CourseSpec::fallback()).await.unwrap_err();
        assert!(matches!(err, LearnGenError::RateLimited { .. }));
    }
}
