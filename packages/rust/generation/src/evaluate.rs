//! Model-graded evaluation of short answers.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use learngen_shared::{AnswerEvaluation, Result};

use crate::client::GeminiClient;
use crate::prompts;
use crate::value_text;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEvaluation {
    score: Option<Value>,
    feedback: Option<Value>,
    suggestions: Option<Vec<Value>>,
}

/// Grade `user_answer` against `question` and the expected `keywords`.
///
/// A payload without a numeric score, or any failure other than rate
/// limiting, yields [`AnswerEvaluation::fallback`].
#[instrument(skip_all, fields(keywords = keywords.len()))]
pub async fn evaluate_short_answer(
    client: &GeminiClient,
    question: &str,
    user_answer: &str,
    keywords: &[String],
) -> Result<AnswerEvaluation> {
    let prompt = prompts::evaluation(question, user_answer, keywords);

    let Some(value) = crate::request_json(client, &prompt, "evaluate_short_answer").await? else {
        return Ok(AnswerEvaluation::fallback());
    };

    match evaluation_from_value(value) {
        Some(evaluation) => {
            info!(score = evaluation.score, "answer evaluated");
            Ok(evaluation)
        }
        None => {
            warn!("evaluation payload has no numeric score, using fallback");
            Ok(AnswerEvaluation::fallback())
        }
    }
}

fn evaluation_from_value(value: Value) -> Option<AnswerEvaluation> {
    if !value.is_object() {
        return None;
    }
    let raw: RawEvaluation = serde_json::from_value(value).ok()?;

    let score = raw.score.as_ref().and_then(Value::as_f64).filter(|s| s.is_finite())?;

    Some(AnswerEvaluation {
        score: score.clamp(0.0, 1.0),
        feedback: raw.feedback.as_ref().and_then(value_text).unwrap_or_default(),
        suggestions: raw
            .suggestions
            .unwrap_or_default()
            .iter()
            .filter_map(value_text)
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{model_failing, model_replying};
    use learngen_shared::LearnGenError;
    use serde_json::json;

    #[test]
    fn evaluation_is_sanitized_and_clamped() {
        let eval = evaluation_from_value(json!({
            "score": 1.4,
            "feedback": "Good\n\nanswer",
            "suggestions": ["Mention\tborrowing", "", 7]
        }))
        .unwrap();
        assert_eq!(eval.score, 1.0);
        assert_eq!(eval.feedback, "Good answer");
        assert_eq!(eval.suggestions, vec!["Mention borrowing", "7"]);

        let eval = evaluation_from_value(json!({ "score": -0.2 })).unwrap();
        assert_eq!(eval.score, 0.0);
        assert!(eval.feedback.is_empty());
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        assert!(evaluation_from_value(json!({ "score": "0.8", "feedback": "ok" })).is_none());
        assert!(evaluation_from_value(json!({ "feedback": "ok" })).is_none());
        assert!(evaluation_from_value(json!([0.5])).is_none());
    }

    #[tokio::test]
    async fn evaluates_answer() {
        let payload = r#"{"score": 0.75, "feedback": "Mostly right", "suggestions": ["Add an example"]}"#;
        let (_server, client) = model_replying(payload).await;

        let eval = evaluate_short_answer(&client, "What is AI?", "Machines thinking", &[
            "intelligence".into(),
            "machine".into(),
        ])
        .await
        .unwrap();
        assert_eq!(eval.score, 0.75);
        assert_eq!(eval.feedback, "Mostly right");
        assert_eq!(eval.suggestions, vec!["Add an example"]);
    }

    #[tokio::test]
    async fn malformed_payload_falls_back() {
        let (_server, client) = model_replying(r#"{"score": "high"}"#).await;
        let eval = evaluate_short_answer(&client, "q", "a", &[]).await.unwrap();
        assert_eq!(eval, AnswerEvaluation::fallback());
    }

    #[tokio::test]
    async fn rate_limit_is_reraised() {
        let (_server, client) =
            model_failing(500, r#"{"error":{"message":"Too many requests, retry later"}}"#).await;
        let err = evaluate_short_answer(&client, "q", "a", &[]).await.unwrap_err();
        assert!(matches!(err, LearnGenError::RateLimited { .. }));
    }
}
