//! Single-turn Q&A over one location's recent crime reports.

use crate::AiError;
use crate::providers::{CompletionRequest, LlmProvider};

const CHATBOT_TEMPERATURE: f64 = 0.7;
const CHATBOT_MAX_TOKENS: u32 = 1000;

/// Answers a visitor question about one location's recent crime reports.
///
/// `context_json` is the serialized list of recent reports for the
/// location (newest first, at most 100), embedded verbatim in the system
/// prompt. Unlike the narrative requester there is no fallback here: a
/// provider failure propagates to the caller.
///
/// # Errors
///
/// Returns [`AiError`] if the provider request fails.
pub async fn answer_question(
    provider: &dyn LlmProvider,
    context_json: &str,
    question: &str,
) -> Result<String, AiError> {
    let request = CompletionRequest {
        system_prompt: format!(
            "You are an intelligent safety assistant. You are given JSON data listing the most \
             recent crime reports (at most 100) for a single tourist location. Use this data as \
             your only reference when answering the question.\n\n{context_json}"
        ),
        user_prompt: question.to_string(),
        temperature: CHATBOT_TEMPERATURE,
        max_tokens: CHATBOT_MAX_TOKENS,
        json_response: false,
    };

    provider.complete(&request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CapturingProvider {
        last: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for CapturingProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok("Nighttime theft is the most common incident.".to_string())
        }
    }

    #[tokio::test]
    async fn embeds_context_in_system_prompt() {
        let provider = CapturingProvider {
            last: Mutex::new(None),
        };
        let context = r#"[{"category":"theft","occurredAt":"2025-06-01T20:00:00Z"}]"#;

        let reply = answer_question(&provider, context, "Is it safe at night?")
            .await
            .unwrap();

        assert_eq!(reply, "Nighttime theft is the most common incident.");
        let request = provider.last.lock().unwrap().take().unwrap();
        assert!(request.system_prompt.contains(context));
        assert_eq!(request.user_prompt, "Is it safe at night?");
        assert!((request.temperature - 0.7).abs() < f64::EPSILON);
        assert!(!request.json_response);
    }
}
