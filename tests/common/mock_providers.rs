/*!
 * Scripted providers for pipeline tests.
 */

use std::sync::Arc;
use std::time::Duration;

use subweave::errors::ProviderError;
use subweave::providers::mock::{last_user_message, requested_lines, tagged_answer, MockProvider};
use subweave::providers::{ChatMessage, ModelClient, Role};

/// Whether the conversation is a review request
pub fn is_review(messages: &[ChatMessage]) -> bool {
    messages
        .iter()
        .any(|m| m.role == Role::System && m.content.contains("subtitle editor"))
}

/// Wrap a mock in a client with a generous timeout
pub fn client_for(mock: MockProvider) -> ModelClient {
    ModelClient::new(Arc::new(mock), Duration::from_secs(30))
}

/// Translates with `tag`, and answers reviews by prefixing the draft's line ID with "rev"
pub fn translate_and_review(tag: &'static str) -> MockProvider {
    MockProvider::new(move |messages, _| {
        let prompt = last_user_message(messages);
        if is_review(messages) {
            Ok(requested_lines(prompt)
                .into_iter()
                .map(|(id, _)| format!("@@SUB_LINE@@ {}: rev {}", id, id))
                .collect::<Vec<_>>()
                .join("\n"))
        } else {
            Ok(tagged_answer(prompt, tag))
        }
    })
}

/// Translates normally until the request for line `failing_id`, which reports exhausted credits
pub fn credits_run_out_at(failing_id: usize) -> MockProvider {
    MockProvider::new(move |messages, _| {
        let prompt = last_user_message(messages);
        if requested_lines(prompt).iter().any(|(id, _)| *id == failing_id) {
            return Err(ProviderError::InsufficientCredits("balance is zero".to_string()));
        }
        Ok(tagged_answer(prompt, "[fr]"))
    })
}
