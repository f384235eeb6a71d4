use std::time::Duration;

use tracing::{info, warn};

use super::client::ChatCompletion;
use super::types::Message;
use crate::retry::{RetryPolicy, Sleeper, with_retry};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Reply the model is told to give when the content lacks the answer.
pub const NOT_FOUND_REPLY: &str = "notfound";

const SYSTEM_PROMPT: &str = "When asked for information, respond strictly with the factual data \
requested. Do not provide any extra context, elaboration, or explanation. The answer should be in \
the simplest form possible: just the specific data without additional commentary. If asked for an \
email address, respond only with the email itself, such as 'email@company.com'. If a phone number \
is requested, respond only with the phone number, like '123-456-7890'. If the content does not \
contain the requested information, respond with exactly: notfound";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The bare value the model extracted.
    Value(String),
    /// The model answered, but the content holds no such data.
    NotFound,
    /// Every attempt to reach the model failed.
    Unavailable,
}

impl Answer {
    fn from_reply(reply: &str) -> Self {
        let normalized = reply
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.'))
            .trim()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "" | NOT_FOUND_REPLY | "not found" => Answer::NotFound,
            _ => Answer::Value(reply.trim().to_string()),
        }
    }
}

/// System instruction plus a user message with the content fenced off from
/// the question.
pub fn build_messages(content: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Content:\n\n\"\"\"\n{content}\n\"\"\"\n\nQuestion: {question}"
        )),
    ]
}

/// Asks the model to pull the answer to `question` out of `content`.
///
/// Any provider failure, including a reply with no choices, is retried under
/// `policy`; exhausting it yields [`Answer::Unavailable`].
pub async fn ask(
    client: &impl ChatCompletion,
    sleeper: &impl Sleeper,
    content: &str,
    question: &str,
    policy: &RetryPolicy,
) -> Answer {
    let messages = build_messages(content, question);

    let result = with_retry(policy, sleeper, |attempt| {
        info!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            "querying model"
        );
        client.complete(messages.clone())
    })
    .await;

    match result {
        Ok(reply) => {
            let answer = Answer::from_reply(&reply);
            info!(found = matches!(answer, Answer::Value(_)), "model answered");
            answer
        }
        Err(exhausted) => {
            warn!(
                attempts = exhausted.attempts,
                error = %exhausted.last,
                "model unavailable after retries"
            );
            Answer::Unavailable
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::llm::client::{ChatCompletion, LlmError};
    use crate::llm::types::Message;

    /// Replays scripted replies; falls back to `RateLimited` once drained.
    pub(crate) struct ScriptedChat {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub(crate) prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedChat {
        pub(crate) fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn always_failing() -> Self {
            Self::new(Vec::new())
        }

        pub(crate) fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl ChatCompletion for ScriptedChat {
        async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::RateLimited))
        }
    }
}
