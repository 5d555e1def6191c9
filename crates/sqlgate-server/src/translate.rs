//! Natural-language to SQL translation via Groq.
//!
//! One chat-completion call per question against Groq's OpenAI-compatible
//! API, temperature zero, with a fixed schema prompt. The model is told
//! to answer with bare SQL; because models volunteer markdown anyway,
//! fenced answers are unwrapped before they leave this module. Whatever
//! comes out is still untrusted and goes through validation downstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlgate_core::{TranslateError, Translator};

/// Groq's OpenAI-compatible chat-completions endpoint.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const TRANSLATION_TIMEOUT: Duration = Duration::from_secs(20);

const SYSTEM_PROMPT: &str = "\
You are a PostgreSQL expert.

There is ONLY one table:

sales_daily(
    date DATE,
    region TEXT,
    category TEXT,
    revenue NUMERIC(12,2),
    orders INTEGER,
    created_at TIMESTAMPTZ
)

Rules:
- Output ONLY ONE valid PostgreSQL SELECT statement.
- Do NOT explain anything.
- Do NOT add markdown.
- Do NOT add comments.
- Only return SQL.";

/// [`Translator`] backed by a Groq-hosted chat model.
pub struct GroqTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GroqTranslator {
    /// Create a translator for the given API key and model name.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: GROQ_API_URL.to_string(),
        }
    }

    /// Point the translator at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The model this translator queries.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GroqTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqTranslator")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Translator for GroqTranslator {
    async fn translate(&self, question: &str) -> Result<String, TranslateError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(TRANSLATION_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|err| TranslateError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Service(format!(
                "translator returned HTTP {status}"
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| TranslateError::Service(err.to_string()))?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or_default();
        let sql = strip_code_fences(content);
        if sql.is_empty() {
            return Err(TranslateError::Empty);
        }

        tracing::debug!(
            model = %self.model,
            sql_chars = sql.chars().count(),
            "question translated"
        );
        Ok(sql.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

/// Unwrap a fenced code block, with or without a language tag.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // The opening fence may carry a language tag on the same line.
    let body = match rest.split_once('\n') {
        Some((first_line, body)) if is_fence_tag(first_line.trim()) => body,
        _ => rest,
    };
    body.trim()
}

fn is_fence_tag(tag: &str) -> bool {
    tag.is_empty()
        || ["sql", "postgresql", "postgres", "pgsql"]
            .iter()
            .any(|known| tag.eq_ignore_ascii_case(known))
}
