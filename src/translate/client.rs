// OpenAI-compatible chat completion client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Translator;
use crate::config::settings::TranslationSettings;
use crate::error::BilingualError;

/// One HTTP client plus the API keys it rotates through.
///
/// `reqwest::blocking::Client` pools connections internally and is safe to
/// share between threads, so one pool serves every translation worker.
pub struct ClientPool {
    client: reqwest::blocking::Client,
    keys: Vec<String>,
    next: AtomicUsize,
}

impl ClientPool {
    pub fn new(keys: Vec<String>, timeout: Duration) -> crate::error::Result<Self> {
        if keys.is_empty() {
            return Err(BilingualError::config(
                "no translation API key configured: set translation.api_keys in settings.yaml \
                 or the environment variable named by translation.api_key_env",
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BilingualError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            keys,
            next: AtomicUsize::new(0),
        })
    }

    /// The shared client and the next API key, round-robin.
    pub fn checkout(&self) -> (&reqwest::blocking::Client, &str) {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        (&self.client, &self.keys[i])
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Translator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiTranslator {
    pool: ClientPool,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiTranslator {
    pub fn new(pool: ClientPool, base_url: &str, model: &str, temperature: f32) -> Self {
        Self {
            pool,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &TranslationSettings) -> crate::error::Result<Self> {
        let pool = ClientPool::new(
            settings.resolve_api_keys(),
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::new(
            pool,
            &settings.base_url,
            &settings.model,
            settings.temperature,
        ))
    }
}

impl Translator for OpenAiTranslator {
    fn name(&self) -> &str {
        &self.model
    }

    fn translate(&self, text: &str, system_prompt: &str) -> crate::error::Result<String> {
        let (client, key) = self.pool.checkout();
        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.temperature,
            stream: false,
        };

        let response = client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = format!("API returned {status}: {}", body.trim());
            // Authentication failures will not fix themselves on retry.
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                BilingualError::config(message)
            } else {
                BilingualError::translation(message)
            });
        }

        let body = response.text()?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| BilingualError::translation(format!("malformed API response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BilingualError::translation("API response contained no choices"))?;

        let cleaned = clean_response(&content);
        if cleaned.is_empty() {
            return Err(BilingualError::translation("API returned an empty translation"));
        }
        Ok(cleaned)
    }
}

/// Strip Markdown code fences the model sometimes wraps around its answer.
pub fn clean_response(content: &str) -> String {
    content
        .replace("```latex", "")
        .replace("```markdown", "")
        .replace("```", "")
        .trim()
        .to_string()
}
