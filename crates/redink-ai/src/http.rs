//! HTTP oracle for OpenAI-compatible chat-completions endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{OracleConfig, RetryPolicy};
use crate::oracle::{Oracle, OracleError, Prompt, Structured};

/// Chat-completions client with bounded retries.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
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
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            retry: config.retry.clone(),
        })
    }

    /// One request, no retries.
    async fn send(&self, prompt: &Prompt) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "sending completion request");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        reply_content(&text)
    }
}

#[async_trait]
impl Oracle for ChatClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, OracleError> {
        with_retries(&self.retry, move || self.send(prompt), transport_failure).await
    }

    /// Unusable replies are retried like failures; the last one is returned
    /// as [`Structured::Unusable`] once attempts run out.
    async fn complete_structured(&self, prompt: &Prompt) -> Result<Structured, OracleError> {
        with_retries(
            &self.retry,
            move || async move {
                let reply = self.complete(prompt).await?;
                Ok(Structured::from_reply(&reply))
            },
            unusable_reply,
        )
        .await
    }
}

/// Run `attempt` until `retry_reason` finds nothing to retry or the policy's
/// attempts run out, sleeping between attempts. Returns the last outcome.
async fn with_retries<T, F, Fut, R>(policy: &RetryPolicy, mut attempt: F, retry_reason: R) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    R: Fn(&T) -> Option<String>,
{
    let mut n = 1;
    loop {
        let outcome = attempt().await;
        if n >= policy.max_attempts {
            return outcome;
        }
        let Some(reason) = retry_reason(&outcome) else {
            return outcome;
        };
        let delay = policy.delay(n);
        warn!(attempt = n, %reason, delay_ms = delay.as_millis() as u64, "oracle call unsuccessful, retrying");
        tokio::time::sleep(delay).await;
        n += 1;
    }
}

fn transport_failure(outcome: &Result<String, OracleError>) -> Option<String> {
    outcome.as_ref().err().map(ToString::to_string)
}

/// Transport errors are not retried here: `complete` already spent its budget.
fn unusable_reply(outcome: &Result<Structured, OracleError>) -> Option<String> {
    match outcome {
        Ok(Structured::Unusable { raw }) => Some(format!("no JSON payload in {:?}", preview(raw))),
        _ => None,
    }
}

/// `{base}/chat/completions`, tolerating a trailing slash on `base`.
fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// The trimmed content of the first choice in a chat-completions response body.
fn reply_content(body: &str) -> Result<String, OracleError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let choice = parsed.choices.into_iter().next().ok_or(OracleError::NoChoices)?;
    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

fn preview(raw: &str) -> String {
    raw.chars().take(200).collect()
}
