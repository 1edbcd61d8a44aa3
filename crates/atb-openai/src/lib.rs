//! OpenAI Assistants adapter.
//!
//! Implements the `atb-core` assistant port over the Assistants v2 HTTP API:
//! `POST /threads`, `POST /threads/{id}/messages`, and a streamed
//! `POST /threads/{id}/runs` consumed as server-sent events.

use async_trait::async_trait;

use futures::StreamExt;

use serde::Deserialize;

use atb_core::{
    assistant::{AssistantPort, ReplyStream},
    config::Config,
    domain::ThreadId,
    errors::Error,
    Result,
};

mod sse;

const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

#[derive(Clone, Debug)]
pub struct OpenAiAssistant {
    http: reqwest::Client,
    api_key: String,
    assistant_id: String,
    base_url: String,
    request_timeout: std::time::Duration,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

impl OpenAiAssistant {
    pub fn new(cfg: &Config) -> Self {
        // No global client timeout: it would also cap the streamed run body.
        // Non-streaming calls set a per-request timeout instead.
        let http = reqwest::Client::builder()
            .build()
            .expect("reqwest client build");

        Self {
            http,
            api_key: cfg.openai_api_key.clone(),
            assistant_id: cfg.openai_assistant_id.clone(),
            base_url: cfg.openai_base_url.clone(),
            request_timeout: cfg.request_timeout,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
    }
}

#[async_trait]
impl AssistantPort for OpenAiAssistant {
    async fn create_thread(&self) -> Result<ThreadId> {
        let resp = self
            .post("/threads")
            .json(&serde_json::json!({}))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(request_error)?;
        let resp = check_status(resp, None).await?;

        let thread: ThreadObject = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("openai thread response: {e}")))?;
        Ok(ThreadId(thread.id))
    }

    async fn post_user_message(&self, thread: &ThreadId, text: &str) -> Result<()> {
        let resp = self
            .post(&format!("/threads/{}/messages", thread.0))
            .json(&serde_json::json!({ "role": "user", "content": text }))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(request_error)?;
        check_status(resp, Some(thread)).await?;
        Ok(())
    }

    async fn run_stream(&self, thread: &ThreadId) -> Result<ReplyStream> {
        let resp = self
            .post(&format!("/threads/{}/runs", thread.0))
            .json(&serde_json::json!({
                "assistant_id": self.assistant_id,
                "stream": true,
            }))
            .send()
            .await
            .map_err(request_error)?;
        let resp = check_status(resp, Some(thread)).await?;

        let mut decoder = sse::FrameDecoder::new();
        let events = resp
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder
                    .push(&bytes)
                    .into_iter()
                    .filter_map(sse::decode_frame)
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(request_error(e))],
            })
            .flat_map(futures::stream::iter);

        Ok(events.boxed())
    }
}

fn request_error(e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::Transport(format!("openai request error: {e}"))
    } else {
        Error::External(format!("openai request error: {e}"))
    }
}

/// Map non-2xx responses to the core error taxonomy. 404 only means "unknown
/// thread" on thread-scoped calls.
async fn check_status(resp: reqwest::Response, thread: Option<&ThreadId>) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: String = resp
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect();

    match (status.as_u16(), thread) {
        (401 | 403, _) => Err(Error::Auth(format!("openai: {status} {body}"))),
        (404, Some(t)) => Err(Error::InvalidThread(t.0.clone())),
        _ => Err(Error::External(format!(
            "openai request failed: {status} {body}"
        ))),
    }
}
