//! Semantic résumé matcher backed by the Anthropic Messages API.
//!
//! One request per posting, temperature 0, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::prompts::{build_match_prompt, MATCH_SYSTEM};
use crate::matcher::{ensure_matchable, MatchError, ResumeMatcher};
use crate::search::model::MatchResult;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Clone)]
pub struct LlmResumeMatcher {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmResumeMatcher {
    pub fn new(api_key: String) -> Result<Self, MatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| MatchError::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Points the matcher at another Messages endpoint.
    #[cfg(test)]
    pub(crate) fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String, MatchError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: MATCH_SYSTEM,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| MatchError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MatchError::Backend(format!("HTTP {status}: {detail}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| MatchError::Backend(format!("invalid response body: {e}")))?;

        parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .ok_or_else(|| MatchError::Backend("model returned no text".to_string()))
    }
}

#[async_trait]
impl ResumeMatcher for LlmResumeMatcher {
    async fn match_resume(
        &self,
        description: &str,
        resume_text: &str,
    ) -> Result<MatchResult, MatchError> {
        ensure_matchable(description, resume_text)?;

        let reply = self
            .complete(&build_match_prompt(description, resume_text))
            .await?;
        let result = parse_match_reply(&reply)?;
        debug!(
            "LLM match scored {:.2} ({} matched, {} missing)",
            result.similarity_score,
            result.matched_skills.len(),
            result.missing_skills.len()
        );
        Ok(result)
    }
}

/// Parses the model's JSON reply, tolerating a surrounding ```json fence.
fn parse_match_reply(reply: &str) -> Result<MatchResult, MatchError> {
    let body = reply.trim();
    let body = body
        .strip_prefix("```json")
        .or_else(|| body.strip_prefix("```"))
        .map(|rest| rest.trim().trim_end_matches("```").trim())
        .unwrap_or(body);

    serde_json::from_str(body)
        .map_err(|e| MatchError::Backend(format!("unparseable match reply: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    const DESCRIPTION: &str = "Senior Rust engineer, Kafka and Kubernetes";
    const RESUME: &str = "Rust developer with Kubernetes experience";

    type Captured = Arc<Mutex<Option<(HeaderMap, Value)>>>;

    /// Serves a fixed Messages reply and records the last request it saw.
    async fn serve_reply(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let seen = Arc::clone(&captured);
        let router = Router::new().route(
            "/v1/messages",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = Arc::clone(&seen);
                let reply = reply.clone();
                async move {
                    *seen.lock().unwrap() = Some((headers, body));
                    (status, Json(reply)).into_response()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/v1/messages"), captured)
    }

    fn matcher(endpoint: String) -> LlmResumeMatcher {
        LlmResumeMatcher::new("sk-test".to_string())
            .unwrap()
            .with_endpoint(endpoint)
    }

    #[tokio::test]
    async fn test_match_against_local_endpoint() {
        let reply = json!({
            "content": [
                {"type": "text", "text": "```json\n{\"similarity_score\": 0.81, \"matched_skills\": [\"Rust\", \"Kubernetes\"], \"missing_skills\": [\"Kafka\"]}\n```"}
            ]
        });
        let (endpoint, captured) = serve_reply(StatusCode::OK, reply).await;

        let result = matcher(endpoint)
            .match_resume(DESCRIPTION, RESUME)
            .await
            .unwrap();
        assert!((result.similarity_score - 0.81).abs() < 1e-9);
        assert_eq!(result.matched_skills, vec!["Rust", "Kubernetes"]);
        assert_eq!(result.missing_skills, vec!["Kafka"]);

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["x-api-key"], "sk-test");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
        assert_eq!(body["model"], MODEL);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["system"], MATCH_SYSTEM);
        assert_eq!(body["messages"][0]["role"], "user");
        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains(DESCRIPTION) && prompt.contains(RESUME));
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let (endpoint, _) = serve_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"type": "api_error", "message": "overloaded"}}),
        )
        .await;

        match matcher(endpoint).match_resume(DESCRIPTION, RESUME).await {
            Err(MatchError::Backend(msg)) => {
                assert!(msg.contains("500"), "{msg}");
                assert!(msg.contains("overloaded"), "{msg}");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reply_without_text_block_is_backend_error() {
        let (endpoint, _) = serve_reply(
            StatusCode::OK,
            json!({"content": [{"type": "tool_use", "id": "t1", "name": "x", "input": {}}]}),
        )
        .await;

        match matcher(endpoint).match_resume(DESCRIPTION, RESUME).await {
            Err(MatchError::Backend(msg)) => assert!(msg.contains("no text"), "{msg}"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_plain_json_reply() {
        let reply = r#"{"similarity_score": 0.72, "matched_skills": ["Rust"], "missing_skills": ["Kafka"]}"#;
        let result = parse_match_reply(reply).unwrap();
        assert!((result.similarity_score - 0.72).abs() < 1e-9);
        assert_eq!(result.matched_skills, vec!["Rust"]);
        assert_eq!(result.missing_skills, vec!["Kafka"]);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"similarity_score\": 0.4}\n```";
        let result = parse_match_reply(reply).unwrap();
        assert!((result.similarity_score - 0.4).abs() < 1e-9);
        assert!(result.matched_skills.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_backend_error() {
        assert!(matches!(
            parse_match_reply("I think it's a good match!"),
            Err(MatchError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_description_rejected_before_any_request() {
        let matcher = LlmResumeMatcher::new("sk-test".to_string()).unwrap();
        let err = matcher.match_resume("", "Rust").await.unwrap_err();
        assert!(matches!(err, MatchError::MalformedInput(_)));
    }
}
