use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Debug, Clone)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: String,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// URL and auth scheme of the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `/v1/chat/completions` with bearer auth.
    OpenAi,
    /// `/openai/deployments/{model}/chat/completions` with an `api-key` header.
    Azure { api_version: String },
}

/// Client for OpenAI-compatible chat-completion endpoints, including Azure
/// OpenAI deployments.
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    flavor: ApiFlavor,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            api_key,
            flavor: ApiFlavor::OpenAi,
            http_client: reqwest::Client::new(),
        }
    }

    /// Azure OpenAI: `model` is the deployment name.
    pub fn azure(
        endpoint: String,
        deployment: String,
        api_key: Option<String>,
        api_version: String,
    ) -> Self {
        let mut client = Self::new(Some(endpoint), deployment, api_key);
        client.flavor = ApiFlavor::Azure { api_version };
        client
    }

    /// Bound each HTTP exchange. An elapsed timeout surfaces as `Transient`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CopilotError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn endpoint_url(&self) -> String {
        match &self.flavor {
            ApiFlavor::OpenAi => format!("{}/v1/chat/completions", self.base_url),
            ApiFlavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, self.model, api_version
            ),
        }
    }

    fn role_to_string(role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_messages(request: &LlmRequest) -> Vec<OpenAiMessage> {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system_prompt {
            messages.push(OpenAiMessage {
                role: "system",
                content: system.clone(),
            });
        }
        for msg in &request.messages {
            messages.push(OpenAiMessage {
                role: Self::role_to_string(&msg.role),
                content: msg.content.clone(),
            });
        }
        messages
    }

    fn build_request_body(&self, request: &LlmRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

/// Map a non-success status onto the completion error taxonomy. A
/// `Retry-After` given in seconds is kept as a structured hint.
fn classify_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> CopilotError {
    let message = format!("OpenAI API error {status}: {body}");

    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        match retry_after.and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(secs) => CopilotError::Throttled {
                message,
                retry_after: Duration::from_secs(secs),
            },
            None => CopilotError::Transient(message),
        }
    } else {
        CopilotError::Rejected(message)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = self.endpoint_url();
        let body = self.build_request_body(&request);

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = match self.flavor {
                ApiFlavor::OpenAi => http_req.bearer_auth(key),
                ApiFlavor::Azure { .. } => http_req.header("api-key", key),
            };
        }

        debug!(model = %self.model, messages = body.messages.len(), "Sending completion request");

        let response = http_req
            .send()
            .await
            .map_err(|e| CopilotError::Transient(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after.as_deref(), &body_text));
        }

        let oai_response: OpenAiResponse = response.json().await.map_err(|e| {
            CopilotError::MalformedResponse(format!("Failed to parse OpenAI response: {e}"))
        })?;

        let choice = oai_response.choices.into_iter().next().ok_or_else(|| {
            CopilotError::MalformedResponse("No choices in OpenAI response".to_string())
        })?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(CopilotError::Rejected(
                "Completion blocked by content filter".to_string(),
            ));
        }

        let content = choice.message.content.ok_or_else(|| {
            CopilotError::MalformedResponse("Completion has no content".to_string())
        })?;

        Ok(LlmResponse {
            content,
            model: oai_response.model,
            usage: oai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str, finish_reason: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        })
    }

    #[test]
    fn request_body_matches_openai_format() {
        let client = OpenAiClient::new(None, "gpt-4".to_string(), Some("sk-test".to_string()));
        let request = LlmRequest {
            system_prompt: Some("Be helpful.".to_string()),
            messages: vec![ChatMessage::user("Hello")],
            temperature: Some(0.5),
            max_tokens: Some(512),
            json_mode: true,
        };

        let body = client.build_request_body(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["response_format"]["type"], "json_object");

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Hello");
    }

    #[test]
    fn request_body_omits_optional_fields() {
        let client = OpenAiClient::new(None, "gpt-4".to_string(), None);
        let request = LlmRequest {
            messages: vec![ChatMessage::user("Hello")],
            ..Default::default()
        };

        let json = serde_json::to_value(client.build_request_body(&request)).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn endpoint_urls_per_flavor() {
        let openai = OpenAiClient::new(Some("http://llm.local/".into()), "m".into(), None);
        assert_eq!(openai.endpoint_url(), "http://llm.local/v1/chat/completions");

        let azure = OpenAiClient::azure(
            "https://res.openai.azure.com".into(),
            "gpt-4o".into(),
            None,
            "2024-02-15-preview".into(),
        );
        assert_eq!(
            azure.endpoint_url(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, None, "").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, Some("3"), "").is_transient());
        assert!(classify_status(StatusCode::REQUEST_TIMEOUT, None, "").is_transient());
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None, "content_filter"),
            CopilotError::Rejected(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None, ""),
            CopilotError::Rejected(_)
        ));
        let throttled = classify_status(StatusCode::TOO_MANY_REQUESTS, Some("7"), "slow down");
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(7)));

        // Dates and garbage are not hints; the body never is.
        let dated = classify_status(
            StatusCode::SERVICE_UNAVAILABLE,
            Some("Wed, 21 Oct 2026 07:28:00 GMT"),
            "upstream says retry-after: 3600",
        );
        assert!(dated.is_transient());
        assert!(dated.retry_after().is_none());
    }

    #[tokio::test]
    async fn completes_against_openai_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{}", "stop")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Some(server.uri()), "gpt-4o-mini".into(), Some("sk-test".into()));
        let response = client
            .complete(LlmRequest::prompt("sys", "hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "{}");
        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(response.usage.unwrap().prompt_tokens, 12);
    }

    #[tokio::test]
    async fn azure_uses_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/copilot/chat/completions"))
            .and(query_param("api-version", "2024-02-15-preview"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok", "stop")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::azure(
            server.uri(),
            "copilot".into(),
            Some("azure-key".into()),
            "2024-02-15-preview".into(),
        );
        let response = client.complete(LlmRequest::prompt("s", "u")).await.unwrap();
        assert_eq!(response.content, "ok");
    }

    #[tokio::test]
    async fn server_errors_are_transient_and_carry_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "2")
                    .set_body_string("rate limit exceeded"),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Some(server.uri()), "m".into(), None);
        let err = client.complete(LlmRequest::prompt("s", "u")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn content_filter_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("", "content_filter")),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Some(server.uri()), "m".into(), None);
        let err = client.complete(LlmRequest::prompt("s", "u")).await.unwrap_err();
        assert!(matches!(err, CopilotError::Rejected(_)));
    }

    #[tokio::test]
    async fn garbage_envelope_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Some(server.uri()), "m".into(), None);
        let err = client.complete(LlmRequest::prompt("s", "u")).await.unwrap_err();
        assert!(matches!(err, CopilotError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transient() {
        // Port 9 (discard) is closed on test hosts.
        let client = OpenAiClient::new(Some("http://127.0.0.1:9".into()), "m".into(), None);
        let err = client.complete(LlmRequest::prompt("s", "u")).await.unwrap_err();
        assert!(err.is_transient());
    }
}
