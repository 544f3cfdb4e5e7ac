//! The Prompt Caller: build the completion request and POST it once.
//!
//! Prompt wording lives in [`crate::prompts`]; this module only shapes the
//! wire body and moves bytes. The network sits behind [`CompletionTransport`]
//! so the pipeline can be driven by a stub in tests.
//!
//! ## What this stage does not do
//!
//! There is no retry, no timeout beyond reqwest's default, and no status-code
//! inspection: whatever body comes back (including an error body) is handed
//! to [`super::answer`] unchanged. A non-2xx status is logged at `warn`.

use crate::config::ExtractionConfig;
use crate::error::Pdf2FieldsError;
use crate::prompts::{render_prompt, FIELD_QUERY_TEMPLATE};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Body of the outbound completion call.
///
/// Serialises to exactly four keys: `model`, `prompt`, `temperature`,
/// `max_tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Build the request for `document_text` using the configured template.
    pub fn for_document(config: &ExtractionConfig, document_text: &str) -> Self {
        let template = config
            .prompt_template
            .as_deref()
            .unwrap_or(FIELD_QUERY_TEMPLATE);

        Self {
            model: config.model.clone(),
            prompt: render_prompt(template, document_text),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Sends one completion request and returns the raw response body.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// POST `request` to `endpoint` with `credential` as bearer token.
    async fn send(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, Pdf2FieldsError>;
}

/// [`CompletionTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (proxies, custom TLS roots, …).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, Pdf2FieldsError> {
        let transport_err = |source: reqwest::Error| Pdf2FieldsError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", credential))
            .json(request)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Completion endpoint returned HTTP {}", status);
        }

        response.text().await.map_err(transport_err)
    }
}

/// Default transport used when the caller does not supply one.
pub fn default_transport() -> Arc<dyn CompletionTransport> {
    Arc::new(HttpTransport::new())
}

/// Format the prompt, send it, and return the unparsed response body.
///
/// Fails with [`Pdf2FieldsError::MissingCredential`] before any network
/// traffic if no credential is configured.
pub async fn call_completion(
    config: &ExtractionConfig,
    transport: &dyn CompletionTransport,
    document_text: &str,
) -> Result<String, Pdf2FieldsError> {
    let credential = config.require_credential()?;
    let request = CompletionRequest::for_document(config, document_text);

    info!("Requesting completion from {} ({})", config.endpoint, config.model);
    debug!("Prompt is {} chars", request.prompt.len());

    let start = Instant::now();
    let body = transport
        .send(&config.endpoint, credential, &request)
        .await?;
    debug!(
        "Completion body: {} bytes in {:?}",
        body.len(),
        start.elapsed()
    );

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records what it was asked to send and replies with a canned body.
    struct Recorder {
        reply: String,
        seen: Mutex<Vec<(String, String, CompletionRequest)>>,
    }

    #[async_trait]
    impl CompletionTransport for Recorder {
        async fn send(
            &self,
            endpoint: &str,
            credential: &str,
            request: &CompletionRequest,
        ) -> Result<String, Pdf2FieldsError> {
            self.seen.lock().unwrap().push((
                endpoint.to_string(),
                credential.to_string(),
                request.clone(),
            ));
            Ok(self.reply.clone())
        }
    }

    fn recorder(reply: &str) -> Recorder {
        Recorder {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn request_body_has_exactly_four_keys() {
        let config = ExtractionConfig::default();
        let request = CompletionRequest::for_document(&config, "ABC");
        let value = serde_json::to_value(&request).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["max_tokens", "model", "prompt", "temperature"]);

        assert_eq!(obj["model"], "text-davinci-003");
        assert_eq!(obj["temperature"].as_f64(), Some(0.5));
        assert_eq!(obj["max_tokens"].as_u64(), Some(2048));
        assert!(obj["prompt"].as_str().unwrap().contains("\nABC\n"));
    }

    #[test]
    fn custom_template_is_used() {
        let config = ExtractionConfig::builder()
            .prompt_template("Fields please: {document}")
            .build()
            .unwrap();
        let request = CompletionRequest::for_document(&config, "XYZ");
        assert_eq!(request.prompt, "Fields please: XYZ");
    }

    #[test]
    fn document_text_is_not_truncated() {
        let big = "x".repeat(200_000);
        let request = CompletionRequest::for_document(&ExtractionConfig::default(), &big);
        assert!(request.prompt.contains(&big));
    }

    #[tokio::test]
    async fn call_completion_forwards_config_and_returns_body() {
        let config = ExtractionConfig::builder()
            .endpoint("http://localhost:9/v1/completions")
            .credential("sk-test")
            .build()
            .unwrap();
        let transport = recorder(r#"{"choices":[]}"#);

        let body = call_completion(&config, &transport, "doc").await.unwrap();
        assert_eq!(body, r#"{"choices":[]}"#);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "exactly one request");
        assert_eq!(seen[0].0, "http://localhost:9/v1/completions");
        assert_eq!(seen[0].1, "sk-test");
        assert_eq!(seen[0].2.max_tokens, 2048);
    }

    #[tokio::test]
    async fn missing_credential_sends_nothing() {
        let transport = recorder("{}");
        let err = call_completion(&ExtractionConfig::default(), &transport, "doc")
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2FieldsError::MissingCredential));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test host.
        let config = ExtractionConfig::builder()
            .endpoint("http://127.0.0.1:9/v1/completions")
            .credential("sk-test")
            .build()
            .unwrap();
        let transport = HttpTransport::new();
        let result = tokio_test::block_on(call_completion(&config, &transport, "doc"));
        assert!(matches!(result, Err(Pdf2FieldsError::Transport { .. })));
    }
}
