//! Configuration for a field-extraction run.
//!
//! Every knob of the Prompt Caller lives in [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. The defaults reproduce the fixed request the
//! tool has always sent (`text-davinci-003`, temperature 0.5, 2048 tokens),
//! so an unconfigured run only needs a credential.
//!
//! The credential is deliberately absent from the defaults. It must come
//! from the caller, usually via [`ExtractionConfig::from_env`].

use crate::error::Pdf2FieldsError;
use crate::prompts::DOCUMENT_PLACEHOLDER;
use std::fmt;

/// Legacy text-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/completions";

/// Model identifier sent in every request unless overridden.
pub const DEFAULT_MODEL: &str = "text-davinci-003";

/// Sampling temperature sent in every request unless overridden.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Maximum output tokens requested unless overridden.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Environment variable holding the bearer credential.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Configuration for extracting fields from one PDF.
///
/// # Example
/// ```rust
/// use pdf2fields::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .credential("sk-test")
///     .model("gpt-3.5-turbo-instruct")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2048);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Completion URL the request is POSTed to.
    pub endpoint: String,

    /// Bearer token sent in the `Authorization` header. Never logged.
    pub credential: Option<String>,

    /// Model identifier placed in the request body.
    pub model: String,

    /// Sampling temperature placed in the request body. Range: 0.0–2.0.
    pub temperature: f32,

    /// `max_tokens` placed in the request body.
    pub max_tokens: u32,

    /// Custom prompt template. Must contain `{document}`.
    /// If None, uses [`crate::prompts::FIELD_QUERY_TEMPLATE`].
    pub prompt_template: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt_template: None,
            password: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt_template", &self.prompt_template.is_some())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the credential read from `OPENAI_API_KEY`.
    ///
    /// An unset or empty variable leaves the credential empty; the error
    /// surfaces when the request is about to be sent.
    pub fn from_env() -> Self {
        let credential = std::env::var(CREDENTIAL_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            credential,
            ..Self::default()
        }
    }

    /// The credential, or [`Pdf2FieldsError::MissingCredential`].
    pub fn require_credential(&self) -> Result<&str, Pdf2FieldsError> {
        match self.credential.as_deref() {
            Some(k) if !k.trim().is_empty() => Ok(k),
            _ => Err(Pdf2FieldsError::MissingCredential),
        }
    }

    /// Check every constraint [`ExtractionConfigBuilder::build`] enforces.
    pub fn validate(&self) -> Result<(), Pdf2FieldsError> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(Pdf2FieldsError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if reqwest::Url::parse(&self.endpoint).is_err() {
            return Err(Pdf2FieldsError::InvalidConfig(format!(
                "endpoint is not a valid URL: '{}'",
                self.endpoint
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Pdf2FieldsError::InvalidConfig("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Pdf2FieldsError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(Pdf2FieldsError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if let Some(ref t) = self.prompt_template {
            if !t.contains(DOCUMENT_PLACEHOLDER) {
                return Err(Pdf2FieldsError::InvalidConfig(format!(
                    "prompt template must contain the {DOCUMENT_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn credential(mut self, key: impl Into<String>) -> Self {
        self.config.credential = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2FieldsError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
