use crate::config::duration_ms;
use crate::error_code::ServiceErrorKind;
use crate::facade::AiGenerator;
use crate::types::{
    ExplanationRequest, QuestionRequest, QuizQuestion, SkillTreeExpansion, SkillTreeRequest,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the bearer token, unless `api_key_env` overrides it.
pub const DEFAULT_API_KEY_ENV: &str = "SKILLTREE_AI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    pub api_key_env: String,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            pool_max_idle_per_host: 16,
        }
    }
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Deserialize)]
struct ExplanationBody {
    explanation: String,
}

/// JSON-over-HTTP generator.
///
/// | Operation | Endpoint |
/// |-----------|----------|
/// | question | `POST {base}/v1/questions` → `QuizQuestion` |
/// | explanation | `POST {base}/v1/explanations` → `{"explanation": "..."}` |
/// | skill tree | `POST {base}/v1/skill-tree` → `{"newSkills": [...]}` |
///
/// Non-2xx responses are classified by status, refined by a JSON `error.code`
/// when the body carries one.
pub struct HttpAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAiGenerator {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(TransportError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(TransportError::Http)?;
        debug!(url = %url, status = status.as_u16(), "AI service responded");

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| {
            Error::service(
                ServiceErrorKind::InvalidResponse,
                format!("malformed response from {}: {}", path, e),
            )
        })
    }
}

fn classify_failure(status: u16, body: &str) -> Error {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error_obj = parsed.as_ref().and_then(|v| v.get("error"));
    let code = error_obj
        .and_then(|e| e.get("code").or_else(|| e.get("type")))
        .and_then(|c| c.as_str());
    let message = error_obj
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(200).collect());

    let kind = code
        .and_then(ServiceErrorKind::from_provider_code)
        .unwrap_or_else(|| ServiceErrorKind::from_status(status));
    Error::service(kind, format!("HTTP {}: {}", status, message))
}

#[async_trait]
impl AiGenerator for HttpAiGenerator {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate_question(&self, req: &QuestionRequest) -> Result<QuizQuestion> {
        let question: QuizQuestion = self.post_json("/v1/questions", req).await?;
        question.validate().map_err(|e| {
            Error::service(ServiceErrorKind::InvalidResponse, e.to_string())
        })?;
        Ok(question)
    }

    async fn generate_explanation(&self, req: &ExplanationRequest) -> Result<String> {
        let body: ExplanationBody = self.post_json("/v1/explanations", req).await?;
        if body.explanation.trim().is_empty() {
            return Err(Error::service(
                ServiceErrorKind::InvalidResponse,
                "empty explanation",
            ));
        }
        Ok(body.explanation)
    }

    async fn expand_skill_tree(&self, req: &SkillTreeRequest) -> Result<SkillTreeExpansion> {
        self.post_json("/v1/skill-tree", req).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            TransportError::Http(e) if e.is_timeout() => ServiceErrorKind::Timeout,
            TransportError::Http(e) if e.is_decode() => ServiceErrorKind::InvalidResponse,
            TransportError::Http(e) => match e.status() {
                Some(status) => ServiceErrorKind::from_status(status.as_u16()),
                None => ServiceErrorKind::Unavailable,
            },
            TransportError::Other(_) => ServiceErrorKind::Unavailable,
        }
    }
}
