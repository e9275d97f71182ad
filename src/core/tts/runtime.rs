//! Client for the local model runtime.
//!
//! The XTTS, Vietnamese XTTS, Kokoro and Indic Parler backends do not run
//! neural networks in-process. They call a model runtime that owns the GPU and
//! the weights over a small JSON API:
//!
//! | Method | Path                 | Body                      |
//! |--------|----------------------|---------------------------|
//! | POST   | `/v1/models/load`    | `{"model": "..."}`        |
//! | POST   | `/v1/models/unload`  | `{"model": "..."}`        |
//! | POST   | `/v1/synthesize`     | [`InferenceRequest`]      |
//!
//! Failures come back as `{"error": "...", "stage": "...", "resource_exhausted": bool}`.
//! HTTP 503 and 507 are treated as resource exhaustion even without the flag.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::base::{SynthesisStage, TTSError, looks_like_resource_exhaustion};
use crate::core::voice::Engine;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Default, Serialize)]
pub struct InferenceRequest {
    pub model: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Model-specific sampling parameters.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceOutput {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub stage: SynthesisStage,
    pub message: String,
    pub resource_exhausted: bool,
}

impl RuntimeError {
    pub fn into_tts(self, engine: Engine) -> TTSError {
        TTSError::synthesis_flagged(engine, self.stage, self.message, self.resource_exhausted)
    }
}

#[derive(Debug, Deserialize)]
struct RuntimeErrorBody {
    error: String,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    resource_exhausted: Option<bool>,
}

#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn load(&self, model: &str) -> Result<(), RuntimeError>;

    async fn unload(&self, model: &str) -> Result<(), RuntimeError>;

    async fn synthesize(&self, request: &InferenceRequest) -> Result<InferenceOutput, RuntimeError>;
}

/// [`ModelRuntime`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpModelRuntime {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpModelRuntime {
    pub fn new(base_url: &str) -> Result<Self, TTSError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            TTSError::InvalidConfiguration(format!("Invalid model runtime URL '{base_url}': {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                TTSError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, stage: SynthesisStage) -> Result<Url, RuntimeError> {
        self.base_url.join(path).map_err(|e| RuntimeError {
            stage,
            message: format!("invalid runtime endpoint {path}: {e}"),
            resource_exhausted: false,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        stage: SynthesisStage,
    ) -> Result<reqwest::Response, RuntimeError> {
        let url = self.endpoint(path, stage)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RuntimeError {
                stage,
                message: format!("model runtime unreachable: {e}"),
                resource_exhausted: false,
            })?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response, stage).await)
    }
}

async fn error_from_response(response: reqwest::Response, default_stage: SynthesisStage) -> RuntimeError {
    let status = response.status();
    let status_exhausted = matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::INSUFFICIENT_STORAGE
    );
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<RuntimeErrorBody>(&text) {
        Ok(body) => RuntimeError {
            stage: body
                .stage
                .as_deref()
                .and_then(SynthesisStage::parse)
                .unwrap_or(default_stage),
            resource_exhausted: body.resource_exhausted.unwrap_or(status_exhausted)
                || status_exhausted,
            message: body.error,
        },
        Err(_) => {
            let message = if text.is_empty() {
                format!("model runtime returned {status}")
            } else {
                format!("model runtime returned {status}: {text}")
            };
            RuntimeError {
                stage: default_stage,
                resource_exhausted: status_exhausted || looks_like_resource_exhaustion(&text),
                message,
            }
        }
    }
}

#[async_trait]
impl ModelRuntime for HttpModelRuntime {
    async fn load(&self, model: &str) -> Result<(), RuntimeError> {
        debug!(model = model, "Loading model on runtime");
        self.post("v1/models/load", &json!({ "model": model }), SynthesisStage::Init)
            .await
            .map(|_| ())
    }

    async fn unload(&self, model: &str) -> Result<(), RuntimeError> {
        debug!(model = model, "Unloading model on runtime");
        self.post("v1/models/unload", &json!({ "model": model }), SynthesisStage::Init)
            .await
            .map(|_| ())
    }

    async fn synthesize(&self, request: &InferenceRequest) -> Result<InferenceOutput, RuntimeError> {
        let response = self
            .post("v1/synthesize", request, SynthesisStage::Inference)
            .await?;

        let output: InferenceOutput = response.json().await.map_err(|e| {
            warn!(model = %request.model, error = %e, "Malformed runtime response");
            RuntimeError {
                stage: SynthesisStage::Inference,
                message: format!("malformed runtime response: {e}"),
                resource_exhausted: false,
            }
        })?;

        if output.samples.is_empty() {
            return Err(RuntimeError {
                stage: SynthesisStage::Inference,
                message: "model runtime returned no audio".to_string(),
                resource_exhausted: false,
            });
        }
        Ok(output)
    }
}
