//! Test doubles shared by the backend unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::base::SynthesisStage;
use super::runtime::{InferenceOutput, InferenceRequest, ModelRuntime, RuntimeError};

/// In-memory model runtime that records every call.
#[derive(Default)]
pub struct RecordingRuntime {
    pub requests: Mutex<Vec<InferenceRequest>>,
    pub loaded: Mutex<Vec<String>>,
    pub unloaded: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<RuntimeError>>,
}

impl RecordingRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str, resource_exhausted: bool) -> Arc<Self> {
        let runtime = Self::default();
        *runtime.fail_with.lock() = Some(RuntimeError {
            stage: SynthesisStage::Inference,
            message: message.to_string(),
            resource_exhausted,
        });
        Arc::new(runtime)
    }

    pub fn last_request(&self) -> Option<InferenceRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ModelRuntime for RecordingRuntime {
    async fn load(&self, model: &str) -> Result<(), RuntimeError> {
        self.loaded.lock().push(model.to_string());
        Ok(())
    }

    async fn unload(&self, model: &str) -> Result<(), RuntimeError> {
        self.unloaded.lock().push(model.to_string());
        Ok(())
    }

    async fn synthesize(&self, request: &InferenceRequest) -> Result<InferenceOutput, RuntimeError> {
        self.requests.lock().push(request.clone());
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        Ok(InferenceOutput {
            sample_rate: 24_000,
            samples: vec![0.0, 0.25, -0.25, 0.0],
        })
    }
}
