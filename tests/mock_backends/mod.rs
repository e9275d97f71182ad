//! Stub backends and app wiring for integration tests.
//!
//! The stubs stand in for every engine so routes can be exercised end to end
//! without AWS or a model runtime.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use tts_gateway::core::recovery::BackendFactory;
use tts_gateway::core::retention::{AudioRetentionManager, RetentionPolicy};
use tts_gateway::core::service::{ServiceOptions, TtsService};
use tts_gateway::core::translate::DisabledTranslator;
use tts_gateway::core::tts::{
    BackendRouter, SharedBackend, SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError,
    TTSResult,
};
use tts_gateway::core::voice::{Engine, Gender, VoiceDescriptor};
use tts_gateway::{ServerConfig, routes, state::AppState};

/// One recorded synthesis call: (engine, voice id, text, session id).
pub type Call = (Engine, String, String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Exhausted,
    Broken,
}

pub struct StubBackend {
    engine: Engine,
    behavior: Behavior,
    output_dir: PathBuf,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl SynthesisBackend for StubBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        let id = match self.engine {
            Engine::Cloud => "Joanna".to_string(),
            Engine::BaseLocal => "xtts_en_female".to_string(),
            Engine::RegionalLocal => "vi_xtts_female".to_string(),
            Engine::MultiSpeakerLocal => "kokoro_af_heart".to_string(),
            Engine::PipelineLocal => "indic_hi_Rohit".to_string(),
        };
        Ok(vec![VoiceDescriptor::new(
            self.engine,
            id,
            "Stub Voice",
            "English",
            Gender::Female,
        )])
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        self.calls.lock().push((
            self.engine,
            request.voice.raw().to_string(),
            request.text.to_string(),
            request.session_id.to_string(),
        ));
        match self.behavior {
            Behavior::Succeed => {
                let filename = format!("realtime_{}_12345.wav", request.session_id);
                std::fs::write(self.output_dir.join(&filename), b"RIFF0000WAVE").map_err(|e| {
                    TTSError::synthesis(self.engine, SynthesisStage::Save, e.to_string())
                })?;
                Ok(filename)
            }
            Behavior::Exhausted => Err(TTSError::synthesis(
                self.engine,
                SynthesisStage::Inference,
                "CUDA error: out of memory",
            )),
            Behavior::Broken => Err(TTSError::synthesis(
                self.engine,
                SynthesisStage::ReferenceAudio,
                "reference clip missing",
            )),
        }
    }
}

/// Builds succeeding stubs and counts how often it was asked to.
pub struct StubFactory {
    pub builds: AtomicUsize,
    output_dir: PathBuf,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl StubFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendFactory for StubFactory {
    async fn build(&self, engine: Engine) -> TTSResult<SharedBackend> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubBackend {
            engine,
            behavior: Behavior::Succeed,
            output_dir: self.output_dir.clone(),
            calls: self.calls.clone(),
        }))
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub dir: TempDir,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub factory: Arc<StubFactory>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_behavior(|_| Behavior::Succeed)
    }

    pub fn with_behavior(behavior: impl Fn(Engine) -> Behavior) -> Self {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_path_buf();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let stub = |engine: Engine| -> SharedBackend {
            Arc::new(StubBackend {
                engine,
                behavior: behavior(engine),
                output_dir: output_dir.clone(),
                calls: calls.clone(),
            })
        };
        let router = BackendRouter::new(
            stub(Engine::Cloud),
            Engine::ALL
                .into_iter()
                .filter(Engine::is_local)
                .map(stub)
                .collect(),
        )
        .unwrap();

        let factory = Arc::new(StubFactory {
            builds: AtomicUsize::new(0),
            output_dir: output_dir.clone(),
            calls: calls.clone(),
        });
        let service = TtsService::new(
            router,
            factory.clone(),
            Arc::new(DisabledTranslator),
            ServiceOptions::default(),
        );

        let mut config = ServerConfig::default();
        config.audio_output_dir = output_dir.clone();
        let retention = Arc::new(AudioRetentionManager::new(
            output_dir,
            RetentionPolicy::from(&config.cleanup),
        ));

        let state = AppState::from_parts(config, service, retention);
        let app = routes::api::create_api_router().with_state(state.clone());

        Self {
            app,
            state,
            dir,
            calls,
            factory,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
