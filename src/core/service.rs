//! Request orchestration.
//!
//! [`TtsService`] owns the router, catalog, session queues, recovery
//! coordinator and translator, and runs the generation pipeline:
//!
//! ```text
//! validate -> route + parse voice -> enqueue/dequeue -> translate? -> synthesize
//!                                                                     |
//!                                       resource exhausted -> recover, re-raise
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::recovery::{BackendFactory, BackendStatus, RecoveryCoordinator, RecoveryOutcome};
use crate::core::session::SessionQueue;
use crate::core::translate::{
    DisabledTranslator, GoogleTranslator, Translation, TranslationError, Translator,
};
use crate::core::tts::{
    BackendRouter, DefaultBackendFactory, SynthesisRequest, TTSError, TTSResult, create_router,
};
use crate::core::voice::{CatalogSnapshot, Engine, VoiceCatalog, VoiceIdentifier};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub recovery_cooldown: Duration,
    /// Concurrent synthesis calls per local engine; 0 disables the limit.
    pub max_concurrent_inference: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            recovery_cooldown: Duration::from_secs(30),
            max_concurrent_inference: 1,
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            recovery_cooldown: config.recovery_cooldown(),
            max_concurrent_inference: config.max_concurrent_inference,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub text: Option<String>,
    pub voice_id: Option<String>,
    pub session_id: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    /// Bare filename inside the audio output directory.
    pub filename: String,
    pub engine: Engine,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    Generated(GeneratedAudio),
    /// The session had nothing left to synthesize.
    NothingPending,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Non-blank text, passed through exactly as sent.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub struct TtsService {
    catalog: Arc<VoiceCatalog>,
    router: Arc<BackendRouter>,
    sessions: Arc<SessionQueue>,
    recovery: Arc<RecoveryCoordinator>,
    translator: Arc<dyn Translator>,
    limits: HashMap<Engine, Arc<Semaphore>>,
}

impl TtsService {
    pub fn new(
        router: BackendRouter,
        factory: Arc<dyn BackendFactory>,
        translator: Arc<dyn Translator>,
        options: ServiceOptions,
    ) -> Self {
        let router = Arc::new(router);
        let catalog = Arc::new(VoiceCatalog::new());
        let recovery = Arc::new(RecoveryCoordinator::new(
            router.clone(),
            catalog.clone(),
            factory,
            options.recovery_cooldown,
        ));

        let limits = if options.max_concurrent_inference == 0 {
            HashMap::new()
        } else {
            router
                .engines()
                .into_iter()
                .filter(Engine::is_local)
                .map(|engine| {
                    (
                        engine,
                        Arc::new(Semaphore::new(options.max_concurrent_inference)),
                    )
                })
                .collect()
        };

        Self {
            catalog,
            router,
            sessions: Arc::new(SessionQueue::new()),
            recovery,
            translator,
            limits,
        }
    }

    /// Build every backend from configuration and load the voice catalog.
    pub async fn initialize(config: &ServerConfig) -> TTSResult<Self> {
        let factory = Arc::new(DefaultBackendFactory::from_config(config)?);
        let router = create_router(factory.as_ref()).await?;

        let translator: Arc<dyn Translator> = match config.google_translate_api_key.as_deref() {
            Some(key) if config.has_translation() => Arc::new(
                GoogleTranslator::new(config.google_translate_url.clone(), key)
                    .map_err(|e| TTSError::InvalidConfiguration(e.to_string()))?,
            ),
            _ => {
                info!("GOOGLE_TRANSLATE_API_KEY not set, translation disabled");
                Arc::new(DisabledTranslator)
            }
        };

        let service = Self::new(
            router,
            factory,
            translator,
            ServiceOptions::from_config(config),
        );
        service.refresh_catalog().await;
        Ok(service)
    }

    pub async fn refresh_catalog(&self) {
        self.catalog.refresh(&self.router.backends()).await;
    }

    pub async fn voices(&self) -> Arc<CatalogSnapshot> {
        self.catalog.get_voices(&self.router.backends()).await
    }

    pub fn voice_count(&self) -> usize {
        self.catalog.voice_count()
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    pub fn sessions(&self) -> &Arc<SessionQueue> {
        &self.sessions
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        let existed = self.sessions.clear(session_id);
        debug!(session_id, existed, "Session cleared");
        existed
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, TranslationError> {
        self.translator.translate(text, target_language).await
    }

    pub async fn generate(&self, request: GenerateRequest) -> AppResult<GenerateOutcome> {
        let (Some(text), Some(session_id)) =
            (non_blank(&request.text), present(&request.session_id))
        else {
            return Err(AppError::validation("Missing text or session_id"));
        };
        let voice_id = present(&request.voice_id)
            .ok_or_else(|| AppError::validation("Missing voice_id"))?;

        let (engine, backend) = self.router.resolve(voice_id);
        let voice = VoiceIdentifier::parse(voice_id, engine)?;

        let Some(mut pending) = self.sessions.enqueue_and_take(session_id, text) else {
            return Ok(GenerateOutcome::NothingPending);
        };

        if let Some(target) = present(&request.target_language) {
            pending = self.translator.translate(&pending, target).await?.translated_text;
        }

        let started = Instant::now();
        let permit = match self.limits.get(&engine) {
            Some(limit) => Some(
                limit
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("inference limiter closed: {e}")))?,
            ),
            None => None,
        };

        let result = backend
            .synthesize(SynthesisRequest {
                text: &pending,
                voice: &voice,
                session_id,
            })
            .await;
        drop(permit);
        drop(backend);

        match result {
            Ok(filename) => {
                let elapsed = started.elapsed();
                info!(
                    engine = %engine,
                    session_id,
                    file = %filename,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Audio generated"
                );
                Ok(GenerateOutcome::Generated(GeneratedAudio {
                    filename,
                    engine,
                    elapsed,
                }))
            }
            Err(e) if e.is_resource_exhausted() => {
                self.recover_after(engine, &e).await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Single recovery attempt after an exhaustion error.
    ///
    /// Runs on its own task so a client disconnect cannot abort a rebuild
    /// half way through.
    async fn recover_after(&self, engine: Engine, error: &TTSError) {
        warn!(engine = %engine, error = %error, "Resource exhaustion, attempting recovery");
        self.recovery.mark_failure(engine, &error.to_string());

        let recovery = self.recovery.clone();
        let task = tokio::spawn(async move { recovery.try_recover(engine).await });
        match task.await {
            Ok(true) => info!(engine = %engine, "Backend reinitialized after failure"),
            Ok(false) => debug!(engine = %engine, "Recovery skipped or failed"),
            Err(e) => warn!(engine = %engine, error = %e, "Recovery task aborted"),
        }
    }

    /// Rebuild every backend now, ignoring the cooldown.
    pub async fn recover_all(&self) -> Vec<(Engine, RecoveryOutcome)> {
        self.recovery.force_recover_all().await
    }

    pub fn backend_health(&self) -> Vec<BackendStatus> {
        self.recovery.snapshot()
    }

    pub fn spawn_session_sweeper(&self, ttl: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        self.sessions.clone().spawn_idle_sweeper(ttl, cancel)
    }
}
