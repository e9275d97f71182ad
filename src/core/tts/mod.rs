//! Synthesis backends and the routing layer in front of them.
//!
//! Five engines sit behind one [`SynthesisBackend`] trait:
//!
//! - `cloud`: Amazon Polly, the default route
//! - `base_local`: XTTS v2 (`xtts_<lang>_<gender>`)
//! - `regional_local`: Vietnamese XTTS (`vi_xtts_<gender>`, `vixtts_<gender>`)
//! - `multi_speaker_local`: Kokoro (`kokoro_<voice>`)
//! - `pipeline_local`: Indic Parler (`indic_<lang>_<speaker>`)
//!
//! Local engines run inference on a model runtime sidecar reached through
//! [`runtime::ModelRuntime`]; every backend writes its WAV output through
//! [`output::AudioOutput`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

pub mod aws_polly;
mod base;
pub mod indic;
pub mod kokoro;
pub mod output;
pub mod router;
pub mod runtime;
pub mod vixtts;
pub mod xtts;

#[cfg(test)]
pub(crate) mod testing;

pub use base::{
    SharedBackend, SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError, TTSResult,
    UnavailableBackend, looks_like_resource_exhaustion,
};
pub use router::BackendRouter;

use crate::config::ServerConfig;
use crate::core::recovery::BackendFactory;
use crate::core::voice::Engine;
use aws_polly::{PollyBackend, PollyConfig};
use indic::{IndicBackend, IndicConfig};
use kokoro::{KokoroBackend, KokoroConfig};
use output::AudioOutput;
use runtime::{HttpModelRuntime, ModelRuntime};
use vixtts::{ViXttsBackend, ViXttsConfig};
use xtts::{ReferenceAudio, XttsBackend, XttsConfig};

/// Everything needed to construct any of the five backends.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub audio_output_dir: PathBuf,
    pub polly: PollyConfig,
    pub xtts: XttsConfig,
    pub vixtts: ViXttsConfig,
    pub kokoro: KokoroConfig,
    pub indic: IndicConfig,
}

impl BackendSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        let reference_audio = ReferenceAudio {
            male: config.reference_audio_male.clone(),
            female: config.reference_audio_female.clone(),
        };

        Self {
            audio_output_dir: config.audio_output_dir.clone(),
            polly: PollyConfig {
                region: config.aws_region.clone(),
                aws_access_key_id: config.aws_access_key_id.clone(),
                aws_secret_access_key: config.aws_secret_access_key.clone(),
                aws_session_token: config.aws_session_token.clone(),
                sample_rate: config.polly_sample_rate,
                endpoint_url: config.polly_endpoint_url.clone(),
            },
            xtts: XttsConfig {
                model: config.models.xtts.clone(),
                reference_audio: reference_audio.clone(),
                ..Default::default()
            },
            vixtts: ViXttsConfig {
                model: config.models.vixtts.clone(),
                reference_audio,
                ..Default::default()
            },
            kokoro: KokoroConfig {
                model: config.models.kokoro.clone(),
                speed: config.kokoro_speed,
            },
            indic: IndicConfig {
                model: config.models.indic.clone(),
            },
        }
    }

    /// Model ids of the local engines, in engine order.
    pub fn local_models(&self) -> [(Engine, &str); 4] {
        [
            (Engine::BaseLocal, self.xtts.model.as_str()),
            (Engine::RegionalLocal, self.vixtts.model.as_str()),
            (Engine::MultiSpeakerLocal, self.kokoro.model.as_str()),
            (Engine::PipelineLocal, self.indic.model.as_str()),
        ]
    }
}

/// Builds production backends. Local engines share one model runtime client.
pub struct DefaultBackendFactory {
    settings: BackendSettings,
    runtime: Arc<dyn ModelRuntime>,
}

impl DefaultBackendFactory {
    pub fn new(settings: BackendSettings, runtime: Arc<dyn ModelRuntime>) -> Self {
        Self { settings, runtime }
    }

    pub fn from_config(config: &ServerConfig) -> TTSResult<Self> {
        let runtime = HttpModelRuntime::new(&config.model_runtime_url)?;
        Ok(Self::new(
            BackendSettings::from_config(config),
            Arc::new(runtime),
        ))
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn output(&self) -> AudioOutput {
        AudioOutput::new(self.settings.audio_output_dir.clone())
    }
}

#[async_trait]
impl BackendFactory for DefaultBackendFactory {
    async fn build(&self, engine: Engine) -> TTSResult<SharedBackend> {
        let output = self.output();
        let runtime = self.runtime.clone();

        let backend: SharedBackend = match engine {
            Engine::Cloud => {
                Arc::new(PollyBackend::connect(self.settings.polly.clone(), output).await?)
            }
            Engine::BaseLocal => {
                let backend = XttsBackend::new(self.settings.xtts.clone(), runtime, output);
                backend.load().await?;
                Arc::new(backend)
            }
            Engine::RegionalLocal => {
                let backend = ViXttsBackend::new(self.settings.vixtts.clone(), runtime, output);
                backend.load().await?;
                Arc::new(backend)
            }
            Engine::MultiSpeakerLocal => {
                let backend = KokoroBackend::new(self.settings.kokoro.clone(), runtime, output);
                backend.load().await?;
                Arc::new(backend)
            }
            Engine::PipelineLocal => {
                let backend = IndicBackend::new(self.settings.indic.clone(), runtime, output);
                backend.load().await?;
                Arc::new(backend)
            }
        };
        Ok(backend)
    }
}

/// Build every engine and assemble the router.
///
/// A backend that fails to build is replaced by an [`UnavailableBackend`], so
/// startup never aborts because one model is missing; the first request that
/// routes to it triggers recovery.
pub async fn create_router(factory: &dyn BackendFactory) -> TTSResult<BackendRouter> {
    let built = join_all(Engine::ALL.iter().map(|engine| async move {
        let result = factory.build(*engine).await;
        (*engine, result)
    }))
    .await;

    let mut default = None;
    let mut locals = Vec::with_capacity(Engine::ALL.len() - 1);
    for (engine, result) in built {
        let backend: SharedBackend = match result {
            Ok(backend) => {
                info!(engine = %engine, "Backend initialized");
                backend
            }
            Err(e) => {
                warn!(engine = %engine, error = %e, "Backend unavailable at startup");
                Arc::new(UnavailableBackend::new(engine, e.to_string()))
            }
        };
        if engine == Engine::Cloud {
            default = Some(backend);
        } else {
            locals.push(backend);
        }
    }

    let default = default.ok_or_else(|| {
        TTSError::InvalidConfiguration("cloud backend missing from engine list".to_string())
    })?;
    BackendRouter::new(default, locals)
}
