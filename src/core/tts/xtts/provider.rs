use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, json};
use tracing::{debug, warn};

use super::config::{XTTS_LANGUAGES, XttsConfig, xtts_language_name};
use crate::core::tts::base::{
    SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError, TTSResult,
};
use crate::core::tts::output::AudioOutput;
use crate::core::tts::runtime::{InferenceRequest, ModelRuntime};
use crate::core::voice::{Engine, Gender, VoiceDescriptor, VoiceSelector};

/// XTTS v2 multilingual voice cloning.
///
/// Voices are the cross product of supported languages and the two reference
/// speakers: `xtts_<language>_<gender>`.
pub struct XttsBackend {
    config: XttsConfig,
    runtime: Arc<dyn ModelRuntime>,
    output: AudioOutput,
}

impl XttsBackend {
    pub fn new(config: XttsConfig, runtime: Arc<dyn ModelRuntime>, output: AudioOutput) -> Self {
        Self {
            config,
            runtime,
            output,
        }
    }

    /// Ask the runtime to load the model. Failure here is an `init` stage error.
    pub async fn load(&self) -> TTSResult<()> {
        self.runtime
            .load(&self.config.model)
            .await
            .map_err(|e| e.into_tts(Engine::BaseLocal))
    }
}

#[async_trait]
impl SynthesisBackend for XttsBackend {
    fn engine(&self) -> Engine {
        Engine::BaseLocal
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        let voices = XTTS_LANGUAGES
            .iter()
            .flat_map(|(code, language)| {
                [Gender::Male, Gender::Female].into_iter().map(move |gender| {
                    VoiceDescriptor::new(
                        Engine::BaseLocal,
                        format!("xtts_{code}_{}", gender.as_id_part()),
                        format!("XTTS {gender} Voice ({language})"),
                        *language,
                        gender,
                    )
                    .with_description(format!("XTTS neural voice for {language}"))
                })
            })
            .collect();
        Ok(voices)
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        let engine = self.engine();
        let VoiceSelector::Multilingual { language, gender } = request.voice.selector() else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "not an XTTS voice".to_string(),
            });
        };
        if xtts_language_name(language).is_none() {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: format!("unsupported XTTS language '{language}'"),
            });
        }
        let details = json!({ "lang_code": language, "gender": gender.as_id_part() });

        let reference = self.config.reference_audio.for_gender(*gender);
        if !tokio::fs::try_exists(reference).await.unwrap_or(false) {
            return Err(TTSError::local(
                engine,
                SynthesisStage::ReferenceAudio,
                format!("reference audio not found: {}", reference.display()),
            )
            .with_details(details));
        }

        let mut options = Map::new();
        options.insert("temperature".into(), json!(self.config.temperature));
        options.insert(
            "repetition_penalty".into(),
            json!(self.config.repetition_penalty),
        );

        let inference = InferenceRequest {
            model: self.config.model.clone(),
            text: request.text.to_string(),
            language: Some(language.clone()),
            reference_audio: Some(reference.display().to_string()),
            options,
            ..Default::default()
        };

        debug!(voice = request.voice.raw(), text_len = request.text.len(), "XTTS synthesis");
        let audio = self
            .runtime
            .synthesize(&inference)
            .await
            .map_err(|e| e.into_tts(engine).with_details(details.clone()))?;

        self.output
            .write_f32(engine, request.session_id, audio.sample_rate, audio.samples)
            .await
            .map_err(|e| e.with_details(details))
    }

    async fn release(&self) {
        if let Err(e) = self.runtime.unload(&self.config.model).await {
            warn!(error = %e, "Failed to unload XTTS model");
        }
    }
}
