use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::config::{INDIC_LANGUAGES, IndicConfig, indic_language};
use crate::core::tts::base::{SynthesisBackend, SynthesisRequest, TTSError, TTSResult};
use crate::core::tts::output::AudioOutput;
use crate::core::tts::runtime::{InferenceRequest, ModelRuntime};
use crate::core::voice::{Engine, VoiceDescriptor, VoiceSelector};

/// Description prompt that conditions Parler on a named speaker.
pub fn speaker_description(speaker: &str) -> String {
    format!(
        "{speaker} delivers a slightly expressive and animated speech with a moderate speed \
         and pitch. The recording is of very high quality, with the speaker's voice sounding \
         clear and very close up."
    )
}

pub struct IndicBackend {
    config: IndicConfig,
    runtime: Arc<dyn ModelRuntime>,
    output: AudioOutput,
}

impl IndicBackend {
    pub fn new(config: IndicConfig, runtime: Arc<dyn ModelRuntime>, output: AudioOutput) -> Self {
        Self {
            config,
            runtime,
            output,
        }
    }

    pub async fn load(&self) -> TTSResult<()> {
        self.runtime
            .load(&self.config.model)
            .await
            .map_err(|e| e.into_tts(Engine::PipelineLocal))
    }
}

#[async_trait]
impl SynthesisBackend for IndicBackend {
    fn engine(&self) -> Engine {
        Engine::PipelineLocal
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        let voices = INDIC_LANGUAGES
            .iter()
            .flat_map(|language| {
                language.speakers.iter().map(move |(speaker, gender)| {
                    VoiceDescriptor::new(
                        Engine::PipelineLocal,
                        format!("indic_{}_{}", language.code, speaker.to_ascii_lowercase()),
                        format!("{speaker} ({})", language.name),
                        language.name,
                        *gender,
                    )
                    .with_description(format!("Indic Parler TTS neural voice for {}", language.name))
                })
            })
            .collect();
        Ok(voices)
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        let engine = self.engine();
        let VoiceSelector::Pipeline {
            language_code,
            speaker,
        } = request.voice.selector()
        else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "not an Indic Parler voice".to_string(),
            });
        };

        let Some(language) = indic_language(language_code) else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: format!("unsupported language code '{language_code}'"),
            });
        };
        let Some((speaker_name, _)) = language.speaker(speaker) else {
            let available: Vec<&str> = language.speakers.iter().map(|(s, _)| *s).collect();
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: format!(
                    "voice '{speaker}' not found for {}; available: {}",
                    language.name,
                    available.join(", ")
                ),
            });
        };

        let inference = InferenceRequest {
            model: self.config.model.clone(),
            text: request.text.to_string(),
            language: Some(language.code.to_string()),
            voice: Some(speaker_name.to_string()),
            description: Some(speaker_description(speaker_name)),
            ..Default::default()
        };

        debug!(language = language.name, speaker = speaker_name, "Indic Parler synthesis");
        let audio = self.runtime.synthesize(&inference).await.map_err(|e| {
            e.into_tts(engine)
                .with_details(json!({ "language": language.name, "voice": speaker_name }))
        })?;

        self.output
            .write_f32(engine, request.session_id, audio.sample_rate, audio.samples)
            .await
    }

    async fn release(&self) {
        if let Err(e) = self.runtime.unload(&self.config.model).await {
            warn!(error = %e, "Failed to unload Indic Parler model");
        }
    }
}
