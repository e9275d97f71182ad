use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::config::{KOKORO_VOICES, KokoroConfig, kokoro_language_name};
use crate::core::tts::base::{SynthesisBackend, SynthesisRequest, TTSError, TTSResult};
use crate::core::tts::output::AudioOutput;
use crate::core::tts::runtime::{InferenceRequest, ModelRuntime};
use crate::core::voice::{Engine, Gender, VoiceDescriptor, VoiceSelector};

pub struct KokoroBackend {
    config: KokoroConfig,
    runtime: Arc<dyn ModelRuntime>,
    output: AudioOutput,
}

impl KokoroBackend {
    pub fn new(config: KokoroConfig, runtime: Arc<dyn ModelRuntime>, output: AudioOutput) -> Self {
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
            .map_err(|e| e.into_tts(Engine::MultiSpeakerLocal))
    }
}

fn voice_gender(code: &str) -> Gender {
    code.chars()
        .nth(1)
        .and_then(|c| Gender::parse(&c.to_string()))
        .unwrap_or(Gender::Female)
}

#[async_trait]
impl SynthesisBackend for KokoroBackend {
    fn engine(&self) -> Engine {
        Engine::MultiSpeakerLocal
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        let voices = KOKORO_VOICES
            .iter()
            .filter_map(|(name, code)| {
                let language = code.chars().next().and_then(kokoro_language_name)?;
                Some(
                    VoiceDescriptor::new(
                        Engine::MultiSpeakerLocal,
                        format!("kokoro_{code}"),
                        *name,
                        language,
                        voice_gender(code),
                    )
                    .with_description(format!("Kokoro neural voice for {language}")),
                )
            })
            .collect();
        Ok(voices)
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        let engine = self.engine();
        let VoiceSelector::MultiSpeaker { voice_code } = request.voice.selector() else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "not a Kokoro voice".to_string(),
            });
        };

        let Some(pipeline) = voice_code.chars().next().filter(|c| kokoro_language_name(*c).is_some())
        else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "no Kokoro pipeline for this language".to_string(),
            });
        };
        if !KOKORO_VOICES.iter().any(|(_, code)| *code == voice_code.as_str()) {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: format!("unknown Kokoro voice '{voice_code}'"),
            });
        }

        let inference = InferenceRequest {
            model: self.config.model.clone(),
            text: request.text.to_string(),
            language: Some(pipeline.to_string()),
            voice: Some(voice_code.clone()),
            speed: Some(self.config.speed),
            ..Default::default()
        };

        debug!(voice = %voice_code, pipeline = %pipeline, "Kokoro synthesis");
        let audio = self.runtime.synthesize(&inference).await.map_err(|e| {
            e.into_tts(engine)
                .with_details(json!({ "voice": voice_code, "language_code": pipeline.to_string() }))
        })?;

        self.output
            .write_f32(engine, request.session_id, audio.sample_rate, audio.samples)
            .await
    }

    async fn release(&self) {
        if let Err(e) = self.runtime.unload(&self.config.model).await {
            warn!(error = %e, "Failed to unload Kokoro model");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::testing::RecordingRuntime;
    use crate::core::voice::VoiceIdentifier;
    use tempfile::TempDir;

    fn backend(dir: &TempDir, runtime: Arc<RecordingRuntime>) -> KokoroBackend {
        KokoroBackend::new(
            KokoroConfig {
                speed: 1.2,
                ..Default::default()
            },
            runtime,
            AudioOutput::new(dir.path()),
        )
    }

    #[tokio::test]
    async fn test_list_voices_uses_pipeline_language() {
        let dir = TempDir::new().unwrap();
        let voices = backend(&dir, RecordingRuntime::new()).list_voices().await.unwrap();

        assert_eq!(voices.len(), KOKORO_VOICES.len());
        let heart = voices.iter().find(|v| v.id == "kokoro_af_heart").unwrap();
        assert_eq!(heart.language_name, "English (US)");
        assert_eq!(heart.gender, Gender::Female);
        let kumo = voices.iter().find(|v| v.id == "kokoro_jm_kumo").unwrap();
        assert_eq!(kumo.language_name, "Japanese");
        assert_eq!(kumo.gender, Gender::Male);
    }

    #[tokio::test]
    async fn test_synthesize_selects_pipeline_and_speed() {
        let dir = TempDir::new().unwrap();
        let runtime = RecordingRuntime::new();
        let backend = backend(&dir, runtime.clone());
        let voice = VoiceIdentifier::parse("kokoro_bf_emma", Engine::MultiSpeakerLocal).unwrap();

        backend
            .synthesize(SynthesisRequest {
                text: "Cheerio.",
                voice: &voice,
                session_id: "uk",
            })
            .await
            .unwrap();

        let sent = runtime.last_request().unwrap();
        assert_eq!(sent.language.as_deref(), Some("b"));
        assert_eq!(sent.voice.as_deref(), Some("bf_emma"));
        assert_eq!(sent.speed, Some(1.2));
    }

    #[tokio::test]
    async fn test_unknown_voice_rejected_before_inference() {
        let dir = TempDir::new().unwrap();
        let runtime = RecordingRuntime::new();
        let backend = backend(&dir, runtime.clone());

        for id in ["kokoro_qf_nobody", "kokoro_af_nobody"] {
            let voice = VoiceIdentifier::parse(id, Engine::MultiSpeakerLocal).unwrap();
            let err = backend
                .synthesize(SynthesisRequest {
                    text: "x",
                    voice: &voice,
                    session_id: "s",
                })
                .await
                .unwrap_err();
            assert!(matches!(err, TTSError::InvalidVoice { .. }));
        }
        assert!(runtime.requests.lock().is_empty());
    }
}
