use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, json};
use tracing::{debug, warn};

use crate::core::tts::base::{
    SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError, TTSResult,
};
use crate::core::tts::output::AudioOutput;
use crate::core::tts::runtime::{InferenceRequest, ModelRuntime};
use crate::core::tts::xtts::ReferenceAudio;
use crate::core::voice::{Engine, Gender, VoiceDescriptor, VoiceSelector};

pub const VIXTTS_LANGUAGE: &str = "vi";

/// Sampling parameters tuned for the Vietnamese checkpoint.
#[derive(Debug, Clone)]
pub struct ViXttsConfig {
    pub model: String,
    pub reference_audio: ReferenceAudio,
    pub temperature: f64,
    pub length_penalty: f64,
    pub repetition_penalty: f64,
    pub top_k: u32,
    pub top_p: f64,
}

impl Default for ViXttsConfig {
    fn default() -> Self {
        Self {
            model: "capleaf/viXTTS".to_string(),
            reference_audio: ReferenceAudio::default(),
            temperature: 0.3,
            length_penalty: 1.0,
            repetition_penalty: 10.0,
            top_k: 30,
            top_p: 0.85,
        }
    }
}

pub struct ViXttsBackend {
    config: ViXttsConfig,
    runtime: Arc<dyn ModelRuntime>,
    output: AudioOutput,
}

impl ViXttsBackend {
    pub fn new(config: ViXttsConfig, runtime: Arc<dyn ModelRuntime>, output: AudioOutput) -> Self {
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
            .map_err(|e| e.into_tts(Engine::RegionalLocal))
    }

    fn options(&self) -> Map<String, serde_json::Value> {
        let mut options = Map::new();
        options.insert("temperature".into(), json!(self.config.temperature));
        options.insert("length_penalty".into(), json!(self.config.length_penalty));
        options.insert(
            "repetition_penalty".into(),
            json!(self.config.repetition_penalty),
        );
        options.insert("top_k".into(), json!(self.config.top_k));
        options.insert("top_p".into(), json!(self.config.top_p));
        options
    }
}

#[async_trait]
impl SynthesisBackend for ViXttsBackend {
    fn engine(&self) -> Engine {
        Engine::RegionalLocal
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        Ok([Gender::Female, Gender::Male]
            .into_iter()
            .map(|gender| {
                VoiceDescriptor::new(
                    Engine::RegionalLocal,
                    format!("vi_xtts_{}", gender.as_id_part()),
                    format!("Vietnamese XTTS {gender}"),
                    "Vietnamese",
                    gender,
                )
                .with_description("Vietnamese XTTS neural voice")
            })
            .collect())
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        let engine = self.engine();
        let VoiceSelector::Regional { gender } = request.voice.selector() else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "not a Vietnamese XTTS voice".to_string(),
            });
        };
        let details = json!({ "gender": gender.as_id_part() });

        let reference = self.config.reference_audio.for_gender(*gender);
        if !tokio::fs::try_exists(reference).await.unwrap_or(false) {
            return Err(TTSError::local(
                engine,
                SynthesisStage::ReferenceAudio,
                format!("reference audio not found: {}", reference.display()),
            )
            .with_details(details));
        }

        let inference = InferenceRequest {
            model: self.config.model.clone(),
            text: request.text.to_string(),
            language: Some(VIXTTS_LANGUAGE.to_string()),
            reference_audio: Some(reference.display().to_string()),
            options: self.options(),
            ..Default::default()
        };

        debug!(voice = request.voice.raw(), "Vietnamese XTTS synthesis");
        let audio = self
            .runtime
            .synthesize(&inference)
            .await
            .map_err(|e| e.into_tts(engine).with_details(details.clone()))?;

        self.output
            .write_f32(engine, request.session_id, audio.sample_rate, audio.samples)
            .await
    }

    async fn release(&self) {
        if let Err(e) = self.runtime.unload(&self.config.model).await {
            warn!(error = %e, "Failed to unload Vietnamese XTTS model");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::testing::RecordingRuntime;
    use crate::core::voice::VoiceIdentifier;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_synthesize_uses_vietnamese_sampling() {
        let dir = TempDir::new().unwrap();
        let male = dir.path().join("male.wav");
        std::fs::write(&male, b"RIFF").unwrap();
        let runtime = RecordingRuntime::new();
        let backend = ViXttsBackend::new(
            ViXttsConfig {
                reference_audio: ReferenceAudio {
                    male,
                    female: dir.path().join("female.wav"),
                },
                ..Default::default()
            },
            runtime.clone(),
            AudioOutput::new(dir.path()),
        );
        let voice = VoiceIdentifier::parse("vixtts_male", Engine::RegionalLocal).unwrap();

        let filename = backend
            .synthesize(SynthesisRequest {
                text: "Xin chào",
                voice: &voice,
                session_id: "viet",
            })
            .await
            .unwrap();

        assert!(filename.starts_with("realtime_viet_"));
        let sent = runtime.last_request().unwrap();
        assert_eq!(sent.language.as_deref(), Some("vi"));
        assert_eq!(sent.options["top_k"], json!(30));
        assert_eq!(sent.options["repetition_penalty"], json!(10.0));
    }

    #[tokio::test]
    async fn test_lists_both_genders() {
        let dir = TempDir::new().unwrap();
        let backend = ViXttsBackend::new(
            ViXttsConfig::default(),
            RecordingRuntime::new(),
            AudioOutput::new(dir.path()),
        );
        let ids: Vec<String> = backend
            .list_voices()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["vi_xtts_female", "vi_xtts_male"]);
    }
}
