//! Amazon Polly backend.
//!
//! Polly is the default route: any voice id that no local backend claims is
//! treated as a Polly voice name. Audio is requested as raw PCM from the
//! neural engine and wrapped into a WAV file locally.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_polly::Client as PollyClient;
use aws_sdk_polly::config::Builder as PollyConfigBuilder;
use aws_sdk_polly::error::DisplayErrorContext;
use aws_sdk_polly::primitives::ByteStream;
use aws_sdk_polly::types::{Engine as PollyEngine, Gender as PollyGender, OutputFormat, Voice, VoiceId};
use serde_json::json;
use tracing::{debug, error, info};

use super::config::{MAX_TEXT_LENGTH, PollyConfig, polly_language_name};
use crate::core::tts::base::{
    SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError, TTSResult,
};
use crate::core::tts::output::{AudioOutput, pcm16_from_le_bytes};
use crate::core::voice::{Engine, Gender, VoiceDescriptor, VoiceSelector};

const CREDENTIALS_PROVIDER_NAME: &str = "tts-gateway";

pub struct PollyBackend {
    client: PollyClient,
    config: PollyConfig,
    output: AudioOutput,
    request_counter: AtomicU64,
}

impl PollyBackend {
    /// Build the SDK client and wrap it.
    pub async fn connect(config: PollyConfig, output: AudioOutput) -> TTSResult<Self> {
        config
            .validate()
            .map_err(TTSError::InvalidConfiguration)?;
        let client = init_client(&config).await?;

        info!(
            region = %config.region,
            explicit_credentials = config.has_explicit_credentials(),
            sample_rate = config.sample_rate,
            "Amazon Polly client ready"
        );
        Ok(Self::from_client(client, config, output))
    }

    pub fn from_client(client: PollyClient, config: PollyConfig, output: AudioOutput) -> Self {
        Self {
            client,
            config,
            output,
            request_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PollyConfig {
        &self.config
    }

    fn describe(voice: &Voice) -> Option<VoiceDescriptor> {
        if !voice.supported_engines().contains(&PollyEngine::Neural) {
            return None;
        }
        let id = voice.id()?.as_str().to_string();
        let name = voice.name().unwrap_or(&id).to_string();
        let gender = match voice.gender() {
            Some(PollyGender::Male) => Gender::Male,
            _ => Gender::Female,
        };
        let language = voice
            .language_code()
            .and_then(|code| polly_language_name(code.as_str()))
            .map(str::to_string)
            .or_else(|| voice.language_name().map(str::to_string))?;

        Some(
            VoiceDescriptor::new(
                Engine::Cloud,
                id,
                format!("{name} ({} - Neural)", gender.label()),
                language.clone(),
                gender,
            )
            .with_description(format!("Amazon Polly neural voice for {language}")),
        )
    }
}

async fn init_client(config: &PollyConfig) -> TTSResult<PollyClient> {
    let region = Region::new(config.region.clone());

    if config.has_explicit_credentials() {
        let access_key = config
            .aws_access_key_id
            .as_ref()
            .ok_or_else(|| TTSError::InvalidConfiguration("Missing AWS access key".into()))?;
        let secret_key = config
            .aws_secret_access_key
            .as_ref()
            .ok_or_else(|| TTSError::InvalidConfiguration("Missing AWS secret key".into()))?;

        let credentials = Credentials::new(
            access_key,
            secret_key,
            config.aws_session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut builder = PollyConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        return Ok(PollyClient::from_conf(builder.build()));
    }

    // Default credential chain (environment, profile, IAM role).
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    Ok(PollyClient::new(&loader.load().await))
}

#[async_trait]
impl SynthesisBackend for PollyBackend {
    fn engine(&self) -> Engine {
        Engine::Cloud
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        let mut voices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_voices()
                .engine(PollyEngine::Neural)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    error!(error = %DisplayErrorContext(&e), "Polly DescribeVoices failed");
                    TTSError::synthesis(
                        Engine::Cloud,
                        SynthesisStage::Init,
                        format!("DescribeVoices failed: {}", DisplayErrorContext(&e)),
                    )
                })?;

            voices.extend(response.voices().iter().filter_map(Self::describe));

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(count = voices.len(), "Listed Polly neural voices");
        Ok(voices)
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String> {
        let engine = self.engine();
        let VoiceSelector::Cloud { voice } = request.voice.selector() else {
            return Err(TTSError::InvalidVoice {
                voice_id: request.voice.raw().to_string(),
                reason: "not a Polly voice".to_string(),
            });
        };

        let text_len = request.text.chars().count();
        if text_len > MAX_TEXT_LENGTH {
            return Err(TTSError::synthesis(
                engine,
                SynthesisStage::Tokenization,
                format!("Text length {text_len} exceeds maximum {MAX_TEXT_LENGTH} characters"),
            ));
        }

        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            request_id = request_id,
            text_len = text_len,
            voice = %voice,
            "Synthesizing text with Amazon Polly"
        );

        let response = self
            .client
            .synthesize_speech()
            .text(request.text)
            .voice_id(VoiceId::from(voice.as_str()))
            .engine(PollyEngine::Neural)
            .output_format(OutputFormat::Pcm)
            .sample_rate(self.config.sample_rate.to_string())
            .send()
            .await
            .map_err(|e| {
                error!(request_id = request_id, error = %DisplayErrorContext(&e), "Polly API error");
                TTSError::synthesis(
                    engine,
                    SynthesisStage::Inference,
                    format!("Polly API error: {}", DisplayErrorContext(&e)),
                )
                .with_details(json!({ "voice": voice }))
            })?;

        let audio_stream: ByteStream = response.audio_stream;
        let audio_bytes = audio_stream.collect().await.map_err(|e| {
            error!(request_id = request_id, error = %e, "Failed to read audio stream");
            TTSError::synthesis(
                engine,
                SynthesisStage::Inference,
                format!("Failed to read audio stream: {e}"),
            )
        })?;
        let bytes = audio_bytes.into_bytes();

        if bytes.is_empty() {
            return Err(TTSError::synthesis(
                engine,
                SynthesisStage::Inference,
                "Polly returned an empty audio stream",
            ));
        }
        debug!(
            request_id = request_id,
            audio_bytes = bytes.len(),
            "Successfully synthesized audio"
        );

        self.output
            .write_i16(
                engine,
                request.session_id,
                self.config.sample_rate,
                pcm16_from_le_bytes(&bytes),
            )
            .await
    }
}
