//! Tests for the Amazon Polly backend.
//!
//! The SDK is pointed at a wiremock server through `endpoint_url`, so no AWS
//! account is needed.

use super::*;
use crate::core::tts::base::{SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError};
use crate::core::tts::output::AudioOutput;
use crate::core::voice::{Engine, Gender, VoiceIdentifier};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(endpoint: &str) -> PollyConfig {
    PollyConfig {
        region: "us-east-1".to_string(),
        aws_access_key_id: Some("AKIDTEST".to_string()),
        aws_secret_access_key: Some("secret".to_string()),
        endpoint_url: Some(endpoint.to_string()),
        ..Default::default()
    }
}

async fn backend(server: &MockServer, dir: &TempDir) -> PollyBackend {
    PollyBackend::connect(test_config(&server.uri()), AudioOutput::new(dir.path()))
        .await
        .unwrap()
}

fn voice_json(id: &str, gender: &str, code: &str, language: &str, engines: &[&str]) -> serde_json::Value {
    json!({
        "Id": id,
        "Name": id,
        "Gender": gender,
        "LanguageCode": code,
        "LanguageName": language,
        "SupportedEngines": engines,
    })
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_default_config_is_valid() {
    let config = PollyConfig::default();
    assert_eq!(config.region, DEFAULT_REGION);
    assert_eq!(config.sample_rate, POLLY_SAMPLE_RATE);
    assert!(config.validate().is_ok());
    assert!(!config.has_explicit_credentials());
}

#[test]
fn test_invalid_sample_rate_rejected() {
    let config = PollyConfig {
        sample_rate: 22_050,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.contains("22050"));
}

#[test]
fn test_half_configured_credentials_rejected() {
    let config = PollyConfig {
        aws_access_key_id: Some("AKID".to_string()),
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_language_name_table() {
    assert_eq!(polly_language_name("en-US"), Some("Polly English (US)"));
    assert_eq!(polly_language_name("cy-GB"), Some("Polly Welsh"));
    assert_eq!(polly_language_name("xx-XX"), None);
}

#[tokio::test]
async fn test_connect_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = PollyConfig {
        sample_rate: 44_100,
        ..Default::default()
    };
    let result = PollyBackend::connect(config, AudioOutput::new(dir.path())).await;
    assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
}

// =============================================================================
// Voice listing
// =============================================================================

#[tokio::test]
async fn test_list_voices_keeps_neural_voices_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Voices": [
                voice_json("Joanna", "Female", "en-US", "US English", &["neural", "standard"]),
                voice_json("Matthew", "Male", "en-US", "US English", &["neural"]),
                voice_json("Ivy", "Female", "en-US", "US English", &["standard"]),
                voice_json("Zeina", "Female", "zz-ZZ", "Imaginary", &["neural"]),
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let voices = backend(&server, &dir).await.list_voices().await.unwrap();

    assert_eq!(voices.len(), 3);
    let matthew = voices.iter().find(|v| v.id == "Matthew").unwrap();
    assert_eq!(matthew.display_name, "Matthew (Male - Neural)");
    assert_eq!(matthew.language_name, "Polly English (US)");
    assert_eq!(matthew.gender, Gender::Male);
    assert_eq!(matthew.engine, Engine::Cloud);
    assert!(voices.iter().all(|v| v.id != "Ivy"));
    // Unknown language codes fall back to the service-provided name.
    let zeina = voices.iter().find(|v| v.id == "Zeina").unwrap();
    assert_eq!(zeina.language_name, "Imaginary");
}

#[tokio::test]
async fn test_list_voices_surfaces_service_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "InvalidNextTokenException",
            "message": "bad token"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = backend(&server, &dir).await.list_voices().await.unwrap_err();
    assert_eq!(err.engine(), Some(Engine::Cloud));
}

// =============================================================================
// Synthesis
// =============================================================================

#[tokio::test]
async fn test_synthesize_writes_wav_from_pcm() {
    let server = MockServer::start().await;
    let pcm: Vec<u8> = [0i16, 1000, -1000, 32767]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    Mock::given(method("POST"))
        .and(path("/v1/speech"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "audio/pcm")
                .set_body_bytes(pcm),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend(&server, &dir).await;
    let voice = VoiceIdentifier::parse("Joanna", Engine::Cloud).unwrap();

    let filename = backend
        .synthesize(SynthesisRequest {
            text: "Hello from Polly.",
            voice: &voice,
            session_id: "polly-1",
        })
        .await
        .unwrap();

    assert!(filename.starts_with("realtime_polly-1_"));
    let reader = hound::WavReader::open(dir.path().join(&filename)).unwrap();
    assert_eq!(reader.spec().sample_rate, POLLY_SAMPLE_RATE);
    assert_eq!(reader.len(), 4);
}

#[tokio::test]
async fn test_synthesize_rejects_overlong_text_before_calling_polly() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let backend = backend(&server, &dir).await;
    let voice = VoiceIdentifier::parse("Joanna", Engine::Cloud).unwrap();
    let text = "a".repeat(MAX_TEXT_LENGTH + 1);

    let err = backend
        .synthesize(SynthesisRequest {
            text: &text,
            voice: &voice,
            session_id: "s",
        })
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(SynthesisStage::Tokenization));
    assert!(!err.is_resource_exhausted());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_synthesize_rejects_local_voice_selector() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let backend = backend(&server, &dir).await;
    let voice = VoiceIdentifier::parse("xtts_en_male", Engine::BaseLocal).unwrap();

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
