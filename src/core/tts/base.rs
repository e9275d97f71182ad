use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::voice::{Engine, VoiceDescriptor, VoiceIdentifier};

/// Phase of a synthesis call in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStage {
    Init,
    Tokenization,
    ReferenceAudio,
    Inference,
    Save,
}

impl SynthesisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Tokenization => "tokenization",
            Self::ReferenceAudio => "reference_audio",
            Self::Inference => "inference",
            Self::Save => "save",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "init" => Some(Self::Init),
            "tokenization" => Some(Self::Tokenization),
            "reference_audio" => Some(Self::ReferenceAudio),
            "inference" => Some(Self::Inference),
            "save" => Some(Self::Save),
            _ => None,
        }
    }
}

impl fmt::Display for SynthesisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substrings that mark an accelerator memory or driver fault in an
/// unstructured error message.
const EXHAUSTION_MARKERS: &[&str] = &[
    "cuda",
    "gpu",
    "out of memory",
    "device-side assert",
    "cudnn",
    "cublas",
];

/// Keyword fallback for collaborators that only return free-form text.
pub fn looks_like_resource_exhaustion(message: &str) -> bool {
    let lowered = message.to_lowercase();
    EXHAUSTION_MARKERS.iter().any(|m| lowered.contains(m))
}

#[derive(Debug, Error)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid voice '{voice_id}': {reason}")]
    InvalidVoice { voice_id: String, reason: String },

    #[error("{engine} synthesis failed during {stage}: {message}")]
    Synthesis {
        engine: Engine,
        stage: SynthesisStage,
        message: String,
        details: Value,
        resource_exhausted: bool,
    },
}

impl TTSError {
    /// Synthesis failure from a free-form message.
    ///
    /// The exhaustion flag is derived from the message text once, here; callers
    /// downstream only look at the flag.
    pub fn synthesis(engine: Engine, stage: SynthesisStage, message: impl Into<String>) -> Self {
        let message = message.into();
        let resource_exhausted = looks_like_resource_exhaustion(&message);
        Self::Synthesis {
            engine,
            stage,
            message,
            details: Value::Null,
            resource_exhausted,
        }
    }

    /// Failure raised by the gateway itself, such as a missing file or a
    /// failed write. Never counts as resource exhaustion, whatever the
    /// message says.
    pub fn local(engine: Engine, stage: SynthesisStage, message: impl Into<String>) -> Self {
        Self::synthesis_flagged(engine, stage, message, false)
    }

    /// Synthesis failure whose exhaustion status is already known.
    pub fn synthesis_flagged(
        engine: Engine,
        stage: SynthesisStage,
        message: impl Into<String>,
        resource_exhausted: bool,
    ) -> Self {
        Self::Synthesis {
            engine,
            stage,
            message: message.into(),
            details: Value::Null,
            resource_exhausted,
        }
    }

    pub fn with_details(mut self, extra: Value) -> Self {
        if let Self::Synthesis { details, .. } = &mut self {
            *details = extra;
        }
        self
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            Self::Synthesis {
                resource_exhausted: true,
                ..
            }
        )
    }

    pub fn engine(&self) -> Option<Engine> {
        match self {
            Self::Synthesis { engine, .. } => Some(*engine),
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<SynthesisStage> {
        match self {
            Self::Synthesis { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type TTSResult<T> = Result<T, TTSError>;

/// One synthesis call. The text has already been dequeued and translated.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub voice: &'a VoiceIdentifier,
    pub session_id: &'a str,
}

/// A text-to-speech engine behind the gateway.
///
/// `synthesize` writes a WAV file into the audio output directory and returns
/// its bare filename.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    fn engine(&self) -> Engine;

    /// Literal voice-id prefixes this backend answers for.
    fn voice_prefixes(&self) -> &'static [&'static str] {
        self.engine().voice_prefixes()
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>>;

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> TTSResult<String>;

    /// Free model or accelerator memory before the backend is replaced.
    async fn release(&self) {}
}

pub type SharedBackend = Arc<dyn SynthesisBackend>;

/// Stand-in for a backend whose construction failed.
///
/// It lists no voices and fails every synthesis at the `init` stage, so the
/// recovery path can rebuild it on the next request.
pub struct UnavailableBackend {
    engine: Engine,
    reason: String,
}

impl UnavailableBackend {
    pub fn new(engine: Engine, reason: impl Into<String>) -> Self {
        Self {
            engine,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SynthesisBackend for UnavailableBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn list_voices(&self) -> TTSResult<Vec<VoiceDescriptor>> {
        Ok(Vec::new())
    }

    async fn synthesize(&self, _request: SynthesisRequest<'_>) -> TTSResult<String> {
        Err(TTSError::synthesis_flagged(
            self.engine,
            SynthesisStage::Init,
            format!("backend failed to initialize: {}", self.reason),
            true,
        ))
    }
}
