pub mod recovery;
pub mod retention;
pub mod service;
pub mod session;
pub mod translate;
pub mod tts;
pub mod voice;

// Re-export commonly used types for convenience
pub use recovery::{BackendFactory, BackendHealth, BackendStatus, RecoveryCoordinator, RecoveryOutcome};
pub use retention::{AudioRetentionManager, RetentionPolicy, RetentionStats, RetentionStatus};
pub use service::{GenerateOutcome, GenerateRequest, GeneratedAudio, ServiceOptions, TtsService};
pub use session::SessionQueue;
pub use translate::{Translation, TranslationError, Translator};
pub use tts::{
    BackendRouter, SharedBackend, SynthesisBackend, SynthesisRequest, SynthesisStage, TTSError,
    TTSResult,
};
pub use voice::{Engine, VoiceCatalog, VoiceDescriptor, VoiceIdentifier};
