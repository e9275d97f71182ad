//! Kokoro multi-speaker backend.
//!
//! One pipeline per language; the first letter of a voice code (`af_heart`)
//! names the pipeline, the second its speaker gender.

mod config;
mod provider;

pub use config::{KOKORO_LANGUAGES, KOKORO_SAMPLE_RATE, KOKORO_VOICES, KokoroConfig, kokoro_language_name};
pub use provider::KokoroBackend;
