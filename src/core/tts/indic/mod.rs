//! Indic Parler backend.
//!
//! Parler TTS is conditioned on a natural-language description of the
//! speaker, so a voice is a `(language, speaker name)` pair rendered into a
//! description prompt.

mod config;
mod provider;

pub use config::{INDIC_LANGUAGES, IndicConfig, IndicLanguage, indic_language};
pub use provider::{IndicBackend, speaker_description};
