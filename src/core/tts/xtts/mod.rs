//! XTTS v2 multilingual backend.
//!
//! Clones one of two configured reference speakers into any of the supported
//! languages. Inference runs on the local model runtime.

mod config;
mod provider;

pub use config::{ReferenceAudio, XTTS_LANGUAGES, XTTS_SAMPLE_RATE, XttsConfig, xtts_language_name};
pub use provider::XttsBackend;
