use std::path::{Path, PathBuf};

use crate::core::voice::Gender;

/// Native output rate of XTTS v2.
pub const XTTS_SAMPLE_RATE: u32 = 24_000;

/// Language codes accepted by XTTS v2 and their display names.
pub const XTTS_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("cs", "Czech"),
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("hu", "Hungarian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("tr", "Turkish"),
    ("zh-cn", "Chinese"),
];

pub fn xtts_language_name(code: &str) -> Option<&'static str> {
    XTTS_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Speaker reference clips used for voice cloning, one per gender.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAudio {
    pub male: PathBuf,
    pub female: PathBuf,
}

impl ReferenceAudio {
    pub fn for_gender(&self, gender: Gender) -> &Path {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
}

impl Default for ReferenceAudio {
    fn default() -> Self {
        Self {
            male: PathBuf::from("reference_audio/male.wav"),
            female: PathBuf::from("reference_audio/female.wav"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XttsConfig {
    /// Model id understood by the model runtime.
    pub model: String,
    pub reference_audio: ReferenceAudio,
    pub temperature: f64,
    pub repetition_penalty: f64,
}

impl Default for XttsConfig {
    fn default() -> Self {
        Self {
            model: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            reference_audio: ReferenceAudio::default(),
            temperature: 0.75,
            repetition_penalty: 5.0,
        }
    }
}
