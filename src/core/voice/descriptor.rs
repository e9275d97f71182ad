use std::fmt;

use serde::{Deserialize, Serialize};

/// The five synthesis engines the gateway can dispatch to.
///
/// `Cloud` is the default route for any voice id that no local engine claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Amazon Polly neural voices
    Cloud,
    /// XTTS v2 multilingual voice cloning
    BaseLocal,
    /// Vietnamese fine-tuned XTTS
    RegionalLocal,
    /// Kokoro multi-speaker pipelines
    MultiSpeakerLocal,
    /// Indic Parler description-conditioned TTS
    PipelineLocal,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::Cloud,
        Engine::BaseLocal,
        Engine::RegionalLocal,
        Engine::MultiSpeakerLocal,
        Engine::PipelineLocal,
    ];

    /// Stable machine-readable name used in logs and JSON payloads.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::BaseLocal => "base_local",
            Self::RegionalLocal => "regional_local",
            Self::MultiSpeakerLocal => "multi_speaker_local",
            Self::PipelineLocal => "pipeline_local",
        }
    }

    /// Name shown to clients as the top-level catalog key.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cloud => "Polly",
            Self::BaseLocal => "XTTS",
            Self::RegionalLocal => "Vietnamese XTTS",
            Self::MultiSpeakerLocal => "Kokoro",
            Self::PipelineLocal => "Indic Parler",
        }
    }

    /// Literal voice-id prefixes claimed by this engine.
    ///
    /// The cloud engine claims nothing; it receives every unmatched id.
    pub fn voice_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Cloud => &[],
            Self::BaseLocal => &["xtts_"],
            Self::RegionalLocal => &["vi_xtts", "vixtts"],
            Self::MultiSpeakerLocal => &["kokoro_"],
            Self::PipelineLocal => &["indic_"],
        }
    }

    /// Whether the engine runs on the local GPU model runtime.
    #[inline]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Cloud)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Lowercase form used inside voice ids (`xtts_en_female`).
    pub fn as_id_part(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Accepts `male`/`female` in any case as well as the single-letter
    /// `m`/`f` markers used by Kokoro voice codes.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single selectable voice. Unique by `id` within its engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceDescriptor {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub description: String,
    #[serde(rename = "language")]
    pub language_name: String,
    pub engine: Engine,
    pub gender: Gender,
}

impl VoiceDescriptor {
    pub fn new(
        engine: Engine,
        id: impl Into<String>,
        display_name: impl Into<String>,
        language_name: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            language_name: language_name.into(),
            engine,
            gender,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_prefixes_do_not_overlap() {
        let all: Vec<(&str, Engine)> = Engine::ALL
            .iter()
            .flat_map(|engine| engine.voice_prefixes().iter().map(move |p| (*p, *engine)))
            .collect();

        for (a, engine_a) in &all {
            for (b, engine_b) in &all {
                if engine_a != engine_b {
                    assert!(!a.starts_with(b), "{a} overlaps {b}");
                }
            }
        }
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("FEMALE"), Some(Gender::Female));
        assert_eq!(Gender::parse("m"), Some(Gender::Male));
        assert_eq!(Gender::parse("other"), None);
    }

    #[test]
    fn test_descriptor_serializes_client_field_names() {
        let voice = VoiceDescriptor::new(
            Engine::BaseLocal,
            "xtts_en_male",
            "XTTS Male Voice (English)",
            "English",
            Gender::Male,
        );
        let json = serde_json::to_value(&voice).unwrap();

        assert_eq!(json["name"], "XTTS Male Voice (English)");
        assert_eq!(json["language"], "English");
        assert_eq!(json["engine"], "base_local");
        assert_eq!(json["gender"], "Male");
    }
}
