use crate::core::tts::{TTSError, TTSResult};

use super::{Engine, Gender};

/// Engine-specific fields extracted from a voice id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelector {
    /// Provider voice name passed through verbatim (`Joanna`).
    Cloud { voice: String },
    /// `xtts_<language>_<gender>`
    Multilingual { language: String, gender: Gender },
    /// `vi_xtts_<gender>` or `vixtts_<gender>`
    Regional { gender: Gender },
    /// `kokoro_<voice code>`; the code's first letter selects the language pipeline.
    MultiSpeaker { voice_code: String },
    /// `indic_<language code>_<speaker>`
    Pipeline {
        language_code: String,
        speaker: String,
    },
}

/// A voice id parsed once at the edge of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceIdentifier {
    raw: String,
    engine: Engine,
    selector: VoiceSelector,
}

impl VoiceIdentifier {
    /// Parse `raw` with the grammar of `engine`.
    ///
    /// The engine comes from prefix routing; this only validates the shape.
    pub fn parse(raw: &str, engine: Engine) -> TTSResult<Self> {
        let selector = match engine {
            Engine::Cloud => parse_cloud(raw)?,
            Engine::BaseLocal => parse_multilingual(raw)?,
            Engine::RegionalLocal => parse_regional(raw)?,
            Engine::MultiSpeakerLocal => parse_multi_speaker(raw)?,
            Engine::PipelineLocal => parse_pipeline(raw)?,
        };

        Ok(Self {
            raw: raw.to_string(),
            engine,
            selector,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn selector(&self) -> &VoiceSelector {
        &self.selector
    }
}

fn invalid(raw: &str, reason: impl Into<String>) -> TTSError {
    TTSError::InvalidVoice {
        voice_id: raw.to_string(),
        reason: reason.into(),
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_cloud(raw: &str) -> TTSResult<VoiceSelector> {
    if raw.is_empty() || !raw.chars().all(is_token_char) {
        return Err(invalid(raw, "expected a provider voice name"));
    }
    Ok(VoiceSelector::Cloud {
        voice: raw.to_string(),
    })
}

fn parse_multilingual(raw: &str) -> TTSResult<VoiceSelector> {
    let rest = raw
        .strip_prefix("xtts_")
        .ok_or_else(|| invalid(raw, "expected xtts_<language>_<gender>"))?;

    // Language codes may contain '-' (zh-cn) but never '_'.
    let (language, gender) = rest
        .split_once('_')
        .ok_or_else(|| invalid(raw, "expected xtts_<language>_<gender>"))?;

    if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid(raw, "language code is empty or malformed"));
    }
    let gender = Gender::parse(gender)
        .filter(|_| gender.len() > 1)
        .ok_or_else(|| invalid(raw, "gender must be 'male' or 'female'"))?;

    Ok(VoiceSelector::Multilingual {
        language: language.to_ascii_lowercase(),
        gender,
    })
}

fn parse_regional(raw: &str) -> TTSResult<VoiceSelector> {
    let rest = raw
        .strip_prefix("vi_xtts")
        .or_else(|| raw.strip_prefix("vixtts"))
        .ok_or_else(|| invalid(raw, "expected vi_xtts_<gender>"))?;

    let gender = rest
        .strip_prefix('_')
        .and_then(|g| if g.len() > 1 { Gender::parse(g) } else { None })
        .ok_or_else(|| invalid(raw, "expected vi_xtts_male or vi_xtts_female"))?;

    Ok(VoiceSelector::Regional { gender })
}

fn parse_multi_speaker(raw: &str) -> TTSResult<VoiceSelector> {
    let code = raw
        .strip_prefix("kokoro_")
        .ok_or_else(|| invalid(raw, "expected kokoro_<voice code>"))?;

    let mut chars = code.chars();
    let well_formed = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && code.len() > 1
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(invalid(raw, "voice code is empty or malformed"));
    }

    Ok(VoiceSelector::MultiSpeaker {
        voice_code: code.to_string(),
    })
}

fn parse_pipeline(raw: &str) -> TTSResult<VoiceSelector> {
    let rest = raw
        .strip_prefix("indic_")
        .ok_or_else(|| invalid(raw, "expected indic_<language code>_<speaker>"))?;

    let (language_code, speaker) = rest
        .split_once('_')
        .ok_or_else(|| invalid(raw, "expected indic_<language code>_<speaker>"))?;

    if language_code.is_empty() || !language_code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(raw, "language code is empty or malformed"));
    }
    if speaker.is_empty() || !speaker.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(raw, "speaker name is empty or malformed"));
    }

    Ok(VoiceSelector::Pipeline {
        language_code: language_code.to_ascii_lowercase(),
        speaker: speaker.to_ascii_lowercase(),
    })
}
