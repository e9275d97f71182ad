use crate::core::voice::Gender::{self, Female, Male};

/// A language supported by the Indic Parler checkpoint with its named speakers.
#[derive(Debug, Clone, Copy)]
pub struct IndicLanguage {
    pub name: &'static str,
    pub code: &'static str,
    pub speakers: &'static [(&'static str, Gender)],
}

impl IndicLanguage {
    pub fn speaker(&self, name: &str) -> Option<(&'static str, Gender)> {
        self.speakers
            .iter()
            .find(|(speaker, _)| speaker.eq_ignore_ascii_case(name))
            .copied()
    }
}

const fn lang(
    name: &'static str,
    code: &'static str,
    speakers: &'static [(&'static str, Gender)],
) -> IndicLanguage {
    IndicLanguage {
        name,
        code,
        speakers,
    }
}

pub const INDIC_LANGUAGES: &[IndicLanguage] = &[
    lang("Assamese", "as", &[("Amit", Male), ("Sita", Female)]),
    lang("Bengali", "bn", &[("Arjun", Male), ("Aditi", Female)]),
    lang("Bodo", "brx", &[("Bikram", Male), ("Maya", Female)]),
    lang("Chhattisgarhi", "hne", &[("Bhanu", Male), ("Champa", Female)]),
    lang("Dogri", "doi", &[("Karan", Male)]),
    lang("Gujarati", "gu", &[("Yash", Male), ("Neha", Female)]),
    lang("Hindi", "hi", &[("Rohit", Male), ("Divya", Female)]),
    lang("Kannada", "kn", &[("Suresh", Male), ("Anu", Female)]),
    lang("Malayalam", "ml", &[("Harish", Male), ("Anjali", Female)]),
    lang("Manipuri", "mni", &[("Laishram", Male), ("Ranjit", Male)]),
    lang("Marathi", "mr", &[("Sanjay", Male), ("Sunita", Female)]),
    lang("Nepali", "ne", &[("Amrita", Female)]),
    lang("Odia", "or", &[("Manas", Male), ("Debjani", Female)]),
    lang("Punjabi", "pa", &[("Divjot", Male), ("Gurpreet", Female)]),
    lang("Sanskrit", "sa", &[("Aryan", Male)]),
    lang("Tamil", "ta", &[("Jaya", Female)]),
    lang("Telugu", "te", &[("Prakash", Male), ("Lalitha", Female)]),
];

pub fn indic_language(code: &str) -> Option<&'static IndicLanguage> {
    INDIC_LANGUAGES
        .iter()
        .find(|language| language.code.eq_ignore_ascii_case(code))
}

#[derive(Debug, Clone)]
pub struct IndicConfig {
    pub model: String,
}

impl Default for IndicConfig {
    fn default() -> Self {
        Self {
            model: "ai4bharat/indic-parler-tts".to_string(),
        }
    }
}
