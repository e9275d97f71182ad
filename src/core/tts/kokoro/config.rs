pub const KOKORO_SAMPLE_RATE: u32 = 24_000;

/// Pipeline letter to language display name.
pub const KOKORO_LANGUAGES: &[(char, &str)] = &[
    ('a', "English (US)"),
    ('b', "English (UK)"),
    ('e', "Spanish"),
    ('f', "French"),
    ('h', "Hindi"),
    ('i', "Italian"),
    ('j', "Japanese"),
    ('p', "Portuguese (Brazil)"),
    ('z', "Mandarin Chinese"),
];

/// `(display name, voice code)`; the code's second letter is the gender.
pub const KOKORO_VOICES: &[(&str, &str)] = &[
    ("KOKORO US Adam", "am_adam"),
    ("KOKORO US Alloy", "af_alloy"),
    ("KOKORO US Aoede", "af_aoede"),
    ("KOKORO US Bella", "af_bella"),
    ("KOKORO US Echo", "am_echo"),
    ("KOKORO US Eric", "am_eric"),
    ("KOKORO US Fenrir", "am_fenrir"),
    ("KOKORO US Heart", "af_heart"),
    ("KOKORO US Jessica", "af_jessica"),
    ("KOKORO US Kore", "af_kore"),
    ("KOKORO US Liam", "am_liam"),
    ("KOKORO US Michael", "am_michael"),
    ("KOKORO US Nicole", "af_nicole"),
    ("KOKORO US Nova", "af_nova"),
    ("KOKORO US Onyx", "am_onyx"),
    ("KOKORO US Puck", "am_puck"),
    ("KOKORO US River", "af_river"),
    ("KOKORO US Santa", "am_santa"),
    ("KOKORO US Sarah", "af_sarah"),
    ("KOKORO US Sky", "af_sky"),
    ("KOKORO GB Alice", "bf_alice"),
    ("KOKORO GB Daniel", "bm_daniel"),
    ("KOKORO GB Emma", "bf_emma"),
    ("KOKORO GB Fable", "bm_fable"),
    ("KOKORO GB George", "bm_george"),
    ("KOKORO GB Isabella", "bf_isabella"),
    ("KOKORO GB Lewis", "bm_lewis"),
    ("KOKORO GB Lily", "bf_lily"),
    ("KOKORO JP Alpha", "jf_alpha"),
    ("KOKORO JP Gongitsune", "jf_gongitsune"),
    ("KOKORO JP Kumo", "jm_kumo"),
    ("KOKORO JP Nezumi", "jf_nezumi"),
    ("KOKORO JP Tebukuro", "jf_tebukuro"),
    ("KOKORO HI Alpha", "hf_alpha"),
    ("KOKORO HI Beta", "hf_beta"),
    ("KOKORO HI Omega", "hm_omega"),
    ("KOKORO HI Psi", "hm_psi"),
    ("KOKORO PT Alex", "pm_alex"),
    ("KOKORO PT Dora", "pf_dora"),
    ("KOKORO PT Santa", "pm_santa"),
    ("KOKORO ZH Xiaobei", "zf_xiaobei"),
    ("KOKORO ZH Xiaoni", "zf_xiaoni"),
    ("KOKORO ZH Xiaoxiao", "zf_xiaoxiao"),
    ("KOKORO ZH Xiaoyi", "zf_xiaoyi"),
    ("KOKORO ZH Yunjian", "zm_yunjian"),
    ("KOKORO ZH Yunxi", "zm_yunxi"),
    ("KOKORO ZH Yunxia", "zm_yunxia"),
    ("KOKORO ZH Yunyang", "zm_yunyang"),
    ("KOKORO IT Nicola", "im_nicola"),
    ("KOKORO IT Sara", "if_sara"),
    ("KOKORO FR Siwis", "ff_siwis"),
    ("KOKORO ES Alex", "em_alex"),
    ("KOKORO ES Dora", "ef_dora"),
    ("KOKORO ES Santa", "em_santa"),
];

pub fn kokoro_language_name(code: char) -> Option<&'static str> {
    KOKORO_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone)]
pub struct KokoroConfig {
    pub model: String,
    pub speed: f32,
}

impl Default for KokoroConfig {
    fn default() -> Self {
        Self {
            model: "hexgrad/Kokoro-82M".to_string(),
            speed: 1.0,
        }
    }
}
