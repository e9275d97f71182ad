//! Configuration types for the Amazon Polly backend.
//!
//! The gateway always uses the neural engine with raw PCM output, which it
//! wraps into WAV itself. What remains configurable is the region, the
//! credentials and the PCM sample rate.

/// Default PCM sample rate requested from Polly.
pub const POLLY_SAMPLE_RATE: u32 = 16_000;

/// Sample rates Polly accepts for PCM output.
pub const PCM_SAMPLE_RATES: &[u32] = &[8_000, 16_000];

/// Maximum billed characters per SynthesizeSpeech request.
pub const MAX_TEXT_LENGTH: usize = 3_000;

/// Default AWS region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// Language names
// =============================================================================

/// Polly language code to the display name used as the catalog language key.
pub const POLLY_LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("arb", "Polly Arabic"),
    ("ar-AE", "Polly Arabic (Gulf)"),
    ("ca-ES", "Polly Catalan"),
    ("yue-CN", "Polly Chinese (Cantonese)"),
    ("cmn-CN", "Polly Chinese (Mandarin)"),
    ("cs-CZ", "Polly Czech"),
    ("da-DK", "Polly Danish"),
    ("nl-BE", "Polly Dutch (Belgian)"),
    ("nl-NL", "Polly Dutch"),
    ("en-AU", "Polly English (Australian)"),
    ("en-GB", "Polly English (British)"),
    ("en-IN", "Polly English (Indian)"),
    ("en-NZ", "Polly English (New Zealand)"),
    ("en-ZA", "Polly English (South African)"),
    ("en-US", "Polly English (US)"),
    ("en-GB-WLS", "Polly English (Welsh)"),
    ("fi-FI", "Polly Finnish"),
    ("fr-FR", "Polly French"),
    ("fr-BE", "Polly French (Belgian)"),
    ("fr-CA", "Polly French (Canadian)"),
    ("hi-IN", "Polly Hindi"),
    ("de-DE", "Polly German"),
    ("de-AT", "Polly German (Austrian)"),
    ("de-CH", "Polly German (Swiss standard)"),
    ("is-IS", "Polly Icelandic"),
    ("it-IT", "Polly Italian"),
    ("ja-JP", "Polly Japanese"),
    ("ko-KR", "Polly Korean"),
    ("nb-NO", "Polly Norwegian"),
    ("pl-PL", "Polly Polish"),
    ("pt-BR", "Polly Portuguese (Brazilian)"),
    ("pt-PT", "Polly Portuguese (European)"),
    ("ro-RO", "Polly Romanian"),
    ("ru-RU", "Polly Russian"),
    ("es-ES", "Polly Spanish (Spain)"),
    ("es-MX", "Polly Spanish (Mexican)"),
    ("es-US", "Polly Spanish (US)"),
    ("sv-SE", "Polly Swedish"),
    ("tr-TR", "Polly Turkish"),
    ("cy-GB", "Polly Welsh"),
];

pub fn polly_language_name(code: &str) -> Option<&'static str> {
    POLLY_LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

// =============================================================================
// Backend configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct PollyConfig {
    pub region: String,
    /// Explicit credentials; when absent the default AWS provider chain is used.
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub sample_rate: u32,
    /// Endpoint override (LocalStack, tests).
    pub endpoint_url: Option<String>,
}

impl Default for PollyConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            sample_rate: POLLY_SAMPLE_RATE,
            endpoint_url: None,
        }
    }
}

impl PollyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !PCM_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(format!(
                "Sample rate {} is not supported for pcm output. Supported rates: {:?}",
                self.sample_rate, PCM_SAMPLE_RATES
            ));
        }
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(
                "AWS access key id and secret access key must be configured together".to_string(),
            );
        }
        if self.region.trim().is_empty() {
            return Err("AWS region must not be empty".to_string());
        }
        Ok(())
    }

    /// Check if explicit AWS credentials are provided.
    pub fn has_explicit_credentials(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }
}
