use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///   tls:
///     enabled: true
///     cert_path: "/etc/tls/cert.pem"
///     key_path: "/etc/tls/key.pem"
///
/// audio:
///   output_dir: "audio"
///   cleanup:
///     max_age_hours: 24
///     min_free_space_mb: 1000
///     interval_minutes: 30
///
/// models:
///   runtime_url: "http://127.0.0.1:8001"
///   xtts: "tts_models/multilingual/multi-dataset/xtts_v2"
///   vixtts: "capleaf/viXTTS"
///   kokoro: "hexgrad/Kokoro-82M"
///   indic: "ai4bharat/indic-parler-tts"
///   kokoro_speed: 1.0
///   reference_audio:
///     male: "reference_audio/male.wav"
///     female: "reference_audio/female.wav"
///
/// runtime:
///   recovery_cooldown_seconds: 30
///   max_concurrent_inference: 1
///   session_idle_ttl_seconds: 3600
///
/// providers:
///   aws_access_key_id: "AKIA..."
///   aws_secret_access_key: "..."
///   aws_region: "us-east-1"
///   polly_sample_rate: 16000
///   google_translate_api_key: "..."
///
/// security:
///   cors_allowed_origins: "*"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub audio: Option<AudioYaml>,
    pub models: Option<ModelsYaml>,
    pub runtime: Option<RuntimeYaml>,
    pub providers: Option<ProvidersYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Output directory and retention from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub output_dir: Option<String>,
    pub cleanup: Option<CleanupYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CleanupYaml {
    pub max_age_hours: Option<u64>,
    pub min_free_space_mb: Option<u64>,
    pub interval_minutes: Option<u64>,
}

/// Local model runtime settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ModelsYaml {
    pub runtime_url: Option<String>,
    pub xtts: Option<String>,
    pub vixtts: Option<String>,
    pub kokoro: Option<String>,
    pub indic: Option<String>,
    pub kokoro_speed: Option<f32>,
    pub reference_audio: Option<ReferenceAudioYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReferenceAudioYaml {
    pub male: Option<String>,
    pub female: Option<String>,
}

/// Recovery, admission control and session expiry from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeYaml {
    pub recovery_cooldown_seconds: Option<u64>,
    pub max_concurrent_inference: Option<usize>,
    pub session_idle_ttl_seconds: Option<u64>,
}

/// Provider credentials from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub aws_region: Option<String>,
    pub polly_endpoint_url: Option<String>,
    pub polly_sample_rate: Option<u32>,
    pub google_translate_api_key: Option<String>,
    pub google_translate_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  tls:
    enabled: true
    cert_path: "/c.pem"
    key_path: "/k.pem"

audio:
  output_dir: "/var/tts"
  cleanup:
    max_age_hours: 12
    min_free_space_mb: 500
    interval_minutes: 10

models:
  runtime_url: "http://runtime:8001"
  kokoro: "custom/kokoro"
  kokoro_speed: 0.9
  reference_audio:
    male: "/m.wav"
    female: "/f.wav"

runtime:
  recovery_cooldown_seconds: 5
  max_concurrent_inference: 2
  session_idle_ttl_seconds: 600

providers:
  aws_region: "ap-south-1"
  polly_sample_rate: 8000
  google_translate_api_key: "gt"

security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 100
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.tls.as_ref().unwrap().enabled, Some(true));

        let audio = config.audio.as_ref().unwrap();
        assert_eq!(audio.output_dir, Some("/var/tts".to_string()));
        assert_eq!(audio.cleanup.as_ref().unwrap().min_free_space_mb, Some(500));

        let models = config.models.as_ref().unwrap();
        assert_eq!(models.kokoro, Some("custom/kokoro".to_string()));
        assert!(models.xtts.is_none());
        assert_eq!(
            models.reference_audio.as_ref().unwrap().female,
            Some("/f.wav".to_string())
        );

        let runtime = config.runtime.as_ref().unwrap();
        assert_eq!(runtime.max_concurrent_inference, Some(2));
        assert_eq!(runtime.session_idle_ttl_seconds, Some(600));

        let providers = config.providers.as_ref().unwrap();
        assert_eq!(providers.polly_sample_rate, Some(8000));
        assert_eq!(
            config.security.as_ref().unwrap().cors_allowed_origins,
            Some("*".to_string())
        );
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
server:
  port: 9000
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.as_ref().unwrap().host.is_none());
        assert_eq!(config.server.as_ref().unwrap().port, Some(9000));
        assert!(config.audio.is_none());
        assert!(config.providers.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("").unwrap_or_default();
        assert!(config.server.is_none());
        assert!(config.models.is_none());
    }

    #[test]
    fn test_yaml_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "audio:\n  output_dir: \"out\"\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(
            config.audio.unwrap().output_dir,
            Some("out".to_string())
        );
    }
}
