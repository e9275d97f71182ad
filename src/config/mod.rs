//! Configuration module for the TTS gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use tts_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

/// Default directory generated audio is written to and served from.
pub const DEFAULT_AUDIO_OUTPUT_DIR: &str = "audio";
/// Default model runtime sidecar address.
pub const DEFAULT_MODEL_RUNTIME_URL: &str = "http://127.0.0.1:8001";
/// Default Google Translate v2 endpoint.
pub const DEFAULT_GOOGLE_TRANSLATE_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Model ids the local runtime loads, one per local engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelsConfig {
    pub xtts: String,
    pub vixtts: String,
    pub kokoro: String,
    pub indic: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            xtts: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            vixtts: "capleaf/viXTTS".to_string(),
            kokoro: "hexgrad/Kokoro-82M".to_string(),
            indic: "ai4bharat/indic-parler-tts".to_string(),
        }
    }
}

/// Retention settings for the generated audio directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupConfig {
    pub max_age_hours: u64,
    pub min_free_space_mb: u64,
    pub interval_minutes: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            min_free_space_mb: 1000,
            interval_minutes: 30,
        }
    }
}

impl CleanupConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours.saturating_mul(3600))
    }

    pub fn min_free_space_bytes(&self) -> u64 {
        self.min_free_space_mb.saturating_mul(1024 * 1024)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Output directory and retention policy
/// - Local model runtime address, model ids and voice cloning references
/// - Recovery and admission control
/// - AWS Polly and Google Translate credentials
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Audio output
    pub audio_output_dir: PathBuf,
    pub cleanup: CleanupConfig,

    // Local engines
    pub model_runtime_url: String,
    pub models: ModelsConfig,
    /// Speaker reference clips used by both XTTS engines
    pub reference_audio_male: PathBuf,
    pub reference_audio_female: PathBuf,
    pub kokoro_speed: f32,

    // Recovery and admission control
    pub recovery_cooldown_seconds: u64,
    /// Concurrent inference calls allowed per backend (0 = unlimited)
    pub max_concurrent_inference: usize,
    /// Sessions untouched for this long are dropped (None = never)
    pub session_idle_ttl_seconds: Option<u64>,

    // AWS Polly
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub aws_region: String,
    pub polly_endpoint_url: Option<String>,
    pub polly_sample_rate: u32,

    // Translation
    pub google_translate_api_key: Option<String>,
    pub google_translate_url: String,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tls: None,
            audio_output_dir: PathBuf::from(DEFAULT_AUDIO_OUTPUT_DIR),
            cleanup: CleanupConfig::default(),
            model_runtime_url: DEFAULT_MODEL_RUNTIME_URL.to_string(),
            models: ModelsConfig::default(),
            reference_audio_male: PathBuf::from("reference_audio/male.wav"),
            reference_audio_female: PathBuf::from("reference_audio/female.wav"),
            kokoro_speed: 1.0,
            recovery_cooldown_seconds: 30,
            max_concurrent_inference: 1,
            session_idle_ttl_seconds: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            aws_region: "us-east-1".to_string(),
            polly_endpoint_url: None,
            polly_sample_rate: 16_000,
            google_translate_api_key: None,
            google_translate_url: DEFAULT_GOOGLE_TRANSLATE_URL.to_string(),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.aws_access_key_id {
            key.zeroize();
        }
        if let Some(ref mut secret) = self.aws_secret_access_key {
            secret.zeroize();
        }
        if let Some(ref mut token) = self.aws_session_token {
            token.zeroize();
        }
        if let Some(ref mut key) = self.google_translate_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded in main.rs, so by now it is part of the process environment.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;

        Ok(config)
    }

    /// Run every validation check against the merged configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_tls(&self.tls)?;
        validation::validate_port(self.port)?;
        validation::validate_cleanup(&self.cleanup)?;
        validation::validate_model_runtime_url(&self.model_runtime_url)?;
        validation::validate_kokoro_speed(self.kokoro_speed)?;
        validation::validate_aws_credentials(
            &self.aws_access_key_id,
            &self.aws_secret_access_key,
            &self.aws_region,
        )?;
        validation::validate_polly_sample_rate(self.polly_sample_rate)?;
        validation::validate_rate_limit(
            self.rate_limit_requests_per_second,
            self.rate_limit_burst_size,
        )?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn recovery_cooldown(&self) -> Duration {
        Duration::from_secs(self.recovery_cooldown_seconds)
    }

    pub fn session_idle_ttl(&self) -> Option<Duration> {
        self.session_idle_ttl_seconds.map(Duration::from_secs)
    }

    /// Check if a Google Translate key is configured
    pub fn has_translation(&self) -> bool {
        self.google_translate_api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:5000");
        assert!(!config.is_tls_enabled());
        assert_eq!(config.audio_output_dir, PathBuf::from("audio"));
        assert_eq!(config.cleanup.max_age(), Duration::from_secs(24 * 3600));
        assert_eq!(config.cleanup.min_free_space_bytes(), 1000 * 1024 * 1024);
        assert_eq!(config.cleanup.interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.recovery_cooldown(), Duration::from_secs(30));
        assert!(config.session_idle_ttl().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_has_translation() {
        let mut config = ServerConfig::default();
        assert!(!config.has_translation());

        config.google_translate_api_key = Some(String::new());
        assert!(!config.has_translation());

        config.google_translate_api_key = Some("key".to_string());
        assert!(config.has_translation());
    }

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("AUDIO_OUTPUT_DIR");
            env::remove_var("MODEL_RUNTIME_URL");
            env::remove_var("KOKORO_SPEED");
            env::remove_var("CLEANUP_MAX_AGE_HOURS");
            env::remove_var("CLEANUP_INTERVAL_MINUTES");
            env::remove_var("AWS_ACCESS_KEY_ID");
            env::remove_var("AWS_SECRET_ACCESS_KEY");
            env::remove_var("AWS_REGION");
            env::remove_var("AWS_REGION_NAME");
            env::remove_var("GOOGLE_TRANSLATE_API_KEY");
            env::remove_var("SESSION_IDLE_TTL_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

audio:
  output_dir: "/tmp/tts-audio"
  cleanup:
    max_age_hours: 6
    interval_minutes: 5

models:
  runtime_url: "http://models:9000"
  kokoro_speed: 1.25
  reference_audio:
    male: "/refs/m.wav"

providers:
  aws_region: "eu-west-1"
  google_translate_api_key: "yaml-gt-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.audio_output_dir, PathBuf::from("/tmp/tts-audio"));
        assert_eq!(config.cleanup.max_age_hours, 6);
        assert_eq!(config.cleanup.interval_minutes, 5);
        assert_eq!(config.cleanup.min_free_space_mb, 1000);
        assert_eq!(config.model_runtime_url, "http://models:9000");
        assert_eq!(config.kokoro_speed, 1.25);
        assert_eq!(config.reference_audio_male, PathBuf::from("/refs/m.wav"));
        assert_eq!(
            config.reference_audio_female,
            PathBuf::from("reference_audio/female.wav")
        );
        assert_eq!(config.aws_region, "eu-west-1");
        assert_eq!(config.google_translate_api_key, Some("yaml-gt-key".to_string()));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"

providers:
  google_translate_api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "7000");
            env::set_var("GOOGLE_TRANSLATE_API_KEY", "env-key");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.google_translate_api_key, Some("yaml-key".to_string()));
        // ENV value survives where YAML is silent
        assert_eq!(config.port, 7000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_invalid_values() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(
            &config_path,
            r#"
audio:
  cleanup:
    interval_minutes: 0
"#,
        )
        .unwrap();

        let err = ServerConfig::from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("interval_minutes"));

        cleanup_env_vars();
    }
}
