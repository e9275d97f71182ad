use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};

/// Read a variable, treating empty values as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} value '{raw}': {e}").into()),
        None => Ok(None),
    }
}

fn parse_bool(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match var(name) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("Invalid {name} value '{raw}': expected a boolean").into()),
        },
        None => Ok(None),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// The result is validated before it is returned.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::env_layer()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the environment, without validation.
    pub(super) fn env_layer() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var("PORT")? {
            config.port = port;
        }

        let tls_enabled = parse_bool("TLS_ENABLED")?.unwrap_or(false);
        if tls_enabled {
            let cert_path = var("TLS_CERT_PATH")
                .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
            let key_path =
                var("TLS_KEY_PATH").ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;
            config.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert_path),
                key_path: PathBuf::from(key_path),
            });
        }

        if let Some(dir) = var("AUDIO_OUTPUT_DIR") {
            config.audio_output_dir = PathBuf::from(dir);
        }
        if let Some(hours) = parse_var("CLEANUP_MAX_AGE_HOURS")? {
            config.cleanup.max_age_hours = hours;
        }
        if let Some(mb) = parse_var("CLEANUP_MIN_FREE_SPACE_MB")? {
            config.cleanup.min_free_space_mb = mb;
        }
        if let Some(minutes) = parse_var("CLEANUP_INTERVAL_MINUTES")? {
            config.cleanup.interval_minutes = minutes;
        }

        if let Some(url) = var("MODEL_RUNTIME_URL") {
            config.model_runtime_url = url;
        }
        if let Some(model) = var("XTTS_MODEL") {
            config.models.xtts = model;
        }
        if let Some(model) = var("VIXTTS_MODEL") {
            config.models.vixtts = model;
        }
        if let Some(model) = var("KOKORO_MODEL") {
            config.models.kokoro = model;
        }
        if let Some(model) = var("INDIC_MODEL") {
            config.models.indic = model;
        }
        if let Some(path) = var("REFERENCE_AUDIO_MALE") {
            config.reference_audio_male = PathBuf::from(path);
        }
        if let Some(path) = var("REFERENCE_AUDIO_FEMALE") {
            config.reference_audio_female = PathBuf::from(path);
        }
        if let Some(speed) = parse_var("KOKORO_SPEED")? {
            config.kokoro_speed = speed;
        }

        if let Some(seconds) = parse_var("RECOVERY_COOLDOWN_SECONDS")? {
            config.recovery_cooldown_seconds = seconds;
        }
        if let Some(limit) = parse_var("MAX_CONCURRENT_INFERENCE")? {
            config.max_concurrent_inference = limit;
        }
        if let Some(seconds) = parse_var("SESSION_IDLE_TTL_SECONDS")? {
            config.session_idle_ttl_seconds = Some(seconds);
        }

        config.aws_access_key_id = var("AWS_ACCESS_KEY_ID");
        config.aws_secret_access_key = var("AWS_SECRET_ACCESS_KEY");
        config.aws_session_token = var("AWS_SESSION_TOKEN");
        // AWS_REGION_NAME is the boto-style name some deployments still export.
        if let Some(region) = var("AWS_REGION").or_else(|| var("AWS_REGION_NAME")) {
            config.aws_region = region;
        }
        config.polly_endpoint_url = var("POLLY_ENDPOINT_URL");
        if let Some(rate) = parse_var("POLLY_SAMPLE_RATE")? {
            config.polly_sample_rate = rate;
        }

        config.google_translate_api_key = var("GOOGLE_TRANSLATE_API_KEY");
        if let Some(url) = var("GOOGLE_TRANSLATE_URL") {
            config.google_translate_url = url;
        }

        config.cors_allowed_origins = var("CORS_ALLOWED_ORIGINS");
        if let Some(rps) = parse_var("RATE_LIMIT_REQUESTS_PER_SECOND")? {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = parse_var("RATE_LIMIT_BURST_SIZE")? {
            config.rate_limit_burst_size = burst;
        }

        Ok(config)
    }
}
