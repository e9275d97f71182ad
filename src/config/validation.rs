use super::{CleanupConfig, TlsConfig};

/// TLS files must exist when TLS is configured.
pub fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}

pub fn validate_port(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if port == 0 {
        return Err("PORT must be greater than 0".into());
    }
    Ok(())
}

pub fn validate_cleanup(cleanup: &CleanupConfig) -> Result<(), Box<dyn std::error::Error>> {
    if cleanup.interval_minutes == 0 {
        return Err("cleanup interval_minutes must be greater than 0".into());
    }
    if cleanup.max_age_hours == 0 {
        return Err("cleanup max_age_hours must be greater than 0".into());
    }
    if cleanup.max_age_hours.checked_mul(3600).is_none() {
        return Err(format!("cleanup max_age_hours {} is too large", cleanup.max_age_hours).into());
    }
    if cleanup.interval_minutes.checked_mul(60).is_none() {
        return Err(format!(
            "cleanup interval_minutes {} is too large",
            cleanup.interval_minutes
        )
        .into());
    }
    if cleanup.min_free_space_mb.checked_mul(1024 * 1024).is_none() {
        return Err(format!(
            "cleanup min_free_space_mb {} is too large",
            cleanup.min_free_space_mb
        )
        .into());
    }
    Ok(())
}

pub fn validate_model_runtime_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed =
        url::Url::parse(url).map_err(|e| format!("Invalid MODEL_RUNTIME_URL '{url}': {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("MODEL_RUNTIME_URL must use http or https, got '{url}'").into());
    }
    Ok(())
}

pub fn validate_kokoro_speed(speed: f32) -> Result<(), Box<dyn std::error::Error>> {
    if !speed.is_finite() || speed <= 0.0 || speed > 4.0 {
        return Err(format!("KOKORO_SPEED must be in (0, 4], got {speed}").into());
    }
    Ok(())
}

/// Explicit AWS keys are all-or-nothing; without them the SDK provider chain is used.
pub fn validate_aws_credentials(
    access_key_id: &Option<String>,
    secret_access_key: &Option<String>,
    region: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match (access_key_id, secret_access_key) {
        (Some(_), None) => {
            return Err("AWS_ACCESS_KEY_ID is set but AWS_SECRET_ACCESS_KEY is missing".into());
        }
        (None, Some(_)) => {
            return Err("AWS_SECRET_ACCESS_KEY is set but AWS_ACCESS_KEY_ID is missing".into());
        }
        _ => {}
    }
    if region.trim().is_empty() {
        return Err("AWS region must not be empty".into());
    }
    Ok(())
}

pub fn validate_polly_sample_rate(rate: u32) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(rate, 8_000 | 16_000) {
        return Err(format!("POLLY_SAMPLE_RATE must be 8000 or 16000, got {rate}").into());
    }
    Ok(())
}

pub fn validate_rate_limit(rps: u32, burst: u32) -> Result<(), Box<dyn std::error::Error>> {
    if rps == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than 0".into());
    }
    if burst == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be greater than 0".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_tls() {
        assert!(validate_tls(&None).is_ok());

        let missing = Some(TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        });
        assert!(validate_tls(&missing).is_err());

        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "cert").unwrap();
        std::fs::write(&key, "key").unwrap();
        let present = Some(TlsConfig {
            cert_path: cert,
            key_path: key,
        });
        assert!(validate_tls(&present).is_ok());
    }

    #[test]
    fn test_validate_cleanup() {
        assert!(validate_cleanup(&CleanupConfig::default()).is_ok());
        let zero_interval = CleanupConfig {
            interval_minutes: 0,
            ..Default::default()
        };
        assert!(validate_cleanup(&zero_interval).is_err());

        let huge_age = CleanupConfig {
            max_age_hours: u64::MAX / 1000,
            ..Default::default()
        };
        assert!(validate_cleanup(&huge_age).is_err());

        let huge_space = CleanupConfig {
            min_free_space_mb: u64::MAX / 1024,
            ..Default::default()
        };
        assert!(validate_cleanup(&huge_space).is_err());
        // Accessors saturate instead of overflowing.
        assert_eq!(huge_space.min_free_space_bytes(), u64::MAX);
    }

    #[test]
    fn test_validate_model_runtime_url() {
        assert!(validate_model_runtime_url("http://127.0.0.1:8001").is_ok());
        assert!(validate_model_runtime_url("ftp://runtime").is_err());
        assert!(validate_model_runtime_url("not a url").is_err());
    }

    #[test]
    fn test_validate_kokoro_speed() {
        assert!(validate_kokoro_speed(1.0).is_ok());
        assert!(validate_kokoro_speed(0.0).is_err());
        assert!(validate_kokoro_speed(f32::NAN).is_err());
        assert!(validate_kokoro_speed(5.0).is_err());
    }

    #[test]
    fn test_validate_aws_credentials() {
        assert!(validate_aws_credentials(&None, &None, "us-east-1").is_ok());
        assert!(
            validate_aws_credentials(&Some("a".into()), &Some("b".into()), "us-east-1").is_ok()
        );
        assert!(validate_aws_credentials(&Some("a".into()), &None, "us-east-1").is_err());
        assert!(validate_aws_credentials(&None, &Some("b".into()), "us-east-1").is_err());
        assert!(validate_aws_credentials(&None, &None, " ").is_err());
    }

    #[test]
    fn test_validate_polly_sample_rate_and_rate_limit() {
        assert!(validate_polly_sample_rate(16_000).is_ok());
        assert!(validate_polly_sample_rate(22_050).is_err());
        assert!(validate_rate_limit(60, 10).is_ok());
        assert!(validate_rate_limit(0, 10).is_err());
    }
}
