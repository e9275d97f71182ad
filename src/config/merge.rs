use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Build the final configuration: defaults, then environment, then YAML.
pub fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::env_layer()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) | None if tls.cert_path.is_some() || tls.key_path.is_some() => {
                    let cert_path = tls
                        .cert_path
                        .ok_or("server.tls.cert_path is required when TLS is enabled")?;
                    let key_path = tls
                        .key_path
                        .ok_or("server.tls.key_path is required when TLS is enabled")?;
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert_path),
                        key_path: PathBuf::from(key_path),
                    });
                }
                Some(true) => {
                    return Err("server.tls.enabled is true but no certificate is configured".into());
                }
                None => {}
            }
        }
    }

    if let Some(audio) = yaml.audio {
        if let Some(dir) = audio.output_dir {
            config.audio_output_dir = PathBuf::from(dir);
        }
        if let Some(cleanup) = audio.cleanup {
            if let Some(hours) = cleanup.max_age_hours {
                config.cleanup.max_age_hours = hours;
            }
            if let Some(mb) = cleanup.min_free_space_mb {
                config.cleanup.min_free_space_mb = mb;
            }
            if let Some(minutes) = cleanup.interval_minutes {
                config.cleanup.interval_minutes = minutes;
            }
        }
    }

    if let Some(models) = yaml.models {
        if let Some(url) = models.runtime_url {
            config.model_runtime_url = url;
        }
        if let Some(model) = models.xtts {
            config.models.xtts = model;
        }
        if let Some(model) = models.vixtts {
            config.models.vixtts = model;
        }
        if let Some(model) = models.kokoro {
            config.models.kokoro = model;
        }
        if let Some(model) = models.indic {
            config.models.indic = model;
        }
        if let Some(speed) = models.kokoro_speed {
            config.kokoro_speed = speed;
        }
        if let Some(reference) = models.reference_audio {
            if let Some(male) = reference.male {
                config.reference_audio_male = PathBuf::from(male);
            }
            if let Some(female) = reference.female {
                config.reference_audio_female = PathBuf::from(female);
            }
        }
    }

    if let Some(runtime) = yaml.runtime {
        if let Some(seconds) = runtime.recovery_cooldown_seconds {
            config.recovery_cooldown_seconds = seconds;
        }
        if let Some(limit) = runtime.max_concurrent_inference {
            config.max_concurrent_inference = limit;
        }
        if let Some(seconds) = runtime.session_idle_ttl_seconds {
            config.session_idle_ttl_seconds = Some(seconds);
        }
    }

    if let Some(providers) = yaml.providers {
        if providers.aws_access_key_id.is_some() {
            config.aws_access_key_id = providers.aws_access_key_id;
        }
        if providers.aws_secret_access_key.is_some() {
            config.aws_secret_access_key = providers.aws_secret_access_key;
        }
        if providers.aws_session_token.is_some() {
            config.aws_session_token = providers.aws_session_token;
        }
        if let Some(region) = providers.aws_region {
            config.aws_region = region;
        }
        if providers.polly_endpoint_url.is_some() {
            config.polly_endpoint_url = providers.polly_endpoint_url;
        }
        if let Some(rate) = providers.polly_sample_rate {
            config.polly_sample_rate = rate;
        }
        if providers.google_translate_api_key.is_some() {
            config.google_translate_api_key = providers.google_translate_api_key;
        }
        if let Some(url) = providers.google_translate_url {
            config.google_translate_url = url;
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::super::yaml::{RuntimeYaml, ServerYaml, TlsYaml};
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_merge_without_yaml_is_env_layer() {
        let config = merge_config(None).unwrap();
        assert_eq!(config.rate_limit_burst_size, 10);
    }

    #[test]
    #[serial]
    fn test_merge_runtime_section() {
        let yaml = YamlConfig {
            runtime: Some(RuntimeYaml {
                recovery_cooldown_seconds: Some(3),
                max_concurrent_inference: Some(0),
                session_idle_ttl_seconds: Some(60),
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.recovery_cooldown_seconds, 3);
        assert_eq!(config.max_concurrent_inference, 0);
        assert_eq!(config.session_idle_ttl_seconds, Some(60));
    }

    #[test]
    #[serial]
    fn test_merge_tls_section() {
        let yaml = YamlConfig {
            server: Some(ServerYaml {
                tls: Some(TlsYaml {
                    enabled: None,
                    cert_path: Some("/c.pem".to_string()),
                    key_path: Some("/k.pem".to_string()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = merge_config(Some(yaml)).unwrap();
        let tls = config.tls.as_ref().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/c.pem"));

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                tls: Some(TlsYaml {
                    enabled: Some(true),
                    cert_path: None,
                    key_path: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(merge_config(Some(yaml)).is_err());
    }
}
