use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::retention::{AudioRetentionManager, RetentionPolicy};
use crate::core::service::TtsService;
use crate::core::tts::{TTSError, TTSResult};

/// Application state shared by every handler.
pub struct AppState {
    pub config: ServerConfig,
    pub service: TtsService,
    pub retention: Arc<AudioRetentionManager>,
    /// Cancelled on shutdown; stops the background tasks.
    pub shutdown_token: CancellationToken,
}

impl AppState {
    /// Prepare the output directory, build every backend and load the catalog.
    pub async fn new(config: ServerConfig) -> TTSResult<Arc<Self>> {
        prepare_output_dir(&config.audio_output_dir)?;

        let service = TtsService::initialize(&config).await?;
        let retention = Arc::new(AudioRetentionManager::new(
            config.audio_output_dir.clone(),
            RetentionPolicy::from(&config.cleanup),
        ));

        Ok(Self::from_parts(config, service, retention))
    }

    pub fn from_parts(
        config: ServerConfig,
        service: TtsService,
        retention: Arc<AudioRetentionManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            service,
            retention,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Start retention and, when configured, idle-session eviction.
    pub fn start_background_tasks(&self) {
        if self.retention.start().is_none() {
            warn!("Audio retention task already running");
        }
        if let Some(ttl) = self.config.session_idle_ttl() {
            self.service
                .spawn_session_sweeper(ttl, self.shutdown_token.child_token());
        }
    }

    pub fn shutdown(&self) {
        info!("Stopping background tasks");
        self.retention.stop();
        self.shutdown_token.cancel();
    }
}

/// Create the output directory and confirm it accepts writes.
pub fn prepare_output_dir(dir: &Path) -> TTSResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        TTSError::InvalidConfiguration(format!(
            "Cannot create audio output directory {}: {e}",
            dir.display()
        ))
    })?;

    let probe = dir.join(".write_probe");
    std::fs::write(&probe, b"ok")
        .and_then(|_| std::fs::remove_file(&probe))
        .map_err(|e| {
            TTSError::InvalidConfiguration(format!(
                "Audio output directory {} is not writable: {e}",
                dir.display()
            ))
        })?;

    info!(dir = %dir.display(), "Audio output directory ready");
    Ok(())
}
