//! Initialization helpers for preparing runtime assets before starting the
//! gateway.
//!
//! This module hosts the logic behind the `tts-gateway init` CLI command. The
//! command prepares the audio output directory, checks the voice cloning
//! reference clips and asks the model runtime to load every configured local
//! model, so the first request after a regular startup does not pay for
//! model loading.
//!
//! ```text
//! $ MODEL_RUNTIME_URL=http://127.0.0.1:8001 tts-gateway init
//! ```

use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::tts::BackendSettings;
use crate::core::tts::runtime::{HttpModelRuntime, ModelRuntime};
use crate::state::prepare_output_dir;

/// Prepare directories and preload every local model on the runtime.
///
/// Fails on the first model the runtime cannot load.
pub async fn run(config: &ServerConfig) -> Result<()> {
    prepare_output_dir(&config.audio_output_dir).map_err(|e| anyhow!(e.to_string()))?;

    for reference in [&config.reference_audio_male, &config.reference_audio_female] {
        if !reference.exists() {
            warn!(
                path = %reference.display(),
                "Reference audio missing, XTTS voices will fail until it is provided"
            );
        }
    }

    let runtime =
        HttpModelRuntime::new(&config.model_runtime_url).map_err(|e| anyhow!(e.to_string()))?;
    let settings = BackendSettings::from_config(config);

    for (engine, model) in settings.local_models() {
        info!(engine = %engine, model, "Loading model");
        runtime
            .load(model)
            .await
            .map_err(|e| anyhow!("Failed to load {model} for {engine}: {e}"))?;
    }

    info!("All local models loaded");
    Ok(())
}
