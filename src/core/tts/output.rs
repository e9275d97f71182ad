//! Generated audio files.
//!
//! Every backend writes its result through [`AudioOutput`], which owns the
//! naming scheme `realtime_<session>_<timestamp>.wav`. The retention manager
//! relies on the same pattern to decide which files it may delete.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use time::OffsetDateTime;
use tracing::debug;

use super::base::{SynthesisStage, TTSError, TTSResult};
use crate::core::voice::Engine;

pub const GENERATED_PREFIX: &str = "realtime_";
pub const GENERATED_EXTENSION: &str = "wav";

static GENERATED_AUDIO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^realtime_[A-Za-z0-9_-]+_\d+\.wav$").expect("generated audio pattern is valid")
});

static LAST_TICK: AtomicU64 = AtomicU64::new(0);

/// Whether `name` is a file this gateway produced.
pub fn is_generated_audio_name(name: &str) -> bool {
    GENERATED_AUDIO_PATTERN.is_match(name)
}

/// Reduce a caller session id to characters that are safe inside a filename.
pub fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "session".to_string()
    } else {
        cleaned
    }
}

/// 100ns ticks since the Unix epoch, strictly increasing within the process.
fn next_tick() -> u64 {
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 100).max(0) as u64;
    let mut prev = LAST_TICK.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(prev + 1);
        match LAST_TICK.compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(actual) => prev = actual,
        }
    }
}

pub fn generated_filename(session_id: &str) -> String {
    format!(
        "{GENERATED_PREFIX}{}_{}.{GENERATED_EXTENSION}",
        sanitize_session_id(session_id),
        next_tick()
    )
}

/// Writer for the shared audio output directory.
#[derive(Debug, Clone)]
pub struct AudioOutput {
    dir: PathBuf,
}

impl AudioOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Write mono float samples in `[-1.0, 1.0]` as 16-bit PCM.
    pub async fn write_f32(
        &self,
        engine: Engine,
        session_id: &str,
        sample_rate: u32,
        samples: Vec<f32>,
    ) -> TTSResult<String> {
        let pcm = samples
            .into_iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();
        self.write_i16(engine, session_id, sample_rate, pcm).await
    }

    /// Write mono 16-bit PCM samples.
    pub async fn write_i16(
        &self,
        engine: Engine,
        session_id: &str,
        sample_rate: u32,
        samples: Vec<i16>,
    ) -> TTSResult<String> {
        if sample_rate == 0 {
            return Err(TTSError::local(
                engine,
                SynthesisStage::Save,
                "sample rate must be positive",
            ));
        }

        let filename = generated_filename(session_id);
        let final_path = self.dir.join(&filename);
        // Partial files never match the generated pattern.
        let partial_path = self.dir.join(format!(".{filename}.part"));

        let written = tokio::task::spawn_blocking(move || -> Result<usize, String> {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let result = (|| -> Result<(), String> {
                let mut writer = hound::WavWriter::create(&partial_path, spec)
                    .map_err(|e| format!("failed to create {}: {e}", partial_path.display()))?;
                for sample in &samples {
                    writer
                        .write_sample(*sample)
                        .map_err(|e| format!("failed to write samples: {e}"))?;
                }
                writer
                    .finalize()
                    .map_err(|e| format!("failed to finalize wav: {e}"))?;
                std::fs::rename(&partial_path, &final_path)
                    .map_err(|e| format!("failed to publish {}: {e}", final_path.display()))
            })();
            if result.is_err() {
                let _ = std::fs::remove_file(&partial_path);
            }
            result.map(|_| samples.len())
        })
        .await
        .map_err(|e| {
            TTSError::local(engine, SynthesisStage::Save, format!("writer task failed: {e}"))
        })?
        .map_err(|e| TTSError::local(engine, SynthesisStage::Save, e))?;

        debug!(engine = %engine, file = %filename, samples = written, "Audio file written");
        Ok(filename)
    }
}

/// Decode little-endian 16-bit PCM bytes.
pub fn pcm16_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
