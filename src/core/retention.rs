//! Retention for generated audio.
//!
//! A background task periodically runs a two-pass cleanup over the output
//! directory:
//!
//! 1. delete generated files older than the maximum age;
//! 2. while free space is below the minimum, delete the remaining generated
//!    files oldest first.
//!
//! Only regular files whose names match the generated-audio pattern are ever
//! considered, so nothing else in the directory can be removed.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CleanupConfig;
use crate::core::tts::output::is_generated_audio_name;

/// Free space on the filesystem holding a path.
pub trait DiskSpaceProbe: Send + Sync {
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

pub struct Fs2SpaceProbe;

impl DiskSpaceProbe for Fs2SpaceProbe {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub min_free_space_bytes: u64,
    pub interval: Duration,
}

impl From<&CleanupConfig> for RetentionPolicy {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            max_age: config.max_age(),
            min_free_space_bytes: config.min_free_space_bytes(),
            interval: config.interval(),
        }
    }
}

/// Cumulative totals since startup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionStats {
    pub runs: u64,
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub errors: u64,
    pub last_run: Option<String>,
}

/// Result of one cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub expired_deleted: u64,
    pub space_deleted: u64,
    pub bytes_freed: u64,
    pub errors: u64,
    /// Another pass was already running.
    pub skipped: bool,
}

impl CleanupReport {
    pub fn files_deleted(&self) -> u64 {
        self.expired_deleted + self.space_deleted
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetentionStatus {
    pub running: bool,
    pub directory: String,
    pub max_age_hours: f64,
    pub min_free_space_mb: u64,
    pub interval_minutes: f64,
    pub free_space_bytes: Option<u64>,
    pub stats: RetentionStats,
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

pub struct AudioRetentionManager {
    dir: PathBuf,
    policy: RetentionPolicy,
    probe: Arc<dyn DiskSpaceProbe>,
    pass_lock: Mutex<()>,
    stats: Mutex<RetentionStats>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl AudioRetentionManager {
    pub fn new(dir: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        Self::with_probe(dir, policy, Arc::new(Fs2SpaceProbe))
    }

    pub fn with_probe(
        dir: impl Into<PathBuf>,
        policy: RetentionPolicy,
        probe: Arc<dyn DiskSpaceProbe>,
    ) -> Self {
        Self {
            dir: dir.into(),
            policy,
            probe,
            pass_lock: Mutex::new(()),
            stats: Mutex::new(RetentionStats::default()),
            cancel: Mutex::new(None),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Run one cleanup pass. Blocking; call from a blocking context.
    ///
    /// If a pass is already running this returns immediately with
    /// `skipped` set.
    pub fn run_cleanup(&self) -> CleanupReport {
        let Some(_pass) = self.pass_lock.try_lock() else {
            debug!("Cleanup already running, skipping");
            return CleanupReport {
                skipped: true,
                ..Default::default()
            };
        };

        let mut report = CleanupReport::default();
        let mut candidates = match self.collect_candidates() {
            Ok(candidates) => candidates,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                error!(dir = %self.dir.display(), error = %e, "Failed to scan audio directory");
                report.errors += 1;
                Vec::new()
            }
        };

        // Pass 1: age.
        let now = SystemTime::now();
        candidates.retain(|candidate| {
            let age = now
                .duration_since(candidate.modified)
                .unwrap_or(Duration::ZERO);
            if age < self.policy.max_age {
                return true;
            }
            if self.delete(candidate, &mut report) {
                report.expired_deleted += 1;
            }
            false
        });

        // Pass 2: free space, oldest first.
        match self.probe.available_bytes(&self.dir) {
            Ok(mut available) if available < self.policy.min_free_space_bytes => {
                info!(
                    available_bytes = available,
                    min_free_space_bytes = self.policy.min_free_space_bytes,
                    "Free space below minimum, evicting oldest audio"
                );
                candidates.sort_by_key(|candidate| candidate.modified);
                for candidate in &candidates {
                    if available >= self.policy.min_free_space_bytes {
                        break;
                    }
                    if self.delete(candidate, &mut report) {
                        report.space_deleted += 1;
                    }
                    available = match self.probe.available_bytes(&self.dir) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(error = %e, "Free space probe failed, stopping eviction");
                            report.errors += 1;
                            break;
                        }
                    };
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(error = %e, "Free space probe failed");
                report.errors += 1;
            }
        }

        self.record(&report);
        if report.files_deleted() > 0 || report.errors > 0 {
            info!(
                expired = report.expired_deleted,
                evicted = report.space_deleted,
                bytes_freed = report.bytes_freed,
                errors = report.errors,
                "Audio cleanup finished"
            );
        } else {
            debug!("Audio cleanup finished, nothing to delete");
        }
        report
    }

    fn collect_candidates(&self) -> io::Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_generated_audio_name(name) {
                continue;
            }
            // symlink_metadata so a link named like audio is never followed.
            let path = self.dir.join(name);
            let Ok(metadata) = std::fs::symlink_metadata(&path) else {
                continue;
            };
            if !metadata.file_type().is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            candidates.push(Candidate {
                path,
                size: metadata.len(),
                modified,
            });
        }
        Ok(candidates)
    }

    fn delete(&self, candidate: &Candidate, report: &mut CleanupReport) -> bool {
        match std::fs::remove_file(&candidate.path) {
            Ok(()) => {
                report.bytes_freed += candidate.size;
                debug!(path = %candidate.path.display(), "Deleted audio file");
                true
            }
            // Already gone, e.g. removed by hand between scan and delete.
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(path = %candidate.path.display(), error = %e, "Failed to delete audio file");
                report.errors += 1;
                false
            }
        }
    }

    fn record(&self, report: &CleanupReport) {
        let mut stats = self.stats.lock();
        stats.runs += 1;
        stats.files_deleted += report.files_deleted();
        stats.bytes_freed += report.bytes_freed;
        stats.errors += report.errors;
        stats.last_run = OffsetDateTime::now_utc().format(&Rfc3339).ok();
    }

    pub fn stats(&self) -> RetentionStats {
        self.stats.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.cancel.lock().is_some()
    }

    pub fn status(&self) -> RetentionStatus {
        RetentionStatus {
            running: self.is_running(),
            directory: self.dir.display().to_string(),
            max_age_hours: self.policy.max_age.as_secs_f64() / 3600.0,
            min_free_space_mb: self.policy.min_free_space_bytes / (1024 * 1024),
            interval_minutes: self.policy.interval.as_secs_f64() / 60.0,
            free_space_bytes: self.probe.available_bytes(&self.dir).ok(),
            stats: self.stats(),
        }
    }

    /// Start the periodic cleanup task. The first pass runs immediately.
    ///
    /// Returns `None` if the task is already running.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let token = {
            let mut slot = self.cancel.lock();
            if slot.is_some() {
                return None;
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        let manager = Arc::clone(self);
        let period = self.policy.interval.max(Duration::from_secs(1));
        info!(
            dir = %self.dir.display(),
            interval_secs = period.as_secs(),
            "Audio retention task started"
        );

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let pass = Arc::clone(&manager);
                        if let Err(e) = tokio::task::spawn_blocking(move || pass.run_cleanup()).await {
                            error!(error = %e, "Cleanup task panicked");
                        }
                    }
                }
            }
            info!("Audio retention task stopped");
        }))
    }

    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
    }
}
