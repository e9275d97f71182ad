//! Serialized reinitialization of failing backends.
//!
//! When a backend reports resource exhaustion the coordinator releases it,
//! builds a fresh instance through a [`BackendFactory`], swaps it into the
//! router and refreshes that engine's catalog entries. At most one attempt
//! runs per engine, and attempts are spaced by a cooldown so a burst of
//! failing requests cannot trigger a rebuild storm.
//!
//! Per engine:
//!
//! ```text
//! Healthy -> RecoveryPending -> Recovering -> Healthy | Degraded
//! ```
//!
//! `Degraded` engines keep serving requests and are retried on the next
//! failure once the cooldown has passed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

use crate::core::tts::{BackendRouter, SharedBackend, TTSResult, UnavailableBackend};
use crate::core::voice::{Engine, VoiceCatalog};

/// Builds a fresh backend instance for an engine.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn build(&self, engine: Engine) -> TTSResult<SharedBackend>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendHealth {
    #[default]
    Healthy,
    RecoveryPending,
    Recovering,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Recovered,
    /// Another attempt for the same engine is running.
    InProgress,
    CoolingDown,
    Failed(String),
}

impl RecoveryOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryOutcome::Recovered)
    }
}

#[derive(Debug, Default)]
struct RecoveryState {
    in_progress: bool,
    last_attempt: Option<Instant>,
    last_attempt_at: Option<OffsetDateTime>,
    health: BackendHealth,
    last_error: Option<String>,
    attempts: u64,
}

/// Point-in-time view of one engine's recovery state.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub engine: Engine,
    pub health: BackendHealth,
    pub recovering: bool,
    pub attempts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Settles the state when an attempt ends, including when the attempt's
/// future is dropped part way through.
struct AttemptGuard {
    state: Arc<Mutex<RecoveryState>>,
    error: Option<String>,
    succeeded: bool,
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_progress = false;
        state.last_attempt = Some(Instant::now());
        state.last_attempt_at = Some(OffsetDateTime::now_utc());
        if self.succeeded {
            state.health = BackendHealth::Healthy;
            state.last_error = None;
        } else {
            state.health = BackendHealth::Degraded;
            state.last_error = Some(
                self.error
                    .take()
                    .unwrap_or_else(|| "recovery interrupted".to_string()),
            );
        }
    }
}

pub struct RecoveryCoordinator {
    router: Arc<BackendRouter>,
    catalog: Arc<VoiceCatalog>,
    factory: Arc<dyn BackendFactory>,
    cooldown: Duration,
    states: DashMap<Engine, Arc<Mutex<RecoveryState>>>,
}

impl RecoveryCoordinator {
    pub fn new(
        router: Arc<BackendRouter>,
        catalog: Arc<VoiceCatalog>,
        factory: Arc<dyn BackendFactory>,
        cooldown: Duration,
    ) -> Self {
        Self {
            router,
            catalog,
            factory,
            cooldown,
            states: DashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn state(&self, engine: Engine) -> Arc<Mutex<RecoveryState>> {
        self.states.entry(engine).or_default().clone()
    }

    /// Record a failure that qualifies for recovery.
    pub fn mark_failure(&self, engine: Engine, message: &str) {
        let state = self.state(engine);
        let mut state = state.lock();
        if !state.in_progress {
            state.health = BackendHealth::RecoveryPending;
        }
        state.last_error = Some(message.to_string());
    }

    /// Attempt one recovery respecting the cooldown.
    ///
    /// Returns `true` only when a fresh backend was installed by this call.
    pub async fn try_recover(&self, engine: Engine) -> bool {
        self.attempt(engine, false).await.is_recovered()
    }

    pub async fn attempt(&self, engine: Engine, bypass_cooldown: bool) -> RecoveryOutcome {
        let state = self.state(engine);
        {
            let mut guard = state.lock();
            if guard.in_progress {
                return RecoveryOutcome::InProgress;
            }
            if !bypass_cooldown
                && guard
                    .last_attempt
                    .is_some_and(|last| last.elapsed() < self.cooldown)
            {
                // A failure reported during the cooldown leaves the old
                // backend serving; report it as degraded until the next attempt.
                if guard.health == BackendHealth::RecoveryPending {
                    guard.health = BackendHealth::Degraded;
                }
                return RecoveryOutcome::CoolingDown;
            }
            guard.in_progress = true;
            guard.health = BackendHealth::Recovering;
            guard.attempts += 1;
        }

        let mut attempt = AttemptGuard {
            state,
            error: None,
            succeeded: false,
        };
        warn!(engine = %engine, "Reinitializing backend");

        if let Some(previous) = self.router.backend(engine) {
            previous.release().await;
        }

        match self.factory.build(engine).await {
            Ok(backend) => {
                self.router.replace(backend.clone());
                self.catalog.refresh_engine(&backend).await;
                attempt.succeeded = true;
                info!(engine = %engine, "Backend recovered");
                RecoveryOutcome::Recovered
            }
            Err(e) => {
                let message = e.to_string();
                error!(engine = %engine, error = %message, "Backend recovery failed");
                // The released instance is unusable; keep the route alive with a
                // placeholder that asks for recovery again on its next use.
                let placeholder: SharedBackend =
                    Arc::new(UnavailableBackend::new(engine, message.clone()));
                self.router.replace(placeholder.clone());
                self.catalog.refresh_engine(&placeholder).await;
                attempt.error = Some(message.clone());
                RecoveryOutcome::Failed(message)
            }
        }
    }

    /// Rebuild every registered engine regardless of cooldown, then rebuild
    /// the catalog from the resulting backends.
    pub async fn force_recover_all(&self) -> Vec<(Engine, RecoveryOutcome)> {
        let engines = self.router.engines();
        let outcomes = join_all(engines.iter().map(|engine| async move {
            (*engine, self.attempt(*engine, true).await)
        }))
        .await;

        self.catalog.refresh(&self.router.backends()).await;
        outcomes
    }

    pub fn health(&self, engine: Engine) -> BackendHealth {
        self.states
            .get(&engine)
            .map(|state| state.lock().health)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<BackendStatus> {
        self.router
            .engines()
            .into_iter()
            .map(|engine| {
                let state = self.state(engine);
                let state = state.lock();
                BackendStatus {
                    engine,
                    health: state.health,
                    recovering: state.in_progress,
                    attempts: state.attempts,
                    last_attempt: state
                        .last_attempt_at
                        .and_then(|at| at.format(&Rfc3339).ok()),
                    last_error: state.last_error.clone(),
                }
            })
            .collect()
    }
}
