//! Per-session pending text.
//!
//! Each session id owns a small FIFO of text waiting to be synthesized. In
//! the request path text is enqueued and the oldest entry immediately taken,
//! so the queue rarely holds more than one item; the indirection leaves room
//! for batching rapid-fire fragments later.
//!
//! Entries live in a [`DashMap`], so operations on different sessions only
//! contend when they hash to the same shard.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
struct SessionEntry {
    pending: VecDeque<String>,
    last_touched: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            last_touched: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }
}

#[derive(Debug, Default)]
pub struct SessionQueue {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to the session, creating the session on first use.
    pub fn enqueue(&self, session_id: &str, text: impl Into<String>) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionEntry::new);
        entry.pending.push_back(text.into());
        entry.touch();
    }

    /// Pop the oldest pending text. Unknown or empty sessions yield `None`.
    pub fn dequeue_one(&self, session_id: &str) -> Option<String> {
        let mut entry = self.sessions.get_mut(session_id)?;
        entry.touch();
        entry.pending.pop_front()
    }

    /// Enqueue then dequeue under one shard lock, so a concurrent request on
    /// the same session cannot interleave between the two steps.
    pub fn enqueue_and_take(&self, session_id: &str, text: impl Into<String>) -> Option<String> {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionEntry::new);
        entry.pending.push_back(text.into());
        entry.touch();
        entry.pending.pop_front()
    }

    /// Drop the session and anything still queued. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn pending(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|entry| entry.pending.len())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions not touched within `ttl`. Returns how many were dropped.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_touched.elapsed() < ttl);
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically evict idle sessions until `cancel` fires.
    pub fn spawn_idle_sweeper(
        self: Arc<Self>,
        ttl: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let period = (ttl / 4).max(Duration::from_secs(1));
        info!(ttl_secs = ttl.as_secs(), "Session idle sweeper started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = self.evict_idle(ttl);
                        if evicted > 0 {
                            debug!(evicted, remaining = self.len(), "Evicted idle sessions");
                        }
                    }
                }
            }
            debug!("Session idle sweeper stopped");
        })
    }
}
