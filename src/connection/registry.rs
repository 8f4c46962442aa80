//! Process-wide registry of running pumps.
//!
//! Pumps are never truly detached: the registry keeps each task handle and
//! stop signal so shutdown code can signal and join any stragglers.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::pump::{start_background_pump, PumpConfig, PumpExit, PumpStop};
use crate::traits::RpcnClient;

/// Identifier of one registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

struct SessionEntry {
    stop: PumpStop,
    task: JoinHandle<PumpExit>,
}

/// Outcome of [`SessionRegistry::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Pumps that finished within the timeout.
    pub joined: usize,
    /// Pumps that had to be aborted.
    pub timed_out: usize,
}

/// Registry of pump tasks.
pub struct SessionRegistry {
    config: PumpConfig,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(PumpConfig::default())
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .field("sessions", &self.lock().len())
            .finish()
    }
}

impl SessionRegistry {
    /// Create a registry whose pumps use `config`.
    pub fn new(config: PumpConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create a shared registry.
    pub fn shared(config: PumpConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Start a pump for `handle` with the registry's configuration.
    pub fn spawn_pump<C>(&self, handle: Arc<C>) -> SessionId
    where
        C: RpcnClient + ?Sized + 'static,
    {
        self.spawn_pump_with(handle, self.config.clone())
    }

    /// Start a pump for `handle` with an explicit configuration.
    pub fn spawn_pump_with<C>(&self, handle: Arc<C>, config: PumpConfig) -> SessionId
    where
        C: RpcnClient + ?Sized + 'static,
    {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stop = PumpStop::new();
        let task = start_background_pump(handle, config, stop.clone());

        debug!(%id, "Registered connection pump");
        self.lock().insert(id, SessionEntry { stop, task });
        id
    }

    /// Raise the stop signal of one session.
    ///
    /// The entry stays registered until joined, reaped or shut down.
    /// Returns `false` for an unknown id.
    pub fn release(&self, id: SessionId) -> bool {
        match self.lock().get(&id) {
            Some(entry) => {
                entry.stop.trigger();
                true
            }
            None => false,
        }
    }

    /// Wait for one session's pump to finish and remove it.
    ///
    /// Returns `None` for an unknown id or a pump that panicked.
    pub async fn join(&self, id: SessionId) -> Option<PumpExit> {
        let entry = self.lock().remove(&id)?;
        match entry.task.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                warn!(%id, "Connection pump failed: {}", e);
                None
            }
        }
    }

    /// Number of registered sessions whose pump is still running.
    pub fn active_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| !entry.task.is_finished())
            .count()
    }

    /// Number of registered sessions, finished or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop finished sessions. Returns how many were removed.
    pub fn reap(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.task.is_finished());
        before - sessions.len()
    }

    /// Stop and join every pump, each bounded by `timeout`.
    ///
    /// Pumps that do not finish in time are aborted.
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        let entries: Vec<(SessionId, SessionEntry)> = self.lock().drain().collect();
        for (_, entry) in &entries {
            entry.stop.trigger();
        }

        let mut report = ShutdownReport::default();
        for (id, mut entry) in entries {
            match tokio::time::timeout(timeout, &mut entry.task).await {
                Ok(_) => report.joined += 1,
                Err(_) => {
                    warn!(%id, "Connection pump did not stop in time, aborting");
                    entry.task.abort();
                    report.timed_out += 1;
                }
            }
        }

        debug!(?report, "Session registry shut down");
        report
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }
}
