//! Background connection pump.
//!
//! The pump keeps a client's connection driven by calling
//! [`RpcnClient::manage_connection`] in a loop while anyone besides the pump
//! still holds the handle. It stops when it sees itself as the sole owner
//! or when its [`PumpStop`] is raised, then disconnects exactly once.
//!
//! Ownership is read from `Arc::strong_count`. If a second holder is created
//! and dropped between two checks the pump cannot tell, so callers must not
//! re-share the handle transiently. Raising the stop signal after releasing
//! the handle makes shutdown deterministic regardless.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::traits::RpcnClient;

/// Default delay between two pump iterations.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(5);

/// Explicit stop signal for a pump.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct PumpStop {
    flag: Arc<AtomicBool>,
}

impl PumpStop {
    /// Create a lowered stop signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the pump to stop at its next check.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has been raised.
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Pump tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpConfig {
    /// Delay between iterations. Zero yields to the scheduler instead of
    /// sleeping.
    pub idle_interval: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            idle_interval: DEFAULT_IDLE_INTERVAL,
        }
    }
}

impl PumpConfig {
    /// Set the delay between iterations.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }
}

/// Why a pump finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The pump held the last reference to the handle.
    SoleOwner,
    /// The stop signal was raised.
    Stopped,
}

/// Spawn a pump for `handle` on the current tokio runtime.
///
/// The returned task resolves after the final `disconnect`.
pub fn start_background_pump<C>(
    handle: Arc<C>,
    config: PumpConfig,
    stop: PumpStop,
) -> JoinHandle<PumpExit>
where
    C: RpcnClient + ?Sized + 'static,
{
    tokio::spawn(run_pump(handle, config, stop))
}

/// Pump loop body. See the module docs.
pub async fn run_pump<C>(handle: Arc<C>, config: PumpConfig, stop: PumpStop) -> PumpExit
where
    C: RpcnClient + ?Sized,
{
    debug!("Connection pump started");
    let mut iterations: u64 = 0;

    let exit = loop {
        if stop.is_triggered() {
            break PumpExit::Stopped;
        }
        if Arc::strong_count(&handle) <= 1 {
            break PumpExit::SoleOwner;
        }

        handle.manage_connection().await;
        iterations += 1;

        if config.idle_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(config.idle_interval).await;
        }
    };

    trace!(iterations, "Connection pump leaving loop");
    handle.disconnect().await;
    debug!(?exit, state = %handle.state(), "Connection pump finished");
    exit
}
