//! Connection lifecycle management.
//!
//! - [`pump`] keeps a shared client handle driven until it is no longer
//!   needed, then disconnects it
//! - [`registry`] retains pump tasks so they can be joined at shutdown

pub mod pump;
pub mod registry;

pub use pump::{
    run_pump, start_background_pump, PumpConfig, PumpExit, PumpStop, DEFAULT_IDLE_INTERVAL,
};
pub use registry::{SessionId, SessionRegistry, ShutdownReport};
