//! Application layer: the payment confirmation monitor.
//!
//! `PaymentConfirmationMonitor` runs the begin-payment steps inline and then
//! hands the session to a spawned `tokio` task that owns the polling timer and
//! the gateway window until a terminal outcome is reached.

pub mod handle;
pub mod monitor;

pub use handle::{SessionHandle, UnloadHook};
pub use monitor::PaymentConfirmationMonitor;
