use std::time::Duration;

/// Timing and routing knobs for the payment confirmation monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Cadence of the monitor loop.
    pub poll_interval: Duration,
    /// Maximum time the gateway window may stay open.
    pub timeout: Duration,
    /// Pause between announcing the redirect and opening the gateway window.
    pub launch_delay: Duration,
    /// Pause between reporting an outcome and navigating away.
    pub redirect_delay: Duration,
    pub order_status_path: String,
    pub sign_in_path: String,
    /// Page the user returns to after signing in.
    pub return_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10 * 60),
            launch_delay: Duration::from_millis(1500),
            redirect_delay: Duration::from_millis(1500),
            order_status_path: "/myorder".to_string(),
            sign_in_path: "/login".to_string(),
            return_path: "/cart".to_string(),
        }
    }
}
