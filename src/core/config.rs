//! # Supervisor settings.

use std::time::Duration;

/// Runtime settings for [`Supervisor`](super::Supervisor).
///
/// `stop_signal`/`cont_signal` are announced in the protocol header; the bar
/// sends them when it is hidden and shown again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub stop_signal: i32,
    pub cont_signal: i32,
    /// Upper bound for each widget's `shutdown`.
    pub shutdown_timeout: Duration,
}

impl Default for SupervisorConfig {
    /// SIGUSR1 / SIGCONT, 3s shutdown timeout.
    fn default() -> Self {
        Self {
            stop_signal: libc::SIGUSR1,
            cont_signal: libc::SIGCONT,
            shutdown_timeout: Duration::from_secs(3),
        }
    }
}
