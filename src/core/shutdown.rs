//! # Process signal handling.
//!
//! - [`wait_for_shutdown_signal`] completes on `SIGINT`, `SIGTERM` or `SIGQUIT`;
//! - [`ControlSignals`] turns the bar's stop/continue signals into [`Control`] values.

use tokio::signal::unix::{signal, Signal, SignalKind};

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
/// Returns `Err` if signal registration fails.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Request from the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Stop,
    Resume,
}

/// Listener for the stop/continue signal pair announced in the header.
pub struct ControlSignals {
    stop: Signal,
    cont: Signal,
}

impl ControlSignals {
    pub fn new(stop_signal: i32, cont_signal: i32) -> std::io::Result<Self> {
        Ok(Self {
            stop: signal(SignalKind::from_raw(stop_signal))?,
            cont: signal(SignalKind::from_raw(cont_signal))?,
        })
    }

    /// Next request; `None` once the signal streams are closed.
    pub async fn recv(&mut self) -> Option<Control> {
        tokio::select! {
            s = self.stop.recv() => s.map(|_| Control::Stop),
            c = self.cont.recv() => c.map(|_| Control::Resume),
        }
    }
}
