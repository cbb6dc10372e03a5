//! # Widget lifecycle state.
//!
//! ```text
//! Created ──► Running ⇄ Stopped
//!    │           │         │
//!    └───────────┴─────────┴──► Terminated (absorbing)
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetState {
    /// Constructed, `produce` not yet called.
    Created,
    Running,
    /// Paused by the bar.
    Stopped,
    /// `produce` returned, failed, panicked, or the widget was shut down.
    Terminated,
}

impl WidgetState {
    /// Applies a transition, returning the resulting state.
    ///
    /// Transitions the diagram does not allow leave the state unchanged.
    pub fn transition(self, to: WidgetState) -> WidgetState {
        use WidgetState::*;
        match (self, to) {
            (Terminated, _) => Terminated,
            (_, Terminated) => Terminated,
            (Created, Running) | (Stopped, Running) => Running,
            (Running, Stopped) => Stopped,
            (s, _) => s,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetState::Created => "created",
            WidgetState::Running => "running",
            WidgetState::Stopped => "stopped",
            WidgetState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
