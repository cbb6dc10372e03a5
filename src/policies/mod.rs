//! Retry timing for widgets that re-run failed commands.
//!
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization applied to each delay
//!
//! ```text
//! exec { retry: 5 } ──► BackoffPolicy { first: 5s, factor: 2.0, max: 5min, jitter: Equal }
//!                          └─► next(attempt) after every failed one-shot run
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
