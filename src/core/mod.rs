//! Runtime core: widget supervision, aggregation, and event routing.
//!
//! Internal modules:
//! - [`routing`]: name/instance identity encoding;
//! - [`conditions`]: visibility and modifier predicates;
//! - `instance`: one widget slot (queue, published output, state, span);
//! - `fanin`: merges every widget queue into one stream;
//! - `dispatch`: routes clicks and runs bound commands;
//! - `guard`: panic isolation;
//! - [`shutdown`]: process signal handling.

mod builder;
mod config;
mod dispatch;
mod fanin;
mod guard;
mod instance;
mod state;
mod supervisor;

pub mod conditions;
pub mod routing;
pub mod shutdown;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use guard::install_panic_hook;
pub use state::WidgetState;
pub use supervisor::Supervisor;
