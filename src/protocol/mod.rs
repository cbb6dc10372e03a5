//! Wire protocol types shared by widgets, the executor, and the supervisor.
//!
//! - [`Block`]: one visible segment;
//! - [`Header`]: stream preamble;
//! - [`ClickEvent`]: inbound user interaction;
//! - [`StatusWriter`]: the never-closed outgoing JSON array.

mod block;
mod click;
mod header;
mod stream;

pub use block::{Block, MinWidth, CUSTOM_PREFIX, ERROR_COLOR};
pub use click::{parse_line, ClickEvent};
pub use header::{Header, PROTOCOL_VERSION};
pub use stream::StatusWriter;

/// Single-slot queue a widget publishes its block lists on.
pub type BlockSender = tokio::sync::mpsc::Sender<Vec<Block>>;
/// Receiving side of a widget's output queue.
pub type BlockReceiver = tokio::sync::mpsc::Receiver<Vec<Block>>;
