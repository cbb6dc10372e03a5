//! # Widget capability contract.
//!
//! A widget publishes block lists on its queue from [`Widget::produce`], which the
//! supervisor calls exactly once on a dedicated task. The other methods may be
//! called concurrently while `produce` is still running.
//!
//! ```text
//! supervisor ──spawn──► produce(out) ──► out.send(Vec<Block>) ──► aggregator
//!     │
//!     ├─ click  ──► event(&ClickEvent, &last_output)
//!     ├─ SIGUSR1 ─► stop()      SIGCONT ─► resume()
//!     └─ exit   ──► shutdown()
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WidgetError;
use crate::protocol::{Block, BlockSender, ClickEvent};

/// # Data-producing unit on the bar.
///
/// Only [`produce`](Widget::produce) is required; the lifecycle hooks default to no-ops.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use barvisor::{Block, BlockSender, Widget, WidgetError};
///
/// struct Hello;
///
/// #[async_trait]
/// impl Widget for Hello {
///     async fn produce(&self, out: BlockSender) -> Result<(), WidgetError> {
///         out.send(vec![Block::text("hello")])
///             .await
///             .map_err(|_| WidgetError::Failed("bar closed".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait Widget: Send + Sync + 'static {
    /// Publishes output until the widget has nothing more to say.
    ///
    /// Returning `Ok(())` keeps the last published blocks on the bar; an error
    /// replaces them with a red block carrying the error text.
    async fn produce(&self, out: BlockSender) -> Result<(), WidgetError>;

    /// Handles a click on one of this widget's blocks.
    ///
    /// `event` carries the block's own name/instance; `blocks` is a snapshot of
    /// the widget's last published output.
    async fn event(&self, _event: &ClickEvent, _blocks: &[Block]) -> Result<(), WidgetError> {
        Ok(())
    }

    /// The bar was hidden.
    async fn stop(&self) -> Result<(), WidgetError> {
        Ok(())
    }

    /// The bar is visible again.
    async fn resume(&self) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Releases resources; called once when the process exits.
    async fn shutdown(&self) -> Result<(), WidgetError> {
        Ok(())
    }
}

/// Shared handle to a widget.
pub type WidgetRef = Arc<dyn Widget>;
