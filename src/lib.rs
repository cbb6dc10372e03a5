//! # barvisor
//!
//! **barvisor** drives a status line for i3bar/swaybar. It runs a fixed set of
//! independent widgets, merges their output into the bar's JSON protocol on
//! stdout, and routes click events from stdin back to the widget that drew the
//! clicked block.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  WidgetSpec  │   │  WidgetSpec  │   │  WidgetSpec  │
//!     │  (clock #1)  │   │  (exec #2)   │   │ (wrapper #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SupervisorBuilder ── WidgetRegistry (type → ctor + defaults)     │
//! │  construction error/panic ─► static error widget in the same slot │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ produce(out) │   │ produce(out) │   │ produce(out) │
//!     │  (1 task)    │   │  (1 task)    │   │  (1 task)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ queue(1)         │ queue(1)         │ queue(1)
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  fan-in (select_all) ─► aggregator                                │
//! │    template overlay ─► name/instance encoding ─► publish          │
//! │    render visible widgets in bar order ─► StatusWriter ─► stdout  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Clicks
//! ```text
//! stdin ─► parse_line ─► routing::decode ─► stale check ─► spawn:
//!                                                  ├─ widget.event(event, last output)
//!                                                  └─ matching EventBinding ─► Executor
//!                                                        (output back onto the widget queue)
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types                                   |
//! |-----------------|----------------------------------------------------------|---------------------------------------------|
//! | **Protocol**    | Blocks, header, click events, outgoing stream.           | [`Block`], [`Header`], [`ClickEvent`]       |
//! | **Executor**    | External process groups with output classification.      | [`Executor`], [`OutputFormat`]              |
//! | **Widgets**     | Capability contract, registry, builtins.                 | [`Widget`], [`WidgetRegistry`]              |
//! | **Supervision** | Aggregation, routing, lifecycle, shutdown.               | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Config**      | YAML file loading with a builtin fallback.               | [`Config`]                                  |
//! | **Errors**      | Typed errors with stable labels.                         | [`WidgetError`], [`RuntimeError`]           |
//!
//! ## Example
//! ```rust
//! use barvisor::{Block, StaticWidget, SupervisorBuilder, SupervisorConfig, WidgetSpec};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = SupervisorBuilder::new(SupervisorConfig::default())
//!         .with_specs([WidgetSpec::new("clock", json!({"format": "%H:%M"}))])
//!         .with_widget(
//!             WidgetSpec::new("hello", json!(null)),
//!             Arc::new(StaticWidget::new(vec![Block::text("hello")])),
//!         )
//!         .build();
//!
//!     let (_bar_in, input) = tokio::io::duplex(1024);
//!     let (output, _bar_out) = tokio::io::duplex(64 * 1024);
//!     let stop = tokio::time::sleep(std::time::Duration::from_millis(50));
//!     sup.run_with(input, output, stop).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod executor;
pub mod policies;
pub mod protocol;
pub mod widgets;

// ---- Public re-exports ----

pub use config::Config;
pub use self::core::{
    install_panic_hook, Supervisor, SupervisorBuilder, SupervisorConfig, WidgetState,
};
pub use error::{ConfigError, ExecError, RouteError, RuntimeError, WidgetError};
pub use executor::{Executor, OutputFormat};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use protocol::{Block, BlockSender, ClickEvent, Header};
pub use widgets::{
    EventBinding, StaticWidget, Widget, WidgetDescriptor, WidgetRef, WidgetRegistry, WidgetSpec,
};
