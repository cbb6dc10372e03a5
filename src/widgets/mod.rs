//! Widget contract, configuration types, registry, and builtin widgets.
//!
//! - [`Widget`]: what the supervisor drives;
//! - [`WidgetSpec`] / [`EventBinding`]: per-widget static configuration;
//! - [`WidgetRegistry`]: type name → constructor;
//! - builtins: `static`, `exec`, `wrapper`, `clock`.

mod clock;
mod exec;
mod registry;
mod spec;
mod static_widget;
mod widget;
mod wrapper;

pub use clock::ClockWidget;
pub use exec::ExecWidget;
pub use registry::{WidgetDescriptor, WidgetRegistry};
pub use spec::{EventBinding, WidgetSpec};
pub use static_widget::StaticWidget;
pub use widget::{Widget, WidgetRef};
pub use wrapper::WrapperWidget;
