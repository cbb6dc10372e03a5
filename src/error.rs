//! Error types used by the barvisor runtime, executor, and widgets.
//!
//! - [`ExecError`]: failures while spawning or reading an external process.
//! - [`WidgetError`]: failures raised by widgets (construction or runtime).
//! - [`RouteError`]: inbound click events that cannot be routed to a block.
//! - [`ConfigError`]: configuration loading and widget registration.
//! - [`RuntimeError`]: failures of the supervisor itself.
//!
//! Every enum exposes `as_label()`, a short stable snake_case label for logs.

use std::num::ParseIntError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the process executor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started.
    #[error("failed to start process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Reading or writing one of the process pipes failed.
    #[error("process io: {0}")]
    Io(#[from] std::io::Error),

    /// Structured stdout could not be decoded.
    #[error("invalid output: {0}")]
    Decode(#[from] serde_json::Error),

    /// Structured stdout started with a value that is neither a header nor a block list.
    #[error("unexpected output value: {0}")]
    UnexpectedValue(String),

    /// `wait`/`run` was called before the process was started.
    #[error("process not started")]
    NotStarted,

    /// Stdout was already consumed by an earlier `run`.
    #[error("process output already consumed")]
    AlreadyRunning,

    /// The receiving side of the output queue was dropped.
    #[error("output queue closed")]
    OutputClosed,

    /// The wait syscall itself failed; the failure is cached like a success.
    #[error("wait failed: {0}")]
    Wait(#[source] Arc<std::io::Error>),
}

impl ExecError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecError::Spawn(_) => "exec_spawn",
            ExecError::Io(_) => "exec_io",
            ExecError::Decode(_) => "exec_decode",
            ExecError::UnexpectedValue(_) => "exec_unexpected_value",
            ExecError::NotStarted => "exec_not_started",
            ExecError::AlreadyRunning => "exec_already_running",
            ExecError::OutputClosed => "exec_output_closed",
            ExecError::Wait(_) => "exec_wait",
        }
    }
}

/// # Errors produced by widgets.
///
/// Construction errors (`Config`, `UnknownKind`) replace the widget with a static
/// error block. Runtime errors returned from `produce` become a red block.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WidgetError {
    /// Invalid widget parameters.
    #[error("{0}")]
    Config(String),

    /// No constructor registered under this widget type name.
    #[error("widget '{0}' not found")]
    UnknownKind(String),

    /// Parameters could not be decoded into the widget's parameter type.
    #[error("invalid parameters: {0}")]
    Params(#[from] serde_json::Error),

    /// An external process failed.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Generic runtime failure with a message.
    #[error("{0}")]
    Failed(String),
}

impl WidgetError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WidgetError::Config(_) => "widget_config",
            WidgetError::UnknownKind(_) => "widget_unknown_kind",
            WidgetError::Params(_) => "widget_params",
            WidgetError::Exec(e) => e.as_label(),
            WidgetError::Failed(_) => "widget_failed",
        }
    }
}

/// # Errors decoding the synthetic name/instance of a click event.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// The value does not have the `app-<w>-...` shape.
    #[error("malformed identity '{0}'")]
    Malformed(String),

    /// An index segment is not an unsigned integer.
    #[error("invalid index in '{value}': {source}")]
    BadIndex {
        /// The full value that failed to decode.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },

    /// The widget index in `name` differs from the one in `instance`.
    #[error("widget index mismatch: name={name} instance={instance}")]
    Mismatch {
        /// Index decoded from the name.
        name: usize,
        /// Index decoded from the instance.
        instance: usize,
    },

    /// The widget index is out of range.
    #[error("unknown widget #{index} (have {count})")]
    UnknownWidget {
        /// Decoded widget index.
        index: usize,
        /// Number of configured widgets.
        count: usize,
    },
}

impl RouteError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RouteError::Malformed(_) => "route_malformed",
            RouteError::BadIndex { .. } => "route_bad_index",
            RouteError::Mismatch { .. } => "route_mismatch",
            RouteError::UnknownWidget { .. } => "route_unknown_widget",
        }
    }
}

/// # Errors loading configuration or registering widget types.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected shape.
    #[error("{source_name}: {error}")]
    Yaml {
        /// File name or `builtin`.
        source_name: String,
        /// Underlying parse error.
        #[source]
        error: serde_yaml::Error,
    },

    /// A widget type was registered twice.
    #[error("widget '{0}' already registered")]
    Duplicate(String),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Yaml { .. } => "config_yaml",
            ConfigError::Duplicate(_) => "config_duplicate",
        }
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Some widgets did not finish `shutdown` within the timeout.
    #[error("shutdown timeout {timeout:?} exceeded; stuck: {stuck:?}")]
    ShutdownTimedOut {
        /// The configured per-widget timeout.
        timeout: Duration,
        /// Labels of widgets that did not finish in time.
        stuck: Vec<String>,
    },

    /// `run` was called on a supervisor that already ran.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// Writing the protocol stream or reading events failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use barvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimedOut { timeout: Duration::from_secs(3), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timed_out");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ShutdownTimedOut { .. } => "runtime_shutdown_timed_out",
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Io(_) => "runtime_io",
        }
    }
}
