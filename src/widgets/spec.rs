use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::executor::OutputFormat;
use crate::protocol::Block;

/// Static description of one configured widget.
///
/// `index` is the widget's position on the bar (0-based) and never changes.
#[derive(Debug, Clone, Default)]
pub struct WidgetSpec {
    /// Registered widget type name.
    pub kind: String,
    /// Type-specific parameters, merged over the type's defaults.
    pub params: Value,
    pub events: Vec<EventBinding>,
    /// Visibility labels (`name` or `!name`).
    pub labels: Vec<String>,
    /// Block defaults: one template applies to every block, several apply by position.
    pub templates: Vec<Block>,
    /// Working directory for commands; the config file's directory when loaded from disk.
    pub workdir: PathBuf,
    /// Config source the widget came from.
    pub file: String,
    pub index: usize,
}

impl WidgetSpec {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
            ..Self::default()
        }
    }

    /// Log label, `[file#n]` with a 1-based position.
    pub fn label(&self) -> String {
        format!("[{}#{}]", self.file, self.index + 1)
    }
}

/// Command bound to clicks on a widget.
///
/// `button == 0` matches any button; empty `name`/`instance` match any block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventBinding {
    pub command: String,
    pub button: u32,
    /// Required (`Shift`) or forbidden (`!Shift`) modifiers.
    pub modifiers: Vec<String>,
    pub name: String,
    pub instance: String,
    #[serde(default = "binding_format")]
    pub output_format: OutputFormat,
    pub workdir: String,
    /// Extra `KEY=VALUE` environment entries.
    pub env: Vec<String>,
}

fn binding_format() -> OutputFormat {
    OutputFormat::None
}

impl EventBinding {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output_format: OutputFormat::None,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_defaults_to_discarding_output() {
        let b: EventBinding = serde_json::from_str(r#"{"command":"true"}"#).unwrap();
        assert_eq!(b.output_format, OutputFormat::None);
        assert_eq!(b.button, 0);
        assert!(serde_json::from_str::<EventBinding>(r#"{"command":"x","bogus":1}"#).is_err());
    }

    #[test]
    fn label_is_one_based() {
        let mut spec = WidgetSpec::new("static", Value::Null);
        spec.file = "bar.yml".into();
        spec.index = 2;
        assert_eq!(spec.label(), "[bar.yml#3]");
    }
}
