//! # YAML configuration.
//!
//! ```yaml
//! signals:
//!   stop: 10            # announced in the header, default SIGUSR1
//!   cont: 18            # default SIGCONT
//! shutdown_timeout: 3   # seconds per widget
//! widgets:
//!   - widget: clock           # registered widget type
//!     workspaces: ["1", "!2"] # visibility labels
//!     templates: '[{"color": "#ffffff"}]'
//!     events:
//!       - button: 1
//!         command: notify-send "$I3_BUTTON"
//!     format: "%H:%M"         # everything else is a widget parameter
//! ```
//!
//! `workspaces` is matched against the label set given to
//! [`Supervisor::set_labels`](crate::Supervisor::set_labels). The binary has no
//! label source, so there only negated labels (`!name`) have an effect.
//!
//! A widget entry that cannot be understood (bad template, bad events, missing
//! `widget`) becomes a static error widget in its slot; only a file that is not
//! valid YAML at all fails the whole load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::core::SupervisorConfig;
use crate::error::ConfigError;
use crate::protocol::Block;
use crate::widgets::{EventBinding, WidgetSpec};

/// Config used when no file is found.
pub const BUILTIN: &str = r##"
widgets:
  - widget: static
    blocks: '[{"full_text": "barvisor", "color": "#2e9ef4"}]'
    events:
      - button: 1
        command: xdg-open https://github.com/search?q=barvisor
  - widget: wrapper
    command: /usr/bin/i3status
  - widget: clock
    format: "%b %e %a %H:%M:%S"
    templates: '[{"color": "#ffffff", "separator": true, "separator_block_width": 21}]'
"##;

/// File name looked up in the config directories.
pub const FILE_NAME: &str = "barvisor.yml";

const MODIFIERS: [&str; 7] = ["Shift", "Control", "Mod1", "Mod2", "Mod3", "Mod4", "Mod5"];

#[derive(Debug, Default, Deserialize)]
struct RawSignals {
    stop: Option<i32>,
    cont: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    signals: RawSignals,
    #[serde(default)]
    shutdown_timeout: Option<u64>,
    #[serde(default)]
    widgets: Vec<RawWidget>,
}

#[derive(Debug, Deserialize)]
struct RawWidget {
    widget: Option<String>,
    #[serde(default)]
    workspaces: Vec<String>,
    #[serde(default, alias = "template")]
    templates: Option<serde_yaml::Value>,
    #[serde(default)]
    events: Option<serde_yaml::Value>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Templates {
    One(Block),
    Many(Vec<Block>),
}

/// Loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub supervisor: SupervisorConfig,
    pub widgets: Vec<WidgetSpec>,
}

impl Config {
    /// Reads `path`; relative widget workdirs resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let workdir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse_in(&text, &path.display().to_string(), workdir)
    }

    /// Parses config text; `source` names it in logs and errors.
    pub fn parse(text: &str, source: &str) -> Result<Self, ConfigError> {
        Self::parse_in(text, source, PathBuf::new())
    }

    /// The builtin fallback.
    pub fn builtin() -> Self {
        match Self::parse(BUILTIN, "builtin") {
            Ok(cfg) => cfg,
            Err(e) => Self::failed(&e),
        }
    }

    /// Configuration showing a single error block, used when loading fails.
    pub fn failed(err: &ConfigError) -> Self {
        Self {
            supervisor: SupervisorConfig::default(),
            widgets: vec![error_spec(err.to_string(), "config", 0)],
        }
    }

    /// First config found: `explicit`, then `$XDG_CONFIG_HOME/barvisor/barvisor.yml`
    /// (or `~/.config/...`), then `./barvisor.yml`, then the builtin.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for path in candidates() {
            if path.is_file() {
                debug!(path = %path.display(), "using config file");
                return Self::load(&path);
            }
        }
        debug!("no config file found, using builtin");
        Ok(Self::builtin())
    }

    /// Whether any widget declares visibility labels.
    pub fn has_labels(&self) -> bool {
        self.widgets.iter().any(|w| !w.labels.is_empty())
    }

    fn parse_in(text: &str, source: &str, workdir: PathBuf) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(text).map_err(|error| ConfigError::Yaml {
            source_name: source.to_string(),
            error,
        })?;

        let defaults = SupervisorConfig::default();
        let supervisor = SupervisorConfig {
            stop_signal: raw.signals.stop.unwrap_or(defaults.stop_signal),
            cont_signal: raw.signals.cont.unwrap_or(defaults.cont_signal),
            shutdown_timeout: raw
                .shutdown_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        };

        let widgets = raw
            .widgets
            .into_iter()
            .enumerate()
            .map(|(index, w)| {
                let mut spec = widget_spec(w).unwrap_or_else(|msg| {
                    warn!(source, index = index + 1, error = %msg, "invalid widget config");
                    error_spec(msg, source, index)
                });
                spec.workdir = workdir.clone();
                spec.file = source.to_string();
                spec.index = index;
                spec
            })
            .collect();

        Ok(Self {
            supervisor,
            widgets,
        })
    }
}

fn candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")));
    if let Some(dir) = config_home {
        paths.push(dir.join("barvisor").join(FILE_NAME));
    }
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

fn error_spec(message: String, source: &str, index: usize) -> WidgetSpec {
    let mut spec = WidgetSpec::new("static", json!({ "blocks": [Block::error(message)] }));
    spec.file = source.to_string();
    spec.index = index;
    spec
}

fn widget_spec(raw: RawWidget) -> Result<WidgetSpec, String> {
    let kind = raw
        .widget
        .filter(|k| !k.is_empty())
        .ok_or_else(|| "missing widget name".to_string())?;

    let templates = match raw.templates {
        None => Vec::new(),
        Some(serde_yaml::Value::String(text)) => {
            parse_templates(serde_json::from_str(&text).map_err(|e| format!("template: {e}")))?
        }
        Some(value) => {
            parse_templates(serde_yaml::from_value(value).map_err(|e| format!("template: {e}")))?
        }
    };

    let events: Vec<EventBinding> = match raw.events {
        None | Some(serde_yaml::Value::Null) => Vec::new(),
        Some(value) => serde_yaml::from_value(value).map_err(|e| format!("events: {e}"))?,
    };
    for (i, ev) in events.iter().enumerate() {
        for m in &ev.modifiers {
            let name = m.trim_start_matches('!');
            if !MODIFIERS.contains(&name) {
                return Err(format!("events#{}: unknown '{}' modifier", i + 1, name));
            }
        }
    }

    Ok(WidgetSpec {
        kind,
        params: Value::Object(raw.params),
        events,
        labels: raw.workspaces,
        templates,
        ..WidgetSpec::default()
    })
}

fn parse_templates(parsed: Result<Templates, String>) -> Result<Vec<Block>, String> {
    Ok(match parsed? {
        Templates::One(block) => vec![block],
        Templates::Many(blocks) => blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OutputFormat;

    #[test]
    fn defaults_apply() {
        let cfg = Config::parse("widgets: []", "test").unwrap();
        assert_eq!(cfg.supervisor, SupervisorConfig::default());
        assert!(cfg.widgets.is_empty());
        assert!(!cfg.has_labels());
    }

    #[test]
    fn widget_fields_and_params() {
        let cfg = Config::parse(
            r##"
signals: {stop: 12, cont: 18}
shutdown_timeout: 5
widgets:
  - widget: exec
    command: date
    interval: 10
    workspaces: ["1", "!2"]
    template: '{"color": "#fff"}'
    events:
      - button: 3
        command: echo hi
        modifiers: ["!Shift"]
"##,
            "bar.yml",
        )
        .unwrap();
        assert_eq!(cfg.supervisor.stop_signal, 12);
        assert_eq!(cfg.supervisor.shutdown_timeout, Duration::from_secs(5));

        let w = &cfg.widgets[0];
        assert_eq!(w.kind, "exec");
        assert_eq!(w.params, json!({"command": "date", "interval": 10}));
        assert_eq!(w.labels, vec!["1", "!2"]);
        assert_eq!(w.templates[0].color.as_deref(), Some("#fff"));
        assert_eq!(w.events[0].button, 3);
        assert_eq!(w.events[0].output_format, OutputFormat::None);
        assert_eq!(w.label(), "[bar.yml#1]");
        assert!(cfg.has_labels());
    }

    #[test]
    fn broken_widget_becomes_error_widget() {
        let cfg = Config::parse(
            r#"
widgets:
  - widget: clock
  - command: orphan
  - widget: exec
    command: x
    events:
      - command: y
        modifiers: [Hyper]
"#,
            "t",
        )
        .unwrap();
        assert_eq!(cfg.widgets.len(), 3);
        assert_eq!(cfg.widgets[0].kind, "clock");
        assert_eq!(cfg.widgets[1].kind, "static");
        assert_eq!(cfg.widgets[1].index, 1);
        let text = cfg.widgets[2].params["blocks"][0]["full_text"].as_str().unwrap();
        assert_eq!(text, "events#1: unknown 'Hyper' modifier");
    }

    #[test]
    fn invalid_yaml_fails() {
        let err = Config::parse("widgets: [", "t").unwrap_err();
        assert_eq!(err.as_label(), "config_yaml");
        assert_eq!(Config::failed(&err).widgets.len(), 1);
    }

    #[test]
    fn builtin_parses() {
        let cfg = Config::builtin();
        let kinds: Vec<_> = cfg.widgets.iter().map(|w| w.kind.as_str()).collect();
        assert_eq!(kinds, vec!["static", "wrapper", "clock"]);
    }

    #[test]
    fn load_resolves_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "widgets:\n  - widget: clock\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.widgets[0].workdir, dir.path());
        assert!(matches!(
            Config::load(dir.path().join("missing.yml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
