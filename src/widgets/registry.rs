//! # Widget registry: type name → constructor + default parameters.
//!
//! ```text
//! WidgetSpec { kind: "clock", params: {format: "%H:%M"} }
//!      └─► registry.build(spec)
//!            ├─ lookup "clock"              (unknown → WidgetError::UnknownKind)
//!            ├─ merge defaults ◄── params   (params win, key by key)
//!            ├─ decode into ClockParams      (bad/unknown keys → WidgetError::Params)
//!            └─ ctor(params, spec) ──► WidgetRef
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{clock, exec, static_widget, wrapper, WidgetRef, WidgetSpec};
use crate::error::{ConfigError, WidgetError};

type Ctor = Arc<dyn Fn(Value, &WidgetSpec) -> Result<WidgetRef, WidgetError> + Send + Sync>;

/// One registered widget type.
#[derive(Clone)]
pub struct WidgetDescriptor {
    name: String,
    defaults: Value,
    ctor: Ctor,
}

impl WidgetDescriptor {
    /// Describes a widget type whose parameters decode into `P`.
    pub fn new<P, F>(name: impl Into<String>, defaults: Value, ctor: F) -> Self
    where
        P: DeserializeOwned,
        F: Fn(P, &WidgetSpec) -> Result<WidgetRef, WidgetError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            defaults,
            ctor: Arc::new(move |raw, spec| {
                let params: P = serde_json::from_value(raw)?;
                ctor(params, spec)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, spec: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
        (self.ctor)(merge_params(&self.defaults, &spec.params), spec)
    }
}

fn merge_params(defaults: &Value, params: &Value) -> Value {
    match (defaults, params) {
        (Value::Object(base), Value::Object(over)) => {
            let mut merged = base.clone();
            for (k, v) in over {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (d, Value::Null) => d.clone(),
        (_, p) => p.clone(),
    }
}

/// Set of widget types available to a configuration.
#[derive(Clone, Default)]
pub struct WidgetRegistry {
    types: HashMap<String, WidgetDescriptor>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `static`, `exec`, `wrapper` and `clock`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for desc in [
            static_widget::descriptor(),
            exec::descriptor(),
            wrapper::descriptor(),
            clock::descriptor(),
        ] {
            registry.types.insert(desc.name().to_string(), desc);
        }
        registry
    }

    /// Adds a widget type; names are unique.
    pub fn register(&mut self, desc: WidgetDescriptor) -> Result<(), ConfigError> {
        if self.contains(desc.name()) {
            return Err(ConfigError::Duplicate(desc.name));
        }
        self.types.insert(desc.name().to_string(), desc);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Constructs the widget described by `spec`.
    pub fn build(&self, spec: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
        self.types
            .get(&spec.kind)
            .ok_or_else(|| WidgetError::UnknownKind(spec.kind.clone()))?
            .build(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::StaticWidget;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Greeting {
        text: String,
        loud: bool,
    }

    fn greeting() -> WidgetDescriptor {
        WidgetDescriptor::new(
            "greeting",
            json!({"text": "hi", "loud": false}),
            |p: Greeting, _| {
                let text = if p.loud { p.text.to_uppercase() } else { p.text };
                Ok(Arc::new(StaticWidget::new(vec![crate::protocol::Block::text(text)])) as WidgetRef)
            },
        )
    }

    #[test]
    fn params_override_defaults() {
        assert_eq!(
            merge_params(&json!({"a": 1, "b": 2}), &json!({"b": 3})),
            json!({"a": 1, "b": 3})
        );
        assert_eq!(merge_params(&json!({"a": 1}), &Value::Null), json!({"a": 1}));
    }

    #[test]
    fn builds_registered_types() {
        let mut reg = WidgetRegistry::new();
        reg.register(greeting()).unwrap();
        assert!(reg.build(&WidgetSpec::new("greeting", json!({"loud": true}))).is_ok());
        assert!(matches!(
            reg.build(&WidgetSpec::new("greeting", json!({"volume": 11}))),
            Err(WidgetError::Params(_))
        ));
    }

    #[test]
    fn unknown_and_duplicate() {
        let mut reg = WidgetRegistry::with_builtins();
        assert!(reg.contains("clock"));
        let err = reg.build(&WidgetSpec::new("nope", Value::Null)).err().unwrap();
        assert_eq!(err.to_string(), "widget 'nope' not found");
        assert!(matches!(
            reg.register(static_widget::descriptor()),
            Err(ConfigError::Duplicate(name)) if name == "static"
        ));
    }
}
